//! Data Object List parsing and the DOL builder (spec §4.1).
//!
//! Grounded on the teacher's `tlv/dol.rs`, generalised to operate on the raw
//! [`TagStore`] rather than a typed `Value`, and to implement the
//! left-truncate/right-pad contract exactly as spec.md states it instead of
//! zero-filling unknown-type values.

use super::errors::DecodeError;
use super::node::read_tag;
use super::store::TagStore;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DolEntry {
    pub tag: u32,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dol {
    entries: Vec<DolEntry>,
}

impl Dol {
    pub fn entries(&self) -> &[DolEntry] {
        &self.entries
    }

    pub fn declared_length(&self) -> usize {
        self.entries.iter().map(|e| e.length).sum()
    }

    pub fn parse(mut raw: &[u8]) -> Result<Dol, DecodeError> {
        let mut entries = Vec::new();
        while !raw.is_empty() {
            let (tag, tag_len) = read_tag(raw)?;
            let &length_byte = raw
                .get(tag_len)
                .ok_or(DecodeError::Truncated(tag_len))?;
            entries.push(DolEntry {
                tag,
                length: length_byte as usize,
            });
            raw = &raw[tag_len + 1..];
        }
        Ok(Dol { entries })
    }

    /// Builds the DOL response data: for each entry in order, emits exactly
    /// `length` bytes, left-truncating or right-padding with `0x00` to fit
    /// if the store has the tag, else `length` zero bytes. Output length
    /// always equals `declared_length()`.
    pub fn build(&self, store: &TagStore) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.declared_length());
        for entry in &self.entries {
            let mut field = vec![0u8; entry.length];
            if let Some(value) = store.get(entry.tag) {
                if value.len() >= entry.length {
                    field.copy_from_slice(&value[value.len() - entry.length..]);
                } else {
                    field[..value.len()].copy_from_slice(value);
                }
            }
            out.extend(field);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_and_builds_zero_filled_for_unknown_tags() {
        let dol = Dol::parse(&[0x9f, 0x02, 0x06, 0x9f, 0x37, 0x04]).unwrap();
        assert_eq!(dol.declared_length(), 10);
        let store = TagStore::new();
        let built = dol.build(&store);
        assert_eq!(built.len(), 10);
        assert!(built.iter().all(|&b| b == 0));
    }

    #[test]
    fn truncates_from_left_and_pads_on_right() {
        let dol = Dol::parse(&[0x9f, 0x02, 0x02]).unwrap();
        let mut store = TagStore::new();
        store.insert(0x9f02, vec![0x00, 0x00, 0x10, 0x00]);
        assert_eq!(dol.build(&store), vec![0x10, 0x00]);

        let dol2 = Dol::parse(&[0x9f, 0x37, 0x04]).unwrap();
        let mut store2 = TagStore::new();
        store2.insert(0x9f37, vec![0xaa, 0xbb]);
        assert_eq!(dol2.build(&store2), vec![0x00, 0x00, 0xaa, 0xbb]);
    }

    #[test]
    fn output_length_equals_declared_sum() {
        let dol = Dol::parse(&[0x9f, 0x02, 0x06, 0x95, 0x05, 0x9a, 0x03]).unwrap();
        let store = TagStore::new();
        assert_eq!(dol.build(&store).len(), dol.declared_length());
    }
}
