//! The "card data set" from spec §3: a mapping from TLV tag to raw value
//! bytes, accumulated across SELECT FCI, GPO, READ RECORD and GENERATE AC
//! responses.

use std::collections::HashMap;

use super::node::{BerTlv, TlvNodeValue};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagStore {
    values: HashMap<u32, Vec<u8>>,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a primitive tag's bytes. Duplicates are first-wins, per the
    /// spec §3 invariant.
    pub fn insert_first_wins(&mut self, tag: u32, value: Vec<u8>) {
        self.values.entry(tag).or_insert(value);
    }

    /// Accumulates a parsed tree: constructed tags are expanded, their
    /// primitive children stored individually (first-wins).
    pub fn accumulate(&mut self, nodes: &[BerTlv]) {
        for node in nodes {
            match &node.value {
                TlvNodeValue::Primitive(bytes) => {
                    self.insert_first_wins(node.tag, bytes.clone());
                }
                TlvNodeValue::Constructed(children) => self.accumulate(children),
            }
        }
    }

    pub fn accumulate_raw(&mut self, raw: &[u8]) -> Result<(), super::DecodeError> {
        let nodes = super::node::parse(raw)?;
        self.accumulate(&nodes);
        Ok(())
    }

    pub fn get(&self, tag: u32) -> Option<&[u8]> {
        self.values.get(&tag).map(|v| v.as_slice())
    }

    pub fn contains(&self, tag: u32) -> bool {
        self.values.contains_key(&tag)
    }

    pub fn insert(&mut self, tag: u32, value: Vec<u8>) {
        self.values.insert(tag, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u8])> {
        self.values.iter().map(|(&tag, v)| (tag, v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::node::parse;

    #[test]
    fn first_wins_on_duplicate_primitive() {
        let mut store = TagStore::new();
        store.insert_first_wins(0x9f02, vec![0x01]);
        store.insert_first_wins(0x9f02, vec![0x02]);
        assert_eq!(store.get(0x9f02), Some(&[0x01][..]));
    }

    #[test]
    fn constructed_tags_expand_into_children() {
        let raw = [0x70, 0x04, 0x5a, 0x02, 0x12, 0x34];
        let nodes = parse(&raw).unwrap();
        let mut store = TagStore::new();
        store.accumulate(&nodes);
        assert_eq!(store.get(0x5a), Some(&[0x12, 0x34][..]));
        assert!(!store.contains(0x70));
    }
}
