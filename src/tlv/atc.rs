//! Application Transaction Counter validation (spec §4.1, §8).

use super::errors::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtcFlag {
    ZeroValue,
    MaxValue,
    PotentialReplay,
}

pub fn decode_atc(raw: &[u8]) -> Result<u16, DecodeError> {
    if raw.len() != 2 {
        return Err(DecodeError::WrongType(0x9f36, "2-byte ATC"));
    }
    Ok(u16::from_be_bytes([raw[0], raw[1]]))
}

/// Flags an ATC value against spec §4.1/§8 boundary behaviors: `0x0000` is
/// `ZeroValue`, `0xFFFF` is `MaxValue`, and any value not strictly greater
/// than `previous` (when known) is a potential replay.
pub fn validate_atc(atc: u16, previous: Option<u16>) -> Vec<AtcFlag> {
    let mut flags = Vec::new();
    if atc == 0x0000 {
        flags.push(AtcFlag::ZeroValue);
    }
    if atc == 0xffff {
        flags.push(AtcFlag::MaxValue);
    }
    if let Some(prev) = previous {
        if atc <= prev {
            flags.push(AtcFlag::PotentialReplay);
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_atc_is_flagged() {
        assert_eq!(validate_atc(0x0000, None), vec![AtcFlag::ZeroValue]);
    }

    #[test]
    fn max_atc_is_flagged() {
        assert_eq!(validate_atc(0xffff, None), vec![AtcFlag::MaxValue]);
    }

    #[test]
    fn non_increasing_atc_is_replay() {
        assert_eq!(validate_atc(5, Some(5)), vec![AtcFlag::PotentialReplay]);
        assert_eq!(validate_atc(4, Some(5)), vec![AtcFlag::PotentialReplay]);
        assert!(validate_atc(6, Some(5)).is_empty());
    }
}
