//! PAN decoding: nibble-by-nibble BCD with Luhn validation (spec §4.1).

use super::errors::DecodeError;

/// Decodes a BCD-packed PAN, halting at the first `0xF` padding nibble.
/// Accepts 13..=19 digits and requires the Luhn checksum to pass
/// (ISO/IEC 7812-1).
pub fn decode_pan(raw: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut digits = Vec::with_capacity(raw.len() * 2);
    'outer: for &byte in raw {
        for nibble in [byte >> 4, byte & 0x0f] {
            if nibble == 0x0f {
                break 'outer;
            }
            if nibble > 9 {
                return Err(DecodeError::InvalidPan("non-BCD nibble"));
            }
            digits.push(nibble);
        }
    }

    if digits.len() < 13 {
        return Err(DecodeError::InvalidPan("too short"));
    }
    if digits.len() > 19 {
        return Err(DecodeError::InvalidPan("too long"));
    }
    if !luhn_checksum_ok(&digits) {
        return Err(DecodeError::InvalidPan("Luhn check failed"));
    }

    Ok(digits)
}

pub fn luhn_checksum_ok(digits: &[u8]) -> bool {
    luhn_sum(digits) % 10 == 0
}

pub fn luhn_sum(digits: &[u8]) -> u32 {
    digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d as u32 * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d as u32
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_valid_pan_with_padding() {
        // 4111111111111111 is the well-known Luhn-valid Visa test PAN
        let raw = [0x41, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11];
        let digits = decode_pan(&raw).unwrap();
        assert_eq!(digits.len(), 16);
        assert!(luhn_checksum_ok(&digits));
    }

    #[test]
    fn rejects_too_short() {
        let raw = [0x12, 0x34, 0x5f, 0xff];
        assert_eq!(decode_pan(&raw), Err(DecodeError::InvalidPan("too short")));
    }

    #[test]
    fn rejects_bad_luhn() {
        // one digit flipped from the valid PAN above
        let raw = [0x41, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x12];
        assert_eq!(
            decode_pan(&raw),
            Err(DecodeError::InvalidPan("Luhn check failed"))
        );
    }
}
