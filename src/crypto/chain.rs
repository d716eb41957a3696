//! Issuer and ICC public key certificate recovery (EMV Book 2 §6), the
//! two links that let static and dynamic data authentication trust a
//! card's public key without a live connection to the issuer. Grounded on
//! the teacher's `crypto/chain.rs`, which walked the same Issuer-cert then
//! ICC-cert recovery chain; field offsets here follow EMV Book 2 tables 2
//! and 4 rather than the teacher's single-brand layout.

use chrono::NaiveDate;
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use super::ca_keys::CaPublicKey;
use super::errors::VerifyError;
use super::rsa::{check_recovery_framing, recover};

const ISSUER_CERT_FORMAT: u8 = 0x02;
const ICC_CERT_FORMAT: u8 = 0x04;
const HASH_ALGORITHM_SHA1: u8 = 0x01;

/// An Issuer public key recovered from its certificate, plus any
/// Issuer Public Key Remainder appended when the key didn't fit.
pub struct RecoveredIssuerKey {
    pub modulus: Vec<u8>,
    pub exponent: Vec<u8>,
    pub expiry: NaiveDate,
}

pub struct RecoveredIccKey {
    pub modulus: Vec<u8>,
    pub exponent: Vec<u8>,
}

fn parse_mmyy(bytes: &[u8]) -> Result<NaiveDate, VerifyError> {
    if bytes.len() != 2 {
        return Err(VerifyError::InvalidIssuerCertFormat);
    }
    let mm = bytes[0];
    let yy = bytes[1];
    let year = 2000 + yy as i32;
    let last_day = match mm {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) {
                29
            } else {
                28
            }
        }
        _ => return Err(VerifyError::InvalidIssuerCertFormat),
    };
    NaiveDate::from_ymd_opt(year, mm as u32, last_day).ok_or(VerifyError::InvalidIssuerCertFormat)
}

/// Recovers the Issuer public key from its certificate (tag 90) using the
/// CA public key named by the certificate's RID and key index. `remainder`
/// is the Issuer Public Key Remainder (tag 92), present when the issuer
/// key is longer than the CA modulus can carry inline. `exponent` is the
/// Issuer Public Key Exponent (tag 9F32).
pub fn recover_issuer_key(
    ca_key: &CaPublicKey,
    cert: &[u8],
    remainder: Option<&[u8]>,
    exponent: &[u8],
) -> Result<RecoveredIssuerKey, VerifyError> {
    if ca_key.revoked {
        return Err(VerifyError::CaKeyRevoked {
            rid: ca_key.rid,
            index: ca_key.index,
        });
    }

    let recovered = recover(cert, &ca_key.exponent, &ca_key.modulus)?;
    check_recovery_framing(&recovered)?;

    if recovered.len() < 36 {
        return Err(VerifyError::InvalidIssuerCertFormat);
    }
    if recovered[1] != ISSUER_CERT_FORMAT {
        return Err(VerifyError::InvalidIssuerCertFormat);
    }

    let expiry = parse_mmyy(&recovered[6..8])?;
    let hash_algorithm = recovered[10];
    let pubkey_len = recovered[12] as usize;
    let exponent_len = recovered[13] as usize;

    if hash_algorithm != HASH_ALGORITHM_SHA1 {
        return Err(VerifyError::InvalidIssuerCertFormat);
    }
    if exponent_len != exponent.len() {
        return Err(VerifyError::InvalidIssuerCertFormat);
    }

    let header_len = 14;
    let trailer_len = 21; // 20-byte SHA-1 hash + 1-byte trailer
    if recovered.len() < header_len + trailer_len {
        return Err(VerifyError::InvalidIssuerCertFormat);
    }
    let inline_key_len = recovered.len() - header_len - trailer_len;
    let inline_key = &recovered[header_len..header_len + inline_key_len];
    let hash = &recovered[recovered.len() - trailer_len..recovered.len() - 1];

    let mut modulus = inline_key.to_vec();
    if let Some(r) = remainder {
        modulus.extend_from_slice(r);
    }
    if modulus.len() != pubkey_len {
        return Err(VerifyError::InvalidIssuerCertFormat);
    }

    let mut hasher = Sha1::new();
    hasher.update(&recovered[1..header_len]);
    hasher.update(inline_key);
    if let Some(r) = remainder {
        hasher.update(r);
    }
    hasher.update(exponent);
    let computed = hasher.finalize();

    if computed.as_slice().ct_eq(hash).unwrap_u8() != 1 {
        return Err(VerifyError::HashMismatch);
    }

    Ok(RecoveredIssuerKey {
        modulus,
        exponent: exponent.to_vec(),
        expiry,
    })
}

/// Recovers the ICC public key from its certificate (tag 9F46), verifying
/// that its embedded PAN matches the card's Application PAN and that the
/// static-data hash matches the surrounding AFL records named by the
/// Static Data Authentication Tag List (tag 9F4A) when doing SDA/CDA.
pub fn recover_icc_key(
    issuer_modulus: &[u8],
    issuer_exponent: &[u8],
    cert: &[u8],
    remainder: Option<&[u8]>,
    icc_exponent: &[u8],
    pan: &[u8],
    static_data: &[u8],
) -> Result<RecoveredIccKey, VerifyError> {
    let recovered = recover(cert, issuer_exponent, issuer_modulus)?;
    check_recovery_framing(&recovered)?;

    if recovered.len() < 42 {
        return Err(VerifyError::InvalidIccCertFormat);
    }
    if recovered[1] != ICC_CERT_FORMAT {
        return Err(VerifyError::InvalidIccCertFormat);
    }

    let cert_pan = &recovered[2..12];
    if !pan_prefix_matches(cert_pan, pan) {
        return Err(VerifyError::UnmatchedPan);
    }

    let hash_algorithm = recovered[16];
    let pubkey_len = recovered[18] as usize;
    let exponent_len = recovered[19] as usize;

    if hash_algorithm != HASH_ALGORITHM_SHA1 {
        return Err(VerifyError::InvalidIccCertFormat);
    }
    if exponent_len != icc_exponent.len() {
        return Err(VerifyError::InvalidIccCertFormat);
    }

    let header_len = 20;
    let trailer_len = 21;
    if recovered.len() < header_len + trailer_len {
        return Err(VerifyError::InvalidIccCertFormat);
    }
    let inline_key_len = recovered.len() - header_len - trailer_len;
    let inline_key = &recovered[header_len..header_len + inline_key_len];
    let hash = &recovered[recovered.len() - trailer_len..recovered.len() - 1];

    let mut modulus = inline_key.to_vec();
    if let Some(r) = remainder {
        modulus.extend_from_slice(r);
    }
    if modulus.len() != pubkey_len {
        return Err(VerifyError::InvalidIccCertFormat);
    }

    let mut hasher = Sha1::new();
    hasher.update(&recovered[1..header_len]);
    hasher.update(inline_key);
    if let Some(r) = remainder {
        hasher.update(r);
    }
    hasher.update(icc_exponent);
    hasher.update(static_data);
    let computed = hasher.finalize();

    if computed.as_slice().ct_eq(hash).unwrap_u8() != 1 {
        return Err(VerifyError::HashMismatch);
    }

    Ok(RecoveredIccKey {
        modulus,
        exponent: icc_exponent.to_vec(),
    })
}

/// Compares the BCD-encoded, `F`-padded PAN embedded in a certificate
/// against the card's Application PAN, ignoring trailing pad nibbles.
fn pan_prefix_matches(cert_pan: &[u8], pan: &[u8]) -> bool {
    let cert_digits = bcd_digits(cert_pan);
    let pan_digits = bcd_digits(pan);
    let len = cert_digits.len().min(pan_digits.len());
    cert_digits[..len] == pan_digits[..len]
}

fn bcd_digits(bytes: &[u8]) -> Vec<u8> {
    let mut digits = Vec::with_capacity(bytes.len() * 2);
    for &b in bytes {
        let hi = b >> 4;
        let lo = b & 0x0f;
        if hi == 0x0f {
            break;
        }
        digits.push(hi);
        if lo == 0x0f {
            break;
        }
        digits.push(lo);
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mmyy_into_naive_date() {
        let d = parse_mmyy(&[12, 30]).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2030, 12, 31).unwrap());
    }

    #[test]
    fn rejects_bad_month() {
        assert!(parse_mmyy(&[13, 30]).is_err());
    }

    #[test]
    fn bcd_digits_stops_at_padding() {
        assert_eq!(bcd_digits(&[0x41, 0x1f]), vec![4, 1, 1]);
    }

    #[test]
    fn pan_prefix_matches_ignores_trailing_pad() {
        assert!(pan_prefix_matches(&[0x41, 0x1f], &[0x41, 0x11, 0x11, 0x1f]));
    }

    #[test]
    fn pan_prefix_mismatch_detected() {
        assert!(!pan_prefix_matches(&[0x41, 0x1f], &[0x42, 0x11, 0x11, 0x1f]));
    }
}
