//! RSA modular exponentiation and ISO/IEC 9796-2 partial-recovery signature
//! format, used to recover the Issuer and ICC certificates and to verify
//! Signed Dynamic Application Data (spec §4.4). Grounded on the teacher's
//! `crypto/chain.rs`, which used the same `crypto-bigint` fixed-width
//! modular-exponentiation approach for EMV's up-to-2048-bit RSA keys.

use crypto_bigint::modular::runtime_mod::{DynResidue, DynResidueParams};
use crypto_bigint::{Encoding, U2048};

use super::errors::VerifyError;

/// EMV RSA moduli never exceed 2048 bits (Book 2 Annex B3.1). 2048 bits
/// gives headroom over today's largest deployed issuer keys (1984 bit).
const LIMB_BYTES: usize = 256;

/// ISO/IEC 9796-2 recovered-message header and trailer bytes.
pub const RECOVERY_HEADER: u8 = 0x6a;
pub const RECOVERY_TRAILER: u8 = 0xbc;

fn to_uint(bytes: &[u8]) -> Result<U2048, VerifyError> {
    if bytes.len() > LIMB_BYTES {
        return Err(VerifyError::CertificateTooLarge(bytes.len()));
    }
    let mut buf = [0u8; LIMB_BYTES];
    buf[LIMB_BYTES - bytes.len()..].copy_from_slice(bytes);
    Ok(U2048::from_be_slice(&buf))
}

/// Computes `base ^ exponent mod modulus`, returning a big-endian byte
/// string the same length as `modulus`.
pub fn modexp(base: &[u8], exponent: &[u8], modulus: &[u8]) -> Result<Vec<u8>, VerifyError> {
    let modulus_len = modulus.len();
    let n = to_uint(modulus)?;
    let params = DynResidueParams::new(&n);
    let b = to_uint(base)?;
    let e = to_uint(exponent)?;
    let residue = DynResidue::new(&b, params);
    let result = residue.pow(&e);
    let full = result.retrieve().to_be_bytes();
    Ok(full[LIMB_BYTES - modulus_len..].to_vec())
}

/// Recovers the signed message block from an RSA signature using the
/// given public key. The signature must be exactly as long as the modulus
/// (EMV certificates are always modulus-length, zero is never stripped).
pub fn recover(signature: &[u8], exponent: &[u8], modulus: &[u8]) -> Result<Vec<u8>, VerifyError> {
    if signature.len() != modulus.len() {
        return Err(VerifyError::CertificateLengthMismatch {
            key_len: modulus.len(),
            cert_len: signature.len(),
        });
    }
    modexp(signature, exponent, modulus)
}

/// Checks the ISO/IEC 9796-2 header (0x6A) and trailer (0xBC) bytes that
/// must bookend a correctly-recovered message block.
pub fn check_recovery_framing(recovered: &[u8]) -> Result<(), VerifyError> {
    match (recovered.first(), recovered.last()) {
        (Some(&RECOVERY_HEADER), Some(&RECOVERY_TRAILER)) => Ok(()),
        _ => Err(VerifyError::IssuerKeyRecoveryFailed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modexp_matches_hand_computation() {
        // 5^3 mod 23 = 125 mod 23 = 10
        let out = modexp(&[5], &[3], &[23]).unwrap();
        assert_eq!(out, vec![10]);
    }

    #[test]
    fn modexp_respects_modulus_length() {
        let out = modexp(&[5], &[3], &[0, 23]).unwrap();
        assert_eq!(out, vec![0, 10]);
    }

    #[test]
    fn recover_rejects_length_mismatch() {
        let err = recover(&[1, 2], &[3], &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, VerifyError::CertificateLengthMismatch { .. }));
    }

    #[test]
    fn framing_accepts_header_and_trailer() {
        let mut block = vec![RECOVERY_HEADER];
        block.extend_from_slice(&[0u8; 10]);
        block.push(RECOVERY_TRAILER);
        check_recovery_framing(&block).unwrap();
    }

    #[test]
    fn framing_rejects_bad_header() {
        let mut block = vec![0x00];
        block.extend_from_slice(&[0u8; 10]);
        block.push(RECOVERY_TRAILER);
        assert!(check_recovery_framing(&block).is_err());
    }
}
