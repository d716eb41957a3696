//! Offline Data Authentication orchestration: SDA, DDA, fDDA (Visa) and
//! CDA (spec §4.4). Selects a mode from the Application Interchange
//! Profile, drives certificate recovery through `crate::crypto`, and
//! verifies the signed data blocks the card returns. Failures are
//! reported as a `VerifyError` for the caller to fold into the Terminal
//! Verification Results — ODA never aborts a transaction by itself.

use chrono::NaiveDate;
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use crate::crypto::ca_keys::CaKeyStore;
use crate::crypto::chain::{recover_icc_key, recover_issuer_key, RecoveredIccKey};
use crate::crypto::errors::VerifyError;
use crate::crypto::rsa::{check_recovery_framing, recover};
use crate::tlv::store::TagStore;

const HASH_ALGORITHM_SHA1: u8 = 0x01;
const DYNAMIC_DATA_FORMAT: u8 = 0x05;

pub mod tags {
    pub const ISSUER_PUBLIC_KEY_CERTIFICATE: u32 = 0x90;
    pub const ISSUER_PUBLIC_KEY_REMAINDER: u32 = 0x92;
    pub const ISSUER_PUBLIC_KEY_EXPONENT: u32 = 0x9f32;
    pub const ICC_PUBLIC_KEY_CERTIFICATE: u32 = 0x9f46;
    pub const ICC_PUBLIC_KEY_REMAINDER: u32 = 0x9f48;
    pub const ICC_PUBLIC_KEY_EXPONENT: u32 = 0x9f47;
    pub const SIGNED_STATIC_APPLICATION_DATA: u32 = 0x93;
    pub const SIGNED_DYNAMIC_APPLICATION_DATA: u32 = 0x9f4b;
    pub const STATIC_DATA_AUTHENTICATION_TAG_LIST: u32 = 0x9f4a;
}

/// AIP byte 1 bit masks (EMV Book 3 table 21).
pub mod aip_bits {
    pub const SDA_SUPPORTED: u8 = 0b0100_0000;
    pub const DDA_SUPPORTED: u8 = 0b0010_0000;
    pub const CDA_SUPPORTED: u8 = 0b0000_0001;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdaMode {
    Sda,
    Dda,
    FDda,
    Cda,
    None,
}

/// Chooses a mode from the card's AIP byte, preferring CDA over DDA over
/// SDA as spec §4.4 requires. `fdda_candidate` lets a brand kernel (Visa)
/// signal that it wants to treat a DDA-capable card as fDDA instead,
/// since fDDA has no dedicated AIP bit of its own.
pub fn select_mode(aip_byte1: u8, fdda_candidate: bool) -> OdaMode {
    if aip_byte1 & aip_bits::CDA_SUPPORTED != 0 {
        OdaMode::Cda
    } else if aip_byte1 & aip_bits::DDA_SUPPORTED != 0 {
        if fdda_candidate {
            OdaMode::FDda
        } else {
            OdaMode::Dda
        }
    } else if aip_byte1 & aip_bits::SDA_SUPPORTED != 0 {
        OdaMode::Sda
    } else {
        OdaMode::None
    }
}

fn issuer_key_from_card(
    ca_keys: &CaKeyStore,
    card: &TagStore,
    rid: [u8; 5],
    ca_key_index: u8,
    today: NaiveDate,
) -> Result<crate::crypto::chain::RecoveredIssuerKey, VerifyError> {
    let ca_key = ca_keys.get(&rid, ca_key_index)?;
    if ca_key.revoked {
        return Err(VerifyError::CaKeyRevoked {
            rid,
            index: ca_key_index,
        });
    }
    if ca_key.is_expired(today) {
        return Err(VerifyError::CaKeyExpired {
            rid,
            index: ca_key_index,
        });
    }

    let cert = card
        .get(tags::ISSUER_PUBLIC_KEY_CERTIFICATE)
        .ok_or(VerifyError::MissingTag(tags::ISSUER_PUBLIC_KEY_CERTIFICATE))?;
    let exponent = card
        .get(tags::ISSUER_PUBLIC_KEY_EXPONENT)
        .ok_or(VerifyError::MissingTag(tags::ISSUER_PUBLIC_KEY_EXPONENT))?;
    let remainder = card.get(tags::ISSUER_PUBLIC_KEY_REMAINDER);

    let issuer_key = recover_issuer_key(ca_key, cert, remainder, exponent)?;
    if issuer_key.expiry < today {
        return Err(VerifyError::CertificateExpired);
    }
    Ok(issuer_key)
}

/// Recovers the ICC public key via the full CA → Issuer → ICC chain,
/// needed by DDA, fDDA and CDA before the card produces any signature.
pub fn recover_icc_key_for_dynamic_auth(
    ca_keys: &CaKeyStore,
    card: &TagStore,
    rid: [u8; 5],
    ca_key_index: u8,
    pan: &[u8],
    static_data: &[u8],
    today: NaiveDate,
) -> Result<RecoveredIccKey, VerifyError> {
    let issuer_key = issuer_key_from_card(ca_keys, card, rid, ca_key_index, today)?;

    let cert = card
        .get(tags::ICC_PUBLIC_KEY_CERTIFICATE)
        .ok_or(VerifyError::MissingTag(tags::ICC_PUBLIC_KEY_CERTIFICATE))?;
    let exponent = card
        .get(tags::ICC_PUBLIC_KEY_EXPONENT)
        .ok_or(VerifyError::MissingTag(tags::ICC_PUBLIC_KEY_EXPONENT))?;
    let remainder = card.get(tags::ICC_PUBLIC_KEY_REMAINDER);

    recover_icc_key(
        &issuer_key.modulus,
        &issuer_key.exponent,
        cert,
        remainder,
        exponent,
        pan,
        static_data,
    )
}

/// Performs SDA: recovers the Issuer key, then verifies the Signed Static
/// Application Data (tag 93) and returns the 2-byte Data Authentication
/// Code on success.
pub fn perform_sda(
    ca_keys: &CaKeyStore,
    card: &TagStore,
    rid: [u8; 5],
    ca_key_index: u8,
    static_data_to_authenticate: &[u8],
    today: NaiveDate,
) -> Result<[u8; 2], VerifyError> {
    let issuer_key = issuer_key_from_card(ca_keys, card, rid, ca_key_index, today)?;

    let ssad = card
        .get(tags::SIGNED_STATIC_APPLICATION_DATA)
        .ok_or(VerifyError::MissingTag(tags::SIGNED_STATIC_APPLICATION_DATA))?;
    let recovered = recover(ssad, &issuer_key.exponent, &issuer_key.modulus)?;
    check_recovery_framing(&recovered)?;

    const HEADER_LEN: usize = 5;
    const TRAILER_LEN: usize = 21;
    if recovered.len() < HEADER_LEN + TRAILER_LEN {
        return Err(VerifyError::InvalidSdadFormat);
    }
    if recovered[1] != 0x03 || recovered[2] != HASH_ALGORITHM_SHA1 {
        return Err(VerifyError::InvalidSdadFormat);
    }

    let dac = [recovered[3], recovered[4]];
    let hash = &recovered[recovered.len() - TRAILER_LEN..recovered.len() - 1];

    let mut hasher = Sha1::new();
    hasher.update(&recovered[1..recovered.len() - TRAILER_LEN]);
    hasher.update(static_data_to_authenticate);
    let computed = hasher.finalize();

    if computed.as_slice().ct_eq(hash).unwrap_u8() != 1 {
        return Err(VerifyError::HashMismatch);
    }

    Ok(dac)
}

/// A verified Signed Dynamic Application Data block's recovered payload.
pub struct SignedDynamicData {
    pub icc_dynamic_number: Vec<u8>,
}

/// Verifies a Signed Dynamic Application Data block (DDA tag 9F4B
/// returned from INTERNAL AUTHENTICATE, or fDDA's equivalent produced
/// during GPO) against the ICC public key and the terminal's
/// unpredictable number.
pub fn verify_dynamic_signature(
    icc_modulus: &[u8],
    icc_exponent: &[u8],
    sdad: &[u8],
    unpredictable_number: &[u8; 4],
) -> Result<SignedDynamicData, VerifyError> {
    let recovered = recover(sdad, icc_exponent, icc_modulus)?;
    check_recovery_framing(&recovered)?;

    const HEADER_LEN: usize = 4;
    const TRAILER_LEN: usize = 21;
    if recovered.len() < HEADER_LEN + TRAILER_LEN {
        return Err(VerifyError::InvalidSdadFormat);
    }
    if recovered[1] != DYNAMIC_DATA_FORMAT || recovered[2] != HASH_ALGORITHM_SHA1 {
        return Err(VerifyError::InvalidSdadFormat);
    }

    let dynamic_len = recovered[3] as usize;
    if recovered.len() < HEADER_LEN + dynamic_len + TRAILER_LEN {
        return Err(VerifyError::InvalidSdadFormat);
    }
    let dynamic_number = recovered[HEADER_LEN..HEADER_LEN + dynamic_len].to_vec();
    let hash = &recovered[recovered.len() - TRAILER_LEN..recovered.len() - 1];

    let mut hasher = Sha1::new();
    hasher.update(&recovered[1..recovered.len() - TRAILER_LEN]);
    hasher.update(unpredictable_number);
    let computed = hasher.finalize();

    if computed.as_slice().ct_eq(hash).unwrap_u8() != 1 {
        return Err(VerifyError::HashMismatch);
    }

    Ok(SignedDynamicData {
        icc_dynamic_number: dynamic_number,
    })
}

/// The ICC Dynamic Data a CDA-wrapped cryptogram decodes into: the
/// Cryptogram Information Data, ATC, Application Cryptogram and
/// Transaction Data Hash Code packed inside the signed block.
pub struct CdaDynamicData {
    pub cryptogram_information_data: u8,
    pub atc: [u8; 2],
    pub application_cryptogram: [u8; 8],
    pub transaction_data_hash_code: Vec<u8>,
}

/// Verifies CDA: recovers and checks the signed dynamic data exactly as
/// DDA does, then confirms the Application Cryptogram embedded in it
/// matches the AC returned alongside by GENERATE AC.
pub fn verify_cda(
    icc_modulus: &[u8],
    icc_exponent: &[u8],
    sdad: &[u8],
    unpredictable_number: &[u8; 4],
    reported_ac: &[u8; 8],
) -> Result<CdaDynamicData, VerifyError> {
    let signed = verify_dynamic_signature(icc_modulus, icc_exponent, sdad, unpredictable_number)?;
    let dyn_data = &signed.icc_dynamic_number;
    if dyn_data.len() < 11 {
        return Err(VerifyError::InvalidSdadFormat);
    }

    let cid = dyn_data[0];
    let atc = [dyn_data[1], dyn_data[2]];
    let mut ac = [0u8; 8];
    ac.copy_from_slice(&dyn_data[3..11]);
    let transaction_data_hash_code = dyn_data[11..].to_vec();

    if ac.ct_eq(reported_ac).unwrap_u8() != 1 {
        return Err(VerifyError::HashMismatch);
    }

    Ok(CdaDynamicData {
        cryptogram_information_data: cid,
        atc,
        application_cryptogram: ac,
        transaction_data_hash_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_selection_prefers_cda_over_dda_over_sda() {
        assert_eq!(select_mode(0b0000_0001, false), OdaMode::Cda);
        assert_eq!(select_mode(0b0010_0000, false), OdaMode::Dda);
        assert_eq!(select_mode(0b0110_0000, false), OdaMode::Dda);
        assert_eq!(select_mode(0b0100_0000, false), OdaMode::Sda);
        assert_eq!(select_mode(0b0000_0000, false), OdaMode::None);
    }

    #[test]
    fn fdda_candidate_overrides_dda_when_offered() {
        assert_eq!(select_mode(0b0010_0000, true), OdaMode::FDda);
    }

    #[test]
    fn sda_rejects_missing_issuer_cert() {
        let ca_keys = CaKeyStore::new();
        let card = TagStore::new();
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let err = perform_sda(
            &ca_keys,
            &card,
            [0xa0, 0x00, 0x00, 0x00, 0x03],
            0x08,
            &[],
            today,
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::MissingTag(_)));
    }

    #[test]
    fn sda_rejects_unknown_ca_key() {
        let ca_keys = CaKeyStore::new();
        let card = TagStore::new();
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let err = perform_sda(&ca_keys, &card, [0xff; 5], 0x01, &[], today).unwrap_err();
        assert!(matches!(err, VerifyError::CaKeyNotFound { .. }));
    }
}
