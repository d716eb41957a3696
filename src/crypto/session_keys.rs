//! EMV ICC master key, session-key derivation (Book 2 Annex A1.2/A1.3) and
//! ARPC computation/verification (Book 2 Annex A2, both methods).

use subtle::ConstantTimeEq;

use super::tdes::{retail_mac, tdes_encrypt_block, xor8};

fn set_odd_parity(byte: u8) -> u8 {
    if byte.count_ones() % 2 == 0 {
        byte ^ 1
    } else {
        byte
    }
}

fn adjust_parity(key: &mut [u8; 16]) {
    for b in key.iter_mut() {
        *b = set_odd_parity(*b);
    }
}

/// Packs up to 16 decimal digits (one BCD nibble per `u8`) into 8 bytes,
/// right-aligned and left-padded with zero nibbles if `digits` is shorter.
fn pack_bcd_16(digits: &[u8]) -> [u8; 8] {
    let mut padded = [0u8; 16];
    let take = digits.len().min(16);
    padded[16 - take..].copy_from_slice(&digits[digits.len() - take..]);

    let mut out = [0u8; 8];
    for i in 0..8 {
        out[i] = (padded[2 * i] << 4) | padded[2 * i + 1];
    }
    out
}

/// Derives the ICC master key from an Issuer Master Key, per Book 2 Annex
/// A1.2: `MK_ICC = 3DES_ENC(IMK, D) ‖ 3DES_ENC(IMK, D XOR FF..FF)`, where
/// `D` is the rightmost 16 BCD digits of `PAN ‖ PAN Sequence Number`.
///
/// `pan` is the card's decoded PAN as one decimal digit (0..=9) per byte,
/// the same representation [`crate::tlv::pan::decode_pan`] returns.
pub fn derive_icc_master(imk: &[u8; 16], pan: &[u8], psn: u8) -> [u8; 16] {
    let mut digits = Vec::with_capacity(pan.len() + 2);
    digits.extend_from_slice(pan);
    digits.push(psn / 10);
    digits.push(psn % 10);

    let derivation_data = pack_bcd_16(&digits);
    let complement = derivation_data.map(|b| !b);

    let left = tdes_encrypt_block(imk, &derivation_data);
    let right = tdes_encrypt_block(imk, &complement);

    let mut mk_icc = [0u8; 16];
    mk_icc[..8].copy_from_slice(&left);
    mk_icc[8..].copy_from_slice(&right);
    adjust_parity(&mut mk_icc);
    mk_icc
}

/// Session-key type discriminants (Book 2 Annex A1.3): which of the three
/// session keys derivable from one ICC master key is being produced.
pub const KEY_TYPE_AC: u8 = 0x00;
pub const KEY_TYPE_SMC: u8 = 0x01;
pub const KEY_TYPE_SMI: u8 = 0x02;

/// Derives a per-transaction session key from an ICC master key, the
/// Application Transaction Counter, and a key type, per EMV Book 2 Annex
/// A1.3. The same ICC master key yields three independent session keys
/// (AC, secure-messaging confidentiality, secure-messaging integrity) for
/// the same ATC, distinguished only by `key_type`.
pub fn derive_session_key(icc_master_key: &[u8; 16], atc: u16, key_type: u8) -> [u8; 16] {
    let atc_bytes = atc.to_be_bytes();

    let mut r_left = [0u8; 8];
    r_left[0] = atc_bytes[0];
    r_left[1] = atc_bytes[1];
    r_left[2] = 0xf0;
    r_left[3] = key_type;

    let mut r_right = [0u8; 8];
    r_right[0] = atc_bytes[0];
    r_right[1] = atc_bytes[1];
    r_right[2] = 0x0f;
    r_right[3] = key_type;

    let sk_left = tdes_encrypt_block(icc_master_key, &r_left);
    let sk_right = tdes_encrypt_block(icc_master_key, &r_right);

    let mut session_key = [0u8; 16];
    session_key[..8].copy_from_slice(&sk_left);
    session_key[8..].copy_from_slice(&sk_right);
    adjust_parity(&mut session_key);
    session_key
}

/// Authorization Response Cryptogram method 1: a Retail MAC over the ARQC
/// XORed with the (zero-padded) Authorization Response Code.
pub fn arpc_method1(session_key: &[u8; 16], arqc: &[u8; 8], arc: [u8; 2]) -> [u8; 8] {
    let mut padded_arc = [0u8; 8];
    padded_arc[0] = arc[0];
    padded_arc[1] = arc[1];
    retail_mac(session_key, &xor8(*arqc, padded_arc))
}

/// Authorization Response Cryptogram method 2: the first four bytes of
/// `3DES_ENC(SK, ARQC)` XORed with the Card Status Update (and any
/// proprietary authentication data filling out a short CSU).
pub fn arpc_method2(
    session_key: &[u8; 16],
    arqc: &[u8; 8],
    csu: [u8; 4],
    proprietary_auth_data: &[u8],
) -> [u8; 4] {
    let temp = tdes_encrypt_block(session_key, arqc);

    let mut operand = Vec::with_capacity(4 + proprietary_auth_data.len());
    operand.extend_from_slice(&csu);
    operand.extend_from_slice(proprietary_auth_data);
    operand.resize(4, 0);

    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = temp[i] ^ operand[i];
    }
    out
}

/// Verifies a candidate ARPC (method 1) against the session key in
/// constant time, so a mutated ARPC byte never takes a different number of
/// comparison rounds than the correct one.
pub fn verify_arpc(session_key: &[u8; 16], arqc: &[u8; 8], arc: [u8; 2], candidate: &[u8]) -> bool {
    let expected = arpc_method1(session_key, arqc, arc);
    if candidate.len() != expected.len() {
        return false;
    }
    expected.ct_eq(candidate).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icc_master_key_has_odd_parity_bytes() {
        let imk = [0x5au8; 16];
        let pan = [4, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1];
        let mk = derive_icc_master(&imk, &pan, 0);
        for b in mk.iter() {
            assert_eq!(b.count_ones() % 2, 1, "byte {b:#x} lacks odd parity");
        }
    }

    #[test]
    fn icc_master_key_varies_with_psn() {
        let imk = [0x5au8; 16];
        let pan = [4, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1];
        assert_ne!(derive_icc_master(&imk, &pan, 0), derive_icc_master(&imk, &pan, 1));
    }

    #[test]
    fn session_key_has_odd_parity_bytes() {
        let mk = [0x42u8; 16];
        let sk = derive_session_key(&mk, 0x0001, KEY_TYPE_AC);
        for b in sk.iter() {
            assert_eq!(b.count_ones() % 2, 1, "byte {b:#x} lacks odd parity");
        }
    }

    #[test]
    fn session_key_varies_with_atc() {
        let mk = [0x42u8; 16];
        assert_ne!(
            derive_session_key(&mk, 1, KEY_TYPE_AC),
            derive_session_key(&mk, 2, KEY_TYPE_AC)
        );
    }

    #[test]
    fn session_key_varies_with_key_type() {
        let mk = [0x42u8; 16];
        assert_ne!(
            derive_session_key(&mk, 1, KEY_TYPE_AC),
            derive_session_key(&mk, 1, KEY_TYPE_SMC)
        );
        assert_ne!(
            derive_session_key(&mk, 1, KEY_TYPE_SMC),
            derive_session_key(&mk, 1, KEY_TYPE_SMI)
        );
    }

    #[test]
    fn arpc_method1_varies_with_arc() {
        let sk = [0x11u8; 16];
        let arqc = [0xaau8; 8];
        let arpc_00 = arpc_method1(&sk, &arqc, [0x30, 0x30]);
        let arpc_05 = arpc_method1(&sk, &arqc, [0x30, 0x35]);
        assert_ne!(arpc_00, arpc_05);
    }

    #[test]
    fn arpc_method2_varies_with_csu() {
        let sk = [0x11u8; 16];
        let arqc = [0xaau8; 8];
        let arpc_a = arpc_method2(&sk, &arqc, [0, 0, 0, 0], &[]);
        let arpc_b = arpc_method2(&sk, &arqc, [0x80, 0, 0, 0], &[]);
        assert_ne!(arpc_a, arpc_b);
    }

    #[test]
    fn verify_arpc_accepts_correct_value_and_rejects_mutated_bit() {
        let sk = [0x77u8; 16];
        let arqc = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let arc = [0x30, 0x30];
        let mut candidate = arpc_method1(&sk, &arqc, arc).to_vec();
        assert!(verify_arpc(&sk, &arqc, arc, &candidate));

        candidate[0] ^= 0x01;
        assert!(!verify_arpc(&sk, &arqc, arc, &candidate));
    }

    #[test]
    fn verify_arpc_rejects_wrong_length() {
        let sk = [0x77u8; 16];
        let arqc = [0u8; 8];
        assert!(!verify_arpc(&sk, &arqc, [0x30, 0x30], &[0u8; 4]));
    }
}
