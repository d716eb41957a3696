//! 2-key Triple DES and the ISO/IEC 9797-1 MAC Algorithm 3 ("Retail MAC")
//! used throughout EMV for session-key derivation, ARQC/ARPC generation,
//! and issuer script MACs. Grounded on the teacher's use of the `des` and
//! `cipher` crates for block cipher primitives.

use cipher::generic_array::GenericArray;
use cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use des::{Des, TdesEde2};

/// Encrypts a single 8-byte block under a 16-byte (2-key) 3DES key.
pub fn tdes_encrypt_block(key: &[u8; 16], block: &[u8; 8]) -> [u8; 8] {
    let cipher = TdesEde2::new_from_slice(key).expect("16-byte key is always valid");
    let mut buf = GenericArray::clone_from_slice(block);
    cipher.encrypt_block(&mut buf);
    buf.into()
}

/// Decrypts a single 8-byte block under a 16-byte (2-key) 3DES key.
pub fn tdes_decrypt_block(key: &[u8; 16], block: &[u8; 8]) -> [u8; 8] {
    let cipher = TdesEde2::new_from_slice(key).expect("16-byte key is always valid");
    let mut buf = GenericArray::clone_from_slice(block);
    cipher.decrypt_block(&mut buf);
    buf.into()
}

pub(crate) fn des_encrypt_block(key: &[u8; 8], block: [u8; 8]) -> [u8; 8] {
    let cipher = Des::new_from_slice(key).expect("8-byte key is always valid");
    let mut buf = GenericArray::clone_from_slice(&block);
    cipher.encrypt_block(&mut buf);
    buf.into()
}

fn des_decrypt_block(key: &[u8; 8], block: [u8; 8]) -> [u8; 8] {
    let cipher = Des::new_from_slice(key).expect("8-byte key is always valid");
    let mut buf = GenericArray::clone_from_slice(&block);
    cipher.decrypt_block(&mut buf);
    buf.into()
}

pub(crate) fn xor8(a: [u8; 8], b: [u8; 8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    for i in 0..8 {
        out[i] = a[i] ^ b[i];
    }
    out
}

/// ISO/IEC 7816 padding method 2: append `0x80` then zero bytes up to the
/// next multiple of the block size.
fn iso_pad(data: &[u8]) -> Vec<u8> {
    let mut padded = data.to_vec();
    padded.push(0x80);
    while padded.len() % 8 != 0 {
        padded.push(0x00);
    }
    padded
}

/// Computes the ISO/IEC 9797-1 MAC Algorithm 3 ("Retail MAC") over `data`
/// using a 16-byte 2-key 3DES key, split as KL (left 8 bytes, single-DES
/// CBC) and KR (right 8 bytes, used only in the final triple-DES step).
pub fn retail_mac(key: &[u8; 16], data: &[u8]) -> [u8; 8] {
    let mut kl = [0u8; 8];
    let mut kr = [0u8; 8];
    kl.copy_from_slice(&key[..8]);
    kr.copy_from_slice(&key[8..]);

    let padded = iso_pad(data);
    let mut chain = [0u8; 8];
    for block in padded.chunks_exact(8) {
        let mut b = [0u8; 8];
        b.copy_from_slice(block);
        chain = des_encrypt_block(&kl, xor8(chain, b));
    }

    let decrypted = des_decrypt_block(&kr, chain);
    des_encrypt_block(&kl, decrypted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retail_mac_is_deterministic_and_key_dependent() {
        let key_a = [0x11u8; 16];
        let key_b = [0x22u8; 16];
        let data = b"GENERATE AC test data payload!!";
        let mac_a1 = retail_mac(&key_a, data);
        let mac_a2 = retail_mac(&key_a, data);
        let mac_b = retail_mac(&key_b, data);
        assert_eq!(mac_a1, mac_a2);
        assert_ne!(mac_a1, mac_b);
    }

    #[test]
    fn tdes_round_trips() {
        let key = [0x5au8; 16];
        let block = [1, 2, 3, 4, 5, 6, 7, 8];
        let ct = tdes_encrypt_block(&key, &block);
        let pt = tdes_decrypt_block(&key, &ct);
        assert_eq!(pt, block);
    }

    #[test]
    fn mac_changes_with_data() {
        let key = [0x33u8; 16];
        let mac1 = retail_mac(&key, b"first message");
        let mac2 = retail_mac(&key, b"second message");
        assert_ne!(mac1, mac2);
    }
}
