//! DUKPT (ANSI X9.24) key derivation: a 10-byte Key Serial Number laid out
//! as a 59-bit base identifier plus a 21-bit transaction counter, and a
//! future-key register seeded from an Initial PIN Encryption Key (spec
//! §4.5). This models derivation as though running inside a secure
//! enclave; it does not itself provide tamper evidence.

pub mod errors;

pub use errors::DukptError;

use zeroize::Zeroize;

use crate::crypto::tdes::des_encrypt_block;

/// Applied to both halves of the base key inside `derive_future`, per
/// ANSI X9.24's non-reversible key generation process.
const KEY_VARIANT_CONSTANT: [u8; 8] = [0xc0, 0xc0, 0xc0, 0xc0, 0x00, 0x00, 0x00, 0x00];

/// Largest representable value of the 21-bit transaction counter.
const MAX_COUNTER: u32 = (1 << 21) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyVariant {
    Pin,
    Mac,
    Data,
}

impl KeyVariant {
    fn mask(self) -> [u8; 8] {
        match self {
            KeyVariant::Pin => [0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0x00, 0xff],
            KeyVariant::Mac => [0x00, 0x00, 0x00, 0x00, 0xff, 0x00, 0x00, 0xff],
            KeyVariant::Data => [0x00, 0x00, 0x00, 0xff, 0x00, 0x00, 0x00, 0xff],
        }
    }
}

/// A derived working key. Zeroized on drop; callers must not copy the
/// inner bytes into a growable container that escapes this type.
pub struct WorkingKey(pub [u8; 16]);

impl Drop for WorkingKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

fn xor8(a: [u8; 8], b: [u8; 8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    for i in 0..8 {
        out[i] = a[i] ^ b[i];
    }
    out
}

fn counter_from_ksn(ksn: &[u8; 10]) -> u32 {
    ((ksn[7] as u32 & 0x1f) << 16) | ((ksn[8] as u32) << 8) | ksn[9] as u32
}

fn base_from_ksn(ksn: &[u8; 10]) -> [u8; 10] {
    let mut base = *ksn;
    base[7] &= 0xe0;
    base[8] = 0;
    base[9] = 0;
    base
}

fn ksn_with_counter(base: &[u8; 10], counter: u32) -> [u8; 10] {
    let mut ksn = *base;
    ksn[7] = (ksn[7] & 0xe0) | ((counter >> 16) as u8 & 0x1f);
    ksn[8] = (counter >> 8) as u8;
    ksn[9] = counter as u8;
    ksn
}

/// Register slot `0` holds the key for the counter with only bit 20 (the
/// highest counter bit) set; slot `20` holds the key for bit 0.
fn slot_of_bit(bit: u32) -> usize {
    (20 - bit) as usize
}

fn derive_future(base: &[u8; 16], crypto_ksn: &[u8; 10]) -> [u8; 16] {
    let base_l: [u8; 8] = base[0..8].try_into().expect("8-byte slice");
    let base_r: [u8; 8] = base[8..16].try_into().expect("8-byte slice");
    let crypto_r: [u8; 8] = crypto_ksn[2..10].try_into().expect("8-byte slice");

    let variant_l = xor8(base_l, KEY_VARIANT_CONSTANT);
    let variant_r = xor8(base_r, KEY_VARIANT_CONSTANT);

    let right = des_encrypt_block(&base_l, xor8(base_r, crypto_r));
    let left = des_encrypt_block(&variant_l, xor8(variant_r, crypto_r));

    let mut out = [0u8; 16];
    out[..8].copy_from_slice(&left);
    out[8..].copy_from_slice(&right);
    out
}

/// A single DUKPT key management session. Serialized by the caller: each
/// `next_key` call is atomic and commits future-key register updates
/// before zeroing intermediates.
pub struct DukptState {
    ksn_base: [u8; 10],
    counter: u32,
    future_key_register: [Option<[u8; 16]>; 21],
    initialized: bool,
    destroyed: bool,
}

impl Default for DukptState {
    fn default() -> Self {
        Self {
            ksn_base: [0u8; 10],
            counter: 0,
            future_key_register: [None; 21],
            initialized: false,
            destroyed: false,
        }
    }
}

impl DukptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the future-key register from `ipek` per ANSI X9.24: for each
    /// set bit of the initial counter, derives and stores the
    /// corresponding future key. `ipek` must be 16 bytes (single 3DES
    /// base key) or 32 bytes, in which case the two 16-byte halves are
    /// folded together by XOR to produce the working base key.
    pub fn initialize(&mut self, ipek: &[u8], initial_ksn: [u8; 10]) -> Result<(), DukptError> {
        if self.initialized {
            return Err(DukptError::AlreadyInitialized);
        }

        let mut key16 = [0u8; 16];
        match ipek.len() {
            16 => key16.copy_from_slice(ipek),
            32 => {
                for i in 0..16 {
                    key16[i] = ipek[i] ^ ipek[i + 16];
                }
            }
            other => return Err(DukptError::InvalidIpekLength(other)),
        }

        let base = base_from_ksn(&initial_ksn);
        let mut register = [None; 21];
        register[0] = Some(key16);
        for slot in 1..21 {
            let bit = 20 - slot as u32;
            let prev = register[slot - 1].expect("earlier slot always populated");
            let crypto_ksn = ksn_with_counter(&base, 1u32 << bit);
            register[slot] = Some(derive_future(&prev, &crypto_ksn));
        }

        key16.zeroize();
        self.ksn_base = base;
        self.counter = counter_from_ksn(&initial_ksn);
        self.future_key_register = register;
        self.initialized = true;
        Ok(())
    }

    /// Advances the counter (skipping values with more than 10 one-bits),
    /// derives the working key for the intended use, and returns it
    /// alongside the KSN snapshot and the number of counter values left.
    pub fn next_key(
        &mut self,
        variant: KeyVariant,
    ) -> Result<(WorkingKey, [u8; 10], u32), DukptError> {
        if self.destroyed {
            return Err(DukptError::Destroyed);
        }
        if !self.initialized {
            return Err(DukptError::NotInitialized);
        }

        loop {
            if self.counter >= MAX_COUNTER {
                return Err(DukptError::Exhausted);
            }
            self.counter += 1;
            if self.counter.count_ones() <= 10 {
                break;
            }
        }

        let set_bits: Vec<u32> = (0..=20).rev().filter(|b| (self.counter >> b) & 1 == 1).collect();
        let highest = *set_bits.first().ok_or(DukptError::Exhausted)?;
        let mut current = self.future_key_register[slot_of_bit(highest)]
            .ok_or(DukptError::Exhausted)?;

        let mut accumulated = 1u32 << highest;
        for &bit in &set_bits[1..] {
            accumulated |= 1u32 << bit;
            let crypto_ksn = ksn_with_counter(&self.ksn_base, accumulated);
            current = derive_future(&current, &crypto_ksn);
        }

        let lowest = *set_bits.last().expect("at least one set bit");
        let lowest_slot = slot_of_bit(lowest);
        self.future_key_register[lowest_slot] = Some(current);
        for idx in (lowest_slot + 1)..21 {
            if let Some(mut stale) = self.future_key_register[idx].take() {
                stale.zeroize();
            }
        }

        let mask = variant.mask();
        let mut working = [0u8; 16];
        working[..8].copy_from_slice(&xor8(current[0..8].try_into().unwrap(), mask));
        working[8..].copy_from_slice(&xor8(current[8..16].try_into().unwrap(), mask));
        current.zeroize();

        let ksn_snapshot = ksn_with_counter(&self.ksn_base, self.counter);
        let remaining = MAX_COUNTER - self.counter;
        Ok((WorkingKey(working), ksn_snapshot, remaining))
    }

    /// Overwrites all key material with zeros. The module is terminally
    /// unusable afterwards; re-initialization requires external
    /// re-injection of a fresh IPEK.
    pub fn destroy(&mut self) {
        self.ksn_base.zeroize();
        self.counter = 0;
        for slot in self.future_key_register.iter_mut() {
            if let Some(mut key) = slot.take() {
                key.zeroize();
            }
        }
        self.destroyed = true;
        self.initialized = false;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Reference IPEK derivation from a Base Derivation Key, normally
/// performed inside an HSM rather than on the terminal itself.
pub fn derive_ipek_from_bdk(bdk: &[u8; 16], initial_ksn: &[u8; 10]) -> [u8; 16] {
    let masked: [u8; 8] = {
        let mut m = [0u8; 8];
        m.copy_from_slice(&initial_ksn[2..10]);
        m[2] &= 0xe0;
        m[3] = 0;
        m[4] = 0;
        m
    };
    let bdk_l: [u8; 8] = bdk[0..8].try_into().unwrap();
    let bdk_r: [u8; 8] = bdk[8..16].try_into().unwrap();
    let variant_l = xor8(bdk_l, KEY_VARIANT_CONSTANT);
    let variant_r = xor8(bdk_r, KEY_VARIANT_CONSTANT);

    let left = des_encrypt_block(&bdk_l, masked);
    let right = des_encrypt_block(&xor8(variant_l, variant_r), masked);

    let mut ipek = [0u8; 16];
    ipek[..8].copy_from_slice(&left);
    ipek[8..].copy_from_slice(&right);
    ipek
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipek() -> [u8; 16] {
        [0x11; 16]
    }

    #[test]
    fn initialize_then_next_key_succeeds() {
        let mut dukpt = DukptState::new();
        dukpt.initialize(&ipek(), [0u8; 10]).unwrap();
        let (key, ksn, remaining) = dukpt.next_key(KeyVariant::Pin).unwrap();
        assert_ne!(key.0, [0u8; 16]);
        assert_eq!(counter_from_ksn(&ksn), 1);
        assert_eq!(remaining, MAX_COUNTER - 1);
    }

    #[test]
    fn successive_ksns_strictly_increase() {
        let mut dukpt = DukptState::new();
        dukpt.initialize(&ipek(), [0u8; 10]).unwrap();
        let mut last_counter = 0;
        for _ in 0..20 {
            let (_key, ksn, _remaining) = dukpt.next_key(KeyVariant::Data).unwrap();
            let counter = counter_from_ksn(&ksn);
            assert!(counter > last_counter);
            assert!(counter.count_ones() <= 10);
            last_counter = counter;
        }
    }

    #[test]
    fn double_initialize_rejected() {
        let mut dukpt = DukptState::new();
        dukpt.initialize(&ipek(), [0u8; 10]).unwrap();
        assert_eq!(
            dukpt.initialize(&ipek(), [0u8; 10]).unwrap_err(),
            DukptError::AlreadyInitialized
        );
    }

    #[test]
    fn destroy_zeroizes_and_blocks_further_use() {
        let mut dukpt = DukptState::new();
        dukpt.initialize(&ipek(), [0u8; 10]).unwrap();
        dukpt.destroy();
        assert!(dukpt.is_destroyed());
        assert_eq!(dukpt.ksn_base, [0u8; 10]);
        assert!(dukpt.future_key_register.iter().all(Option::is_none));
        assert_eq!(
            dukpt.next_key(KeyVariant::Pin).unwrap_err(),
            DukptError::Destroyed
        );
    }

    #[test]
    fn exhausts_at_counter_boundary() {
        let mut dukpt = DukptState::new();
        dukpt.initialize(&ipek(), [0u8; 10]).unwrap();
        dukpt.counter = MAX_COUNTER;
        assert_eq!(
            dukpt.next_key(KeyVariant::Mac).unwrap_err(),
            DukptError::Exhausted
        );
    }

    #[test]
    fn rejects_bad_ipek_length() {
        let mut dukpt = DukptState::new();
        let err = dukpt.initialize(&[0u8; 10], [0u8; 10]).unwrap_err();
        assert_eq!(err, DukptError::InvalidIpekLength(10));
    }
}
