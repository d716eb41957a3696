//! Certificate Authority public key store, keyed by (RID, key index) as
//! EMV Book 2 requires. Grounded on the teacher's `crypto/ca_keys.rs`,
//! which seeded a fixed table of known keys via a `keys_map!` macro; kept
//! the same seeding shape and added the admin API (`add_key`, `revoke`,
//! `keys_for_rid`) spec §4.4 needs for a terminal that must load keys from
//! a payment scheme's public key management system rather than compile
//! them in.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::errors::VerifyError;

#[derive(Debug, Clone)]
pub struct CaPublicKey {
    pub rid: [u8; 5],
    pub index: u8,
    pub modulus: Vec<u8>,
    pub exponent: Vec<u8>,
    pub expiry: NaiveDate,
    pub revoked: bool,
}

impl CaPublicKey {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        today > self.expiry
    }
}

macro_rules! seed_key {
    ($rid:expr, $index:expr, $modulus:expr, $exponent:expr, $expiry:expr) => {
        CaPublicKey {
            rid: $rid,
            index: $index,
            modulus: $modulus.to_vec(),
            exponent: $exponent.to_vec(),
            expiry: $expiry,
            revoked: false,
        }
    };
}

/// Thread-safe through external synchronization (spec §4.9 expects the
/// store to sit behind the same lock `revocation`'s CRL refresh uses).
#[derive(Debug, Clone, Default)]
pub struct CaKeyStore {
    keys: HashMap<([u8; 5], u8), CaPublicKey>,
}

impl CaKeyStore {
    pub fn new() -> Self {
        let mut store = Self::default();
        for key in Self::seed_keys() {
            store.insert(key);
        }
        store
    }

    /// Placeholder sandbox keys for the major RIDs. Production deployments
    /// replace these entirely via `add_key` from scheme-provided key
    /// management files; nothing here is trusted for live acceptance.
    fn seed_keys() -> Vec<CaPublicKey> {
        let far_future = NaiveDate::from_ymd_opt(2030, 12, 31).expect("valid date");
        vec![
            seed_key!(
                [0xa0, 0x00, 0x00, 0x00, 0x03],
                0x08,
                &[0; 248],
                &[0x03],
                far_future
            ),
            seed_key!(
                [0xa0, 0x00, 0x00, 0x00, 0x04],
                0x08,
                &[0; 248],
                &[0x03],
                far_future
            ),
            seed_key!(
                [0xa0, 0x00, 0x00, 0x00, 0x25],
                0x08,
                &[0; 248],
                &[0x03],
                far_future
            ),
            seed_key!(
                [0xa0, 0x00, 0x00, 0x01, 0x52],
                0x08,
                &[0; 248],
                &[0x03],
                far_future
            ),
            seed_key!(
                [0xa0, 0x00, 0x00, 0x00, 0x65],
                0x08,
                &[0; 248],
                &[0x03],
                far_future
            ),
            seed_key!(
                [0xa0, 0x00, 0x00, 0x03, 0x33],
                0x08,
                &[0; 248],
                &[0x03],
                far_future
            ),
        ]
    }

    pub fn add_key(&mut self, key: CaPublicKey) {
        self.keys.insert((key.rid, key.index), key);
    }

    fn insert(&mut self, key: CaPublicKey) {
        self.add_key(key);
    }

    pub fn get(&self, rid: &[u8; 5], index: u8) -> Result<&CaPublicKey, VerifyError> {
        self.keys
            .get(&(*rid, index))
            .ok_or(VerifyError::CaKeyNotFound {
                rid: *rid,
                index,
            })
    }

    pub fn keys_for_rid(&self, rid: &[u8; 5]) -> Vec<&CaPublicKey> {
        self.keys
            .values()
            .filter(|k| &k.rid == rid)
            .collect()
    }

    pub fn revoke(&mut self, rid: &[u8; 5], index: u8) {
        if let Some(key) = self.keys.get_mut(&(*rid, index)) {
            key.revoked = true;
        }
    }

    pub fn has_key(&self, rid: &[u8; 5], index: u8) -> bool {
        self.keys.contains_key(&(*rid, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_has_visa_key() {
        let store = CaKeyStore::new();
        assert!(store.has_key(&[0xa0, 0x00, 0x00, 0x00, 0x03], 0x08));
    }

    #[test]
    fn unknown_key_is_not_found() {
        let store = CaKeyStore::new();
        let err = store.get(&[0xff; 5], 0x99).unwrap_err();
        assert!(matches!(err, VerifyError::CaKeyNotFound { .. }));
    }

    #[test]
    fn revoke_marks_key_without_removing_it() {
        let mut store = CaKeyStore::new();
        let rid = [0xa0, 0x00, 0x00, 0x00, 0x03];
        store.revoke(&rid, 0x08);
        let key = store.get(&rid, 0x08).unwrap();
        assert!(key.revoked);
    }

    #[test]
    fn add_key_overrides_seed() {
        let mut store = CaKeyStore::new();
        let rid = [0xa0, 0x00, 0x00, 0x00, 0x03];
        let expiry = NaiveDate::from_ymd_opt(2099, 1, 1).unwrap();
        store.add_key(seed_key!(rid, 0x08, &[9u8; 8], &[0x03], expiry));
        assert_eq!(store.get(&rid, 0x08).unwrap().modulus, vec![9u8; 8]);
    }
}
