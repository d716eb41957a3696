//! Torn-transaction tracking (spec §4.6/§5): when a card is removed mid
//! GENERATE AC, the terminal must remember that a cryptogram may have been
//! produced without a matching online record, so the next presentment of
//! the same card can be reconciled or treated as a new transaction once
//! the window expires.
//!
//! Keyed by a SHA-256 hash of the PAN rather than the PAN itself, so the
//! log this table is typically paired with never needs to carry raw PAN
//! data at rest. Entries older than the retention window are pruned
//! lazily on the next mutating call, matching the spec §5 concurrency
//! model: readers never block on pruning, only the single mutator does.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

const RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

pub type PanHash = [u8; 32];

pub fn hash_pan(pan: &str) -> PanHash {
    let mut hasher = Sha256::new();
    hasher.update(pan.as_bytes());
    hasher.finalize().into()
}

#[derive(Debug, Clone)]
struct TornEntry {
    aid: Vec<u8>,
    atc: [u8; 2],
    amount_authorized: [u8; 6],
    recorded_at: Duration,
}

fn now() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
}

/// A record of one torn transaction, returned to the caller deciding
/// whether to treat a re-presented card as a continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TornRecord {
    pub aid: Vec<u8>,
    pub atc: [u8; 2],
    pub amount_authorized: [u8; 6],
}

/// Thread-safe: any number of concurrent [`TornTransactionLog::lookup`]
/// calls, serialized against a single writer at a time for
/// [`TornTransactionLog::record`].
#[derive(Debug, Default)]
pub struct TornTransactionLog {
    entries: RwLock<HashMap<PanHash, TornEntry>>,
}

impl TornTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a torn transaction, overwriting any prior entry for the
    /// same PAN hash, and prunes every entry (including this one, if it
    /// is itself already past the retention window — impossible in
    /// practice, but kept for a caller that injects a backdated clock in
    /// tests) older than 24 hours.
    pub fn record(&self, pan_hash: PanHash, aid: Vec<u8>, atc: [u8; 2], amount_authorized: [u8; 6]) {
        let mut entries = self.entries.write().expect("lock poisoned");
        let now = now();
        entries.retain(|_, entry| now.saturating_sub(entry.recorded_at) < RETENTION);
        entries.insert(
            pan_hash,
            TornEntry {
                aid,
                atc,
                amount_authorized,
                recorded_at: now,
            },
        );
    }

    /// Read-only probe: does not prune, so concurrent lookups never block
    /// on or interfere with a writer pruning expired entries.
    pub fn lookup(&self, pan_hash: &PanHash) -> Option<TornRecord> {
        let entries = self.entries.read().expect("lock poisoned");
        entries.get(pan_hash).map(|e| TornRecord {
            aid: e.aid.clone(),
            atc: e.atc,
            amount_authorized: e.amount_authorized,
        })
    }

    /// Clears a PAN's torn-transaction record once it has been
    /// reconciled (either by approving the continuation or by deciding
    /// to treat it as a fresh transaction).
    pub fn clear(&self, pan_hash: &PanHash) {
        self.entries.write().expect("lock poisoned").remove(pan_hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_entry_is_found_by_lookup() {
        let log = TornTransactionLog::new();
        let hash = hash_pan("4111111111111111");
        log.record(hash, vec![0xa0, 0x00, 0x00, 0x00, 0x03], [0x00, 0x01], [0; 6]);
        let record = log.lookup(&hash).expect("entry present");
        assert_eq!(record.aid, vec![0xa0, 0x00, 0x00, 0x00, 0x03]);
        assert_eq!(record.atc, [0x00, 0x01]);
    }

    #[test]
    fn clear_removes_the_entry() {
        let log = TornTransactionLog::new();
        let hash = hash_pan("4111111111111111");
        log.record(hash, vec![], [0, 0], [0; 6]);
        log.clear(&hash);
        assert!(log.lookup(&hash).is_none());
    }

    #[test]
    fn unknown_pan_hash_misses() {
        let log = TornTransactionLog::new();
        assert!(log.lookup(&hash_pan("not recorded")).is_none());
    }

    #[test]
    fn same_pan_hash_overwrites_prior_entry() {
        let log = TornTransactionLog::new();
        let hash = hash_pan("4111111111111111");
        log.record(hash, vec![], [0x00, 0x01], [0; 6]);
        log.record(hash, vec![], [0x00, 0x02], [0; 6]);
        assert_eq!(log.lookup(&hash).unwrap().atc, [0x00, 0x02]);
    }
}
