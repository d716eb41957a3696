//! CA public key revocation tracking (spec §4.3): a thread-safe map keyed
//! by (RID, key index), refreshed from a simple line-oriented CRL feed
//! with single-flight online refresh. A production deployment that needs
//! full X.509 CRL parsing replaces only the `CrlFetcher` implementation
//! and the one `parse_crl` adapter below; this module is otherwise format
//! agnostic.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationStatus {
    Valid,
    Revoked { reason: String, date: String },
    Unknown,
}

#[derive(Debug, Clone)]
struct RevocationEntry {
    reason: String,
    revocation_date: String,
    added_at_ms: u128,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RevocationStats {
    pub entry_count: usize,
    pub last_refresh_ms: Option<u128>,
}

/// Fetches the raw CRL bytes from wherever the deployment publishes them.
/// Implementations MUST validate TLS certificates by default (spec §4.3);
/// `fetch` receives the caller's configured byte cap and must not read
/// past it.
pub trait CrlFetcher {
    fn fetch(&self, max_bytes: usize) -> Result<Vec<u8>, EngineError>;
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

pub struct RevocationTable {
    entries: RwLock<HashMap<([u8; 5], u8), RevocationEntry>>,
    last_refresh: Mutex<Option<Instant>>,
    last_refresh_wall_ms: Mutex<Option<u128>>,
    refresh_lock: Mutex<()>,
    refresh_interval: Duration,
    max_crl_bytes: usize,
    fetcher: Option<Box<dyn CrlFetcher + Send + Sync>>,
}

impl RevocationTable {
    /// `max_crl_bytes` defaults to 1 MiB and `refresh_interval` to 24h per
    /// spec §4.3 when constructed via `Config`; callers needing different
    /// bounds pass them explicitly here.
    pub fn new(refresh_interval: Duration, max_crl_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            last_refresh: Mutex::new(None),
            last_refresh_wall_ms: Mutex::new(None),
            refresh_lock: Mutex::new(()),
            refresh_interval,
            max_crl_bytes,
            fetcher: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn CrlFetcher + Send + Sync>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn add_revoked_ca_key(&self, rid: [u8; 5], index: u8, reason: String, date: Option<String>) {
        let mut entries = self.entries.write().expect("revocation table lock poisoned");
        entries.insert(
            (rid, index),
            RevocationEntry {
                reason,
                revocation_date: date.unwrap_or_default(),
                added_at_ms: now_ms(),
            },
        );
    }

    pub fn check_ca_key_revocation(
        &self,
        rid: [u8; 5],
        index: u8,
        check_online: bool,
    ) -> RevocationStatus {
        if check_online {
            let refreshed = self.refresh_if_needed().is_ok();
            let ever_refreshed = self.last_refresh.lock().expect("lock poisoned").is_some();
            if !refreshed && !ever_refreshed {
                return RevocationStatus::Unknown;
            }
        }

        let entries = self.entries.read().expect("revocation table lock poisoned");
        match entries.get(&(rid, index)) {
            Some(entry) => RevocationStatus::Revoked {
                reason: entry.reason.clone(),
                date: entry.revocation_date.clone(),
            },
            None => RevocationStatus::Valid,
        }
    }

    pub fn get_stats(&self) -> RevocationStats {
        RevocationStats {
            entry_count: self.entries.read().expect("lock poisoned").len(),
            last_refresh_ms: *self.last_refresh_wall_ms.lock().expect("lock poisoned"),
        }
    }

    /// Single-flight refresh: a second caller arriving while a refresh is
    /// already in progress returns immediately and proceeds with
    /// whatever data is currently loaded.
    fn refresh_if_needed(&self) -> Result<(), EngineError> {
        let fetcher = match &self.fetcher {
            Some(f) => f,
            None => return Err(EngineError::Protocol("no CRL fetcher configured".into())),
        };

        let _guard = match self.refresh_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => return Ok(()),
        };

        {
            let last = self.last_refresh.lock().expect("lock poisoned");
            if let Some(t) = *last {
                if t.elapsed() < self.refresh_interval {
                    return Ok(());
                }
            }
        }

        let bytes = fetcher.fetch(self.max_crl_bytes)?;
        self.apply_crl(&bytes)?;
        *self.last_refresh.lock().expect("lock poisoned") = Some(Instant::now());
        *self.last_refresh_wall_ms.lock().expect("lock poisoned") = Some(now_ms());
        Ok(())
    }

    fn apply_crl(&self, bytes: &[u8]) -> Result<(), EngineError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| EngineError::Protocol("CRL payload is not valid UTF-8".into()))?;
        let parsed = parse_crl(text)?;

        let mut entries = self.entries.write().expect("lock poisoned");
        for (rid, index, reason, date) in parsed {
            entries.insert(
                (rid, index),
                RevocationEntry {
                    reason,
                    revocation_date: date,
                    added_at_ms: now_ms(),
                },
            );
        }
        Ok(())
    }
}

/// Parses the line-oriented `RID_HEX:INDEX_HEX:REASON:DATE` CRL format.
/// Blank lines and lines starting with `#` are ignored.
fn parse_crl(text: &str) -> Result<Vec<([u8; 5], u8, String, String)>, EngineError> {
    let mut out = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(4, ':');
        let rid_hex = parts
            .next()
            .ok_or_else(|| EngineError::Protocol(format!("malformed CRL line: {line}")))?;
        let index_hex = parts
            .next()
            .ok_or_else(|| EngineError::Protocol(format!("malformed CRL line: {line}")))?;
        let reason = parts
            .next()
            .ok_or_else(|| EngineError::Protocol(format!("malformed CRL line: {line}")))?;
        let date = parts.next().unwrap_or("").to_string();

        let rid_bytes = hex::decode(rid_hex)
            .map_err(|_| EngineError::Protocol(format!("bad RID hex in CRL line: {line}")))?;
        if rid_bytes.len() != 5 {
            return Err(EngineError::Protocol(format!("RID must be 5 bytes: {line}")));
        }
        let mut rid = [0u8; 5];
        rid.copy_from_slice(&rid_bytes);
        let index = u8::from_str_radix(index_hex, 16)
            .map_err(|_| EngineError::Protocol(format!("bad index hex in CRL line: {line}")))?;

        out.push((rid, index, reason.to_string(), date));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrevoked_key_is_valid_without_online_check() {
        let table = RevocationTable::new(Duration::from_secs(60 * 60 * 24), 1 << 20);
        let status = table.check_ca_key_revocation([0xa0, 0, 0, 0, 3], 0x08, false);
        assert_eq!(status, RevocationStatus::Valid);
    }

    #[test]
    fn admin_added_revocation_is_reported() {
        let table = RevocationTable::new(Duration::from_secs(60 * 60 * 24), 1 << 20);
        table.add_revoked_ca_key(
            [0xa0, 0, 0, 0, 3],
            0x08,
            "key compromise".to_string(),
            Some("2025-01-01".to_string()),
        );
        let status = table.check_ca_key_revocation([0xa0, 0, 0, 0, 3], 0x08, false);
        assert_eq!(
            status,
            RevocationStatus::Revoked {
                reason: "key compromise".to_string(),
                date: "2025-01-01".to_string(),
            }
        );
    }

    #[test]
    fn online_check_without_fetcher_configured_and_no_data_is_unknown() {
        let table = RevocationTable::new(Duration::from_secs(60 * 60 * 24), 1 << 20);
        let status = table.check_ca_key_revocation([0xa0, 0, 0, 0, 3], 0x08, true);
        assert_eq!(status, RevocationStatus::Unknown);
    }

    #[test]
    fn parse_crl_rejects_wrong_length_rid() {
        let text = "a0000000030000030000:08:COMPROMISED:2025-01-01\n# comment\n\n";
        let err = parse_crl(text).unwrap_err();
        assert!(matches!(err, EngineError::Protocol(_)));
    }

    #[test]
    fn parse_crl_accepts_correct_rid_length() {
        let text = "a000000003:08:COMPROMISED:2025-01-01";
        let parsed = parse_crl(text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].0, [0xa0, 0x00, 0x00, 0x00, 0x03]);
        assert_eq!(parsed[0].1, 0x08);
        assert_eq!(parsed[0].2, "COMPROMISED");
    }
}
