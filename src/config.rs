//! Terminal / SoftPOS policy configuration.
//!
//! Grounded on `zedseven-pemv`'s `config/mod.rs`: defaults are layered with
//! an optional TOML file and environment variable overrides via `figment`.
//! None of this reaches out to an external secrets system — it is the
//! ambient policy knob-set the kernel and risk-management steps in spec
//! §4.6/§4.7 treat as given (floor limits, CVM thresholds, timeouts, the
//! per-brand action codes).

use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::{Error as FigmentError, Figment};
use serde::{Deserialize, Serialize};

const FILE_NAME: &str = "softpos_emv.toml";
const ENV_PREFIX: &str = "SOFTPOS_EMV_";

/// Issuer/terminal action codes for one brand, each the 5-byte bitmask
/// format described in spec §4.7 step 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCodes {
    pub denial: [u8; 5],
    pub online: [u8; 5],
    pub default: [u8; 5],
}

impl Default for ActionCodes {
    fn default() -> Self {
        // Conservative defaults: never unconditionally decline offline,
        // always prefer sending the transaction online when any TVR bit is
        // set, matching common SoftPOS issuer profiles.
        ActionCodes {
            denial: [0x00; 5],
            online: [0xff; 5],
            default: [0xff; 5],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub terminal_floor_limit_cents: u64,
    pub contactless_transaction_limit_cents: u64,
    pub contactless_cvm_required_limit_cents: u64,
    pub random_selection_percentage: u8,

    pub wait_for_card_timeout_ms: u64,
    pub per_command_timeout_ms: u64,
    pub overall_timeout_ms: u64,
    pub online_response_timeout_ms: u64,

    pub max_try_again_attempts: u8,

    pub crl_byte_cap: usize,
    pub crl_refresh_interval_secs: u64,
    pub crl_tls_validation_enabled: bool,

    pub action_codes: ActionCodes,

    /// SoftPOS-specific policy: force every approvable transaction online
    /// regardless of terminal action analysis (spec §4.7 step 9).
    pub force_online: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            terminal_floor_limit_cents: 0,
            contactless_transaction_limit_cents: 10_000_00,
            contactless_cvm_required_limit_cents: 5_000,
            random_selection_percentage: 0,

            wait_for_card_timeout_ms: 60_000,
            per_command_timeout_ms: 3_000,
            overall_timeout_ms: 30_000,
            online_response_timeout_ms: 45_000,

            max_try_again_attempts: 3,

            crl_byte_cap: 1024 * 1024,
            crl_refresh_interval_secs: 24 * 60 * 60,
            crl_tls_validation_enabled: true,

            action_codes: ActionCodes::default(),
            force_online: true,
        }
    }
}

impl Config {
    pub fn wait_for_card_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_for_card_timeout_ms)
    }

    pub fn per_command_timeout(&self) -> Duration {
        Duration::from_millis(self.per_command_timeout_ms)
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_millis(self.overall_timeout_ms)
    }

    pub fn online_response_timeout(&self) -> Duration {
        Duration::from_millis(self.online_response_timeout_ms)
    }

    /// Builds the default layered provider: defaults -> `softpos_emv.toml` ->
    /// `SOFTPOS_EMV_*` environment variables.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(FILE_NAME).nested())
            .merge(Env::prefixed(ENV_PREFIX).global())
    }

    pub fn load() -> Result<Config, FigmentError> {
        Self::figment().extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_timeouts() {
        let cfg = Config::default();
        assert_eq!(cfg.wait_for_card_timeout(), Duration::from_secs(60));
        assert_eq!(cfg.per_command_timeout(), Duration::from_secs(3));
        assert_eq!(cfg.overall_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.online_response_timeout(), Duration::from_secs(45));
        assert_eq!(cfg.max_try_again_attempts, 3);
        assert_eq!(cfg.crl_byte_cap, 1024 * 1024);
    }
}
