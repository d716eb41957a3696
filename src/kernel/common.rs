//! Terminal data construction, CVM selection, terminal risk management
//! and terminal action analysis shared by every brand kernel (spec §4.7
//! steps 1, 6, 7, 8, 9).

use chrono::NaiveDate;

use crate::config::ActionCodes;
use crate::tlv::store::TagStore;
use crate::tlv::tvr::Tvr;

pub mod tags {
    pub const AMOUNT_AUTHORIZED: u32 = 0x9f02;
    pub const AMOUNT_OTHER: u32 = 0x9f03;
    pub const TERMINAL_COUNTRY_CODE: u32 = 0x9f1a;
    pub const TRANSACTION_CURRENCY_CODE: u32 = 0x5f2a;
    pub const TRANSACTION_TYPE: u32 = 0x9c;
    pub const TRANSACTION_DATE: u32 = 0x9a;
    pub const TRANSACTION_TIME: u32 = 0x9f21;
    pub const UNPREDICTABLE_NUMBER: u32 = 0x9f37;
    pub const TERMINAL_TYPE: u32 = 0x9f35;
    pub const TERMINAL_CAPABILITIES: u32 = 0x9f33;
    pub const APPLICATION_VERSION_NUMBER_TERMINAL: u32 = 0x9f09;
}

#[derive(Debug, Clone)]
pub struct TerminalTransactionInputs {
    pub amount_authorized: [u8; 6],
    pub amount_other: [u8; 6],
    pub transaction_type: u8,
    pub transaction_date: [u8; 3],
    pub transaction_time: [u8; 3],
    pub unpredictable_number: [u8; 4],
    pub terminal_country_code: [u8; 2],
    pub transaction_currency_code: [u8; 2],
    pub terminal_type: u8,
    pub terminal_capabilities: [u8; 3],
}

/// Builds the brand-agnostic part of the terminal data store (spec §4.7
/// step 1); each brand kernel adds its own qualifier tags (TTQ, TIP,
/// Enhanced Contactless Reader Capabilities, ...) on top.
pub fn build_terminal_data(inputs: &TerminalTransactionInputs) -> TagStore {
    let mut store = TagStore::new();
    store.insert(tags::AMOUNT_AUTHORIZED, inputs.amount_authorized.to_vec());
    store.insert(tags::AMOUNT_OTHER, inputs.amount_other.to_vec());
    store.insert(tags::TRANSACTION_TYPE, vec![inputs.transaction_type]);
    store.insert(tags::TRANSACTION_DATE, inputs.transaction_date.to_vec());
    store.insert(tags::TRANSACTION_TIME, inputs.transaction_time.to_vec());
    store.insert(
        tags::UNPREDICTABLE_NUMBER,
        inputs.unpredictable_number.to_vec(),
    );
    store.insert(
        tags::TERMINAL_COUNTRY_CODE,
        inputs.terminal_country_code.to_vec(),
    );
    store.insert(
        tags::TRANSACTION_CURRENCY_CODE,
        inputs.transaction_currency_code.to_vec(),
    );
    store.insert(tags::TERMINAL_TYPE, vec![inputs.terminal_type]);
    store.insert(
        tags::TERMINAL_CAPABILITIES,
        inputs.terminal_capabilities.to_vec(),
    );
    store
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvmMethod {
    NoCvm,
    OnlinePin,
    Signature,
    CardholderDeviceCvm,
}

/// CVM selection (spec §4.7 step 7): cardholder-device CVM takes
/// precedence when the card or reader signals it; otherwise applies the
/// amount-threshold rule.
pub fn select_cvm(
    cdcvm_signaled: bool,
    amount: u64,
    cvm_required_limit: u64,
    online_pin_supported: bool,
) -> CvmMethod {
    if cdcvm_signaled {
        CvmMethod::CardholderDeviceCvm
    } else if amount <= cvm_required_limit {
        CvmMethod::NoCvm
    } else if online_pin_supported {
        CvmMethod::OnlinePin
    } else {
        CvmMethod::Signature
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RiskManagementInputs {
    pub amount: u64,
    pub floor_limit: u64,
    pub contactless_transaction_limit: u64,
    /// A terminal-supplied random draw in `0..100`, compared against the
    /// configured random-selection percentage.
    pub random_draw_0_99: u8,
    pub random_selection_percent: u8,
}

/// Terminal risk management (spec §4.7 step 8): every failure sets a TVR
/// bit, never aborts by itself.
pub fn terminal_risk_management(inputs: &RiskManagementInputs, tvr: &mut Tvr) {
    if inputs.amount > inputs.floor_limit {
        tvr.set_exceeds_floor_limit();
    }
    if inputs.amount > inputs.contactless_transaction_limit {
        tvr.set_ucol_exceeded();
    }
    if inputs.random_draw_0_99 < inputs.random_selection_percent {
        tvr.set_random_online_selected();
    }
}

/// Processing restrictions (spec §4.7 step 6).
pub fn processing_restrictions(
    terminal_app_version: Option<[u8; 2]>,
    card_app_version: Option<[u8; 2]>,
    expiry: Option<NaiveDate>,
    effective_date: Option<NaiveDate>,
    today: NaiveDate,
    tvr: &mut Tvr,
) {
    if let (Some(terminal), Some(card)) = (terminal_app_version, card_app_version) {
        if terminal != card {
            tvr.set_app_version_mismatch();
        }
    }
    if let Some(expiry) = expiry {
        if today > expiry {
            tvr.set_expired_application();
        }
    }
    if let Some(effective_date) = effective_date {
        if today < effective_date {
            tvr.set_not_yet_effective();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalDecision {
    Aac,
    Tc,
    Arqc,
}

/// Terminal action analysis (spec §4.7 step 9): denial action codes win
/// outright; online action codes or an unconditional SoftPOS online
/// policy request an ARQC; the default action codes fall back to ARQC
/// only when the terminal is online-capable.
pub fn terminal_action_analysis(
    tvr: &Tvr,
    action_codes: &ActionCodes,
    force_online: bool,
    online_capable: bool,
) -> TerminalDecision {
    if tvr.matches_action_code(&action_codes.denial) {
        return TerminalDecision::Aac;
    }
    if tvr.matches_action_code(&action_codes.online) {
        return TerminalDecision::Arqc;
    }
    if tvr.matches_action_code(&action_codes.default) {
        return if online_capable {
            TerminalDecision::Arqc
        } else {
            TerminalDecision::Aac
        };
    }
    if force_online {
        TerminalDecision::Arqc
    } else {
        TerminalDecision::Tc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdcvm_always_wins() {
        assert_eq!(select_cvm(true, 100_00, 0, true), CvmMethod::CardholderDeviceCvm);
    }

    #[test]
    fn under_threshold_needs_no_cvm() {
        assert_eq!(select_cvm(false, 10_00, 20_00, true), CvmMethod::NoCvm);
    }

    #[test]
    fn over_threshold_prefers_online_pin() {
        assert_eq!(select_cvm(false, 30_00, 20_00, true), CvmMethod::OnlinePin);
    }

    #[test]
    fn over_threshold_without_online_pin_falls_back_to_signature() {
        assert_eq!(select_cvm(false, 30_00, 20_00, false), CvmMethod::Signature);
    }

    #[test]
    fn risk_management_sets_expected_bits() {
        let inputs = RiskManagementInputs {
            amount: 100_00,
            floor_limit: 50_00,
            contactless_transaction_limit: 75_00,
            random_draw_0_99: 0,
            random_selection_percent: 10,
        };
        let mut tvr = Tvr::new();
        terminal_risk_management(&inputs, &mut tvr);
        assert!(tvr.exceeds_floor_limit());
        assert!(tvr.ucol_exceeded());
        assert!(tvr.random_online_selected());
    }

    #[test]
    fn taa_denial_wins_over_everything() {
        let mut tvr = Tvr::new();
        tvr.set_card_on_exception_file();
        let codes = ActionCodes {
            denial: [0, 0, 0x10, 0, 0],
            online: [0xff; 5],
            default: [0xff; 5],
        };
        assert_eq!(
            terminal_action_analysis(&tvr, &codes, true, true),
            TerminalDecision::Aac
        );
    }

    #[test]
    fn taa_defaults_to_tc_when_nothing_matches_and_not_forced() {
        let tvr = Tvr::new();
        let codes = ActionCodes {
            denial: [0; 5],
            online: [0; 5],
            default: [0; 5],
        };
        assert_eq!(
            terminal_action_analysis(&tvr, &codes, false, true),
            TerminalDecision::Tc
        );
    }
}
