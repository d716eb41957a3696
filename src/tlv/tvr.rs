//! Terminal Verification Results (spec §3), modelled as a raw 5-byte
//! bitfield with named setters — grounded on the bit-layout style of
//! `zedseven-pemv`'s `emv/unit_values/tvr.rs`, but kept mutable (accumulated
//! during a transaction) instead of parsed once from a fixed byte string.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tvr(pub [u8; 5]);

macro_rules! tvr_bit {
    ($get:ident, $set:ident, $byte:expr, $mask:expr) => {
        pub fn $get(&self) -> bool {
            self.0[$byte] & $mask != 0
        }

        pub fn $set(&mut self) {
            self.set_bit($byte, $mask);
        }
    };
}

impl Tvr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a single bit. Idempotent and leaves every other bit untouched —
    /// the spec §8 invariant.
    pub fn set_bit(&mut self, byte_index: usize, mask: u8) {
        self.0[byte_index] |= mask;
    }

    pub fn get_bit(&self, byte_index: usize, mask: u8) -> bool {
        self.0[byte_index] & mask != 0
    }

    pub fn as_bytes(&self) -> [u8; 5] {
        self.0
    }

    /// `matches_action_code(tvr, ac) = exists i. tvr[i] & ac[i] != 0`
    pub fn matches_action_code(&self, action_code: &[u8; 5]) -> bool {
        self.0.iter().zip(action_code.iter()).any(|(t, a)| t & a != 0)
    }

    // Byte 1
    tvr_bit!(
        offline_data_authentication_not_performed,
        set_offline_data_authentication_not_performed,
        0,
        0b1000_0000
    );
    tvr_bit!(sda_failed, set_sda_failed, 0, 0b0100_0000);
    tvr_bit!(icc_data_missing, set_icc_data_missing, 0, 0b0010_0000);
    tvr_bit!(
        card_on_exception_file,
        set_card_on_exception_file,
        0,
        0b0001_0000
    );
    tvr_bit!(dda_failed, set_dda_failed, 0, 0b0000_1000);
    tvr_bit!(cda_failed, set_cda_failed, 0, 0b0000_0100);

    // Byte 2
    tvr_bit!(
        app_version_mismatch,
        set_app_version_mismatch,
        1,
        0b1000_0000
    );
    tvr_bit!(expired_application, set_expired_application, 1, 0b0100_0000);
    tvr_bit!(
        not_yet_effective,
        set_not_yet_effective,
        1,
        0b0010_0000
    );
    tvr_bit!(
        service_not_allowed,
        set_service_not_allowed,
        1,
        0b0001_0000
    );
    tvr_bit!(new_card, set_new_card, 1, 0b0000_1000);

    // Byte 3
    tvr_bit!(
        cvm_not_successful,
        set_cvm_not_successful,
        2,
        0b1000_0000
    );
    tvr_bit!(unrecognised_cvm, set_unrecognised_cvm, 2, 0b0100_0000);
    tvr_bit!(
        pin_try_limit_exceeded,
        set_pin_try_limit_exceeded,
        2,
        0b0010_0000
    );
    tvr_bit!(pin_pad_issue, set_pin_pad_issue, 2, 0b0001_0000);
    tvr_bit!(online_pin_entered, set_online_pin_entered, 2, 0b0000_0100);

    // Byte 4
    tvr_bit!(
        exceeds_floor_limit,
        set_exceeds_floor_limit,
        3,
        0b1000_0000
    );
    tvr_bit!(lcol_exceeded, set_lcol_exceeded, 3, 0b0100_0000);
    tvr_bit!(ucol_exceeded, set_ucol_exceeded, 3, 0b0010_0000);
    tvr_bit!(random_online_selected, set_random_online_selected, 3, 0b0001_0000);
    tvr_bit!(
        merchant_forced_online,
        set_merchant_forced_online,
        3,
        0b0000_1000
    );

    // Byte 5
    tvr_bit!(default_tdol_used, set_default_tdol_used, 4, 0b1000_0000);
    tvr_bit!(
        issuer_auth_failed,
        set_issuer_auth_failed,
        4,
        0b0100_0000
    );
    tvr_bit!(
        script_failed_pre_ac,
        set_script_failed_pre_ac,
        4,
        0b0010_0000
    );
    tvr_bit!(
        script_failed_post_ac,
        set_script_failed_post_ac,
        4,
        0b0001_0000
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_all_zero() {
        assert_eq!(Tvr::new().as_bytes(), [0u8; 5]);
    }

    #[test]
    fn setting_bit_is_idempotent_and_isolated() {
        let mut tvr = Tvr::new();
        tvr.set_expired_application();
        let after_first = tvr.as_bytes();
        tvr.set_expired_application();
        assert_eq!(tvr.as_bytes(), after_first);
        assert!(tvr.expired_application());
        assert!(!tvr.sda_failed());
    }

    #[test]
    fn matches_action_code_on_overlap() {
        let mut tvr = Tvr::new();
        tvr.set_expired_application();
        let mut ac = [0u8; 5];
        ac[1] = 0b0100_0000;
        assert!(tvr.matches_action_code(&ac));
        assert!(!tvr.matches_action_code(&[0u8; 5]));
    }
}
