//! UnionPay QuickPass kernel divergences (spec §4.7): the Electronic Cash
//! balance check against the card's single-transaction and cumulative
//! offline limits. RID `A000000333`.

pub const RID: [u8; 5] = [0xa0, 0x00, 0x00, 0x03, 0x33];

pub const TAG_ELECTRONIC_CASH_SINGLE_LIMIT: u32 = 0x9f79;
pub const TAG_ELECTRONIC_CASH_TOTAL_LIMIT: u32 = 0x9f77;
pub const TAG_ELECTRONIC_CASH_TOTAL_AMOUNT: u32 = 0x9f78;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceCheckResult {
    /// Below both the single-transaction limit and the cumulative limit;
    /// an offline TC is permissible as far as Electronic Cash is
    /// concerned.
    Sufficient,
    /// Exceeds the single-transaction limit on its own.
    ExceedsSingleLimit,
    /// Within the single-transaction limit but would push the running
    /// total over the cumulative limit.
    ExceedsTotalLimit,
}

/// Electronic Cash balance check (spec §4.7 UnionPay divergence): the
/// card carries its own single-transaction and cumulative offline
/// spending limits in tags `9F79`/`9F77`, with the running total in
/// `9F78`; the terminal must respect both before allowing an offline TC.
pub fn check_electronic_cash_balance(
    amount: u64,
    single_limit: Option<u64>,
    total_limit: Option<u64>,
    current_total: Option<u64>,
) -> BalanceCheckResult {
    if let Some(limit) = single_limit {
        if amount > limit {
            return BalanceCheckResult::ExceedsSingleLimit;
        }
    }
    if let (Some(limit), Some(total)) = (total_limit, current_total) {
        if total.saturating_add(amount) > limit {
            return BalanceCheckResult::ExceedsTotalLimit;
        }
    }
    BalanceCheckResult::Sufficient
}

/// True when the Electronic Cash balance check alone would permit an
/// offline TC; terminal action analysis and offline data authentication
/// still apply on top of this.
pub fn offline_tc_permissible(result: BalanceCheckResult) -> bool {
    result == BalanceCheckResult::Sufficient
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sufficient_when_within_both_limits() {
        let result = check_electronic_cash_balance(1_000, Some(5_000), Some(50_000), Some(10_000));
        assert_eq!(result, BalanceCheckResult::Sufficient);
        assert!(offline_tc_permissible(result));
    }

    #[test]
    fn exceeds_single_limit_takes_priority() {
        let result = check_electronic_cash_balance(6_000, Some(5_000), Some(50_000), Some(0));
        assert_eq!(result, BalanceCheckResult::ExceedsSingleLimit);
    }

    #[test]
    fn exceeds_cumulative_limit_when_running_total_pushed_over() {
        let result = check_electronic_cash_balance(1_000, Some(5_000), Some(10_000), Some(9_500));
        assert_eq!(result, BalanceCheckResult::ExceedsTotalLimit);
        assert!(!offline_tc_permissible(result));
    }

    #[test]
    fn missing_limits_default_to_sufficient() {
        assert_eq!(
            check_electronic_cash_balance(1_000_000, None, None, None),
            BalanceCheckResult::Sufficient
        );
    }
}
