// Equity Allocation Engine - the two cohort formulas
//
// Pure arithmetic over counts and amounts already read from the ledger; no
// I/O here so both formulas are testable against fixed numbers. Degenerate
// inputs (empty pool, empty fund) return 0 by contract - they are defined
// outcomes, never errors.

/// Fixed per-period contribution value, in pool currency. Shared between the
/// buy-in price and new-member dilution so the two stay consistent; it is
/// deliberately not configurable.
pub const MONTHLY_UNIT: f64 = 500.0;

/// Share of a legacy (`fullShare`) member: their tenure over the combined
/// tenure of the full-share pool.
///
/// * `months_paid` - this member's contribution count
/// * `total_shares` - sum of contribution counts across all fullShare members
/// * `total_months` - max contribution count across ALL active members;
///   a zero-guard only, never a denominator
///
/// Returns an unrounded percentage. 0 when either pool total is zero (no
/// legacy pool exists, or nobody has contributed yet).
pub fn full_share_percentage(months_paid: u32, total_shares: u32, total_months: u32) -> f64 {
    if total_shares == 0 || total_months == 0 {
        return 0.0;
    }
    (months_paid as f64 / total_shares as f64) * 100.0
}

/// Share of an admitted (`newMember`) member: their unit-normalized tenure
/// against the historical fund as of their admission date.
///
/// * `months_paid` - this member's own contribution count
/// * `previous_total` - sum of ALL contribution amounts dated strictly
///   before this member's admission timestamp
/// * `new_month_total` - sum of this member's own contribution amounts
///
/// The numerator is `MONTHLY_UNIT * months_paid`, not the raw amount paid.
/// Returns 0 when the combined fund is zero.
///
/// Known inconsistency, kept on purpose: `previous_total` ignores other
/// new members admitted in the same window, so each new member is diluted
/// only against the legacy pool plus their own money. The percentages
/// across the whole membership therefore need not sum to 100. Open product
/// question; do not change without sign-off.
pub fn new_member_percentage(months_paid: u32, previous_total: f64, new_month_total: f64) -> f64 {
    let member_contribution = MONTHLY_UNIT * months_paid as f64;
    let total_fund = previous_total + new_month_total;
    if total_fund == 0.0 {
        return 0.0;
    }
    (member_contribution / total_fund) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.01,
            "expected {} got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_full_share_six_of_twenty() {
        assert_eq!(full_share_percentage(6, 20, 6), 30.0);
    }

    #[test]
    fn test_full_share_half_of_pool() {
        assert_eq!(full_share_percentage(10, 20, 10), 50.0);
    }

    #[test]
    fn test_full_share_sole_member() {
        assert_eq!(full_share_percentage(12, 12, 12), 100.0);
    }

    #[test]
    fn test_full_share_zero_months_paid() {
        // Falls out of the arithmetic, not a special case
        assert_eq!(full_share_percentage(0, 20, 6), 0.0);
    }

    #[test]
    fn test_full_share_empty_pool() {
        assert_eq!(full_share_percentage(6, 0, 6), 0.0);
    }

    #[test]
    fn test_full_share_zero_total_months_guard() {
        assert_eq!(full_share_percentage(6, 20, 0), 0.0);
    }

    #[test]
    fn test_full_share_monotonic_in_tenure() {
        let mut previous = -1.0;
        for months in 0..=20 {
            let share = full_share_percentage(months, 20, 20);
            assert!(share > previous, "share must grow with tenure");
            previous = share;
        }
    }

    #[test]
    fn test_new_member_diluted_against_large_fund() {
        // 1500 of unit-credit against a 61500 fund
        assert_close(new_member_percentage(3, 60000.0, 1500.0), 2.439);
    }

    #[test]
    fn test_new_member_two_months() {
        assert_close(new_member_percentage(2, 60000.0, 1000.0), 1.639);
    }

    #[test]
    fn test_new_member_first_and_only_contributor() {
        // 500 * 6 over a fund of exactly 3000
        assert_eq!(new_member_percentage(6, 0.0, 3000.0), 100.0);
    }

    #[test]
    fn test_new_member_zero_months_paid() {
        assert_eq!(new_member_percentage(0, 60000.0, 1500.0), 0.0);
    }

    #[test]
    fn test_new_member_empty_fund() {
        assert_eq!(new_member_percentage(3, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_shares_never_negative() {
        assert!(full_share_percentage(0, 0, 0) >= 0.0);
        assert!(new_member_percentage(0, 0.0, 0.0) >= 0.0);
        assert!(full_share_percentage(1, 100, 100) >= 0.0);
        assert!(new_member_percentage(1, 100000.0, 500.0) >= 0.0);
    }

    #[test]
    fn test_full_share_bounded_by_hundred() {
        // monthsPaid can never exceed totalShares for a fullShare member,
        // so the legacy formula is bounded by construction
        for months in 0..=12 {
            assert!(full_share_percentage(months, 12, 12) <= 100.0);
        }
    }
}
