// Upfront Buy-In Calculator
//
// A fullShare member joining late must catch up to the longest-standing
// member's tenure by pre-paying that many periods at MONTHLY_UNIT, so their
// eventual proportional share is not inflated relative to members who paid
// in over time.

use anyhow::Result;

use crate::allocation::MONTHLY_UNIT;
use crate::ledger::LedgerRead;

/// One-time admission price for a new `fullShare` member.
///
/// With no existing active members the price is exactly one unit (covers the
/// first admitted member). Otherwise it is `MONTHLY_UNIT * maxTenure` where
/// maxTenure is the highest contribution count among active members - which
/// is 0, and so is the price, if members exist but nobody has paid yet.
///
/// Pure read of the ledger; writes nothing.
pub fn full_share_upfront_payment(ledger: &impl LedgerRead) -> Result<f64> {
    let members = ledger.active_members()?;

    if members.is_empty() {
        return Ok(MONTHLY_UNIT);
    }

    let max_months = members.iter().map(|m| m.months_paid()).max().unwrap_or(0);

    Ok(MONTHLY_UNIT * max_months as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemberRecord;
    use crate::member::{Contribution, Member, PaymentChannel, ShareType};
    use chrono::{DateTime, Utc};

    /// Vec-backed ledger fixture
    struct FixtureLedger(Vec<MemberRecord>);

    impl LedgerRead for FixtureLedger {
        fn active_members(&self) -> Result<Vec<MemberRecord>> {
            Ok(self.0.clone())
        }

        fn total_paid_before(&self, cutoff: DateTime<Utc>) -> Result<f64> {
            Ok(self
                .0
                .iter()
                .flat_map(|m| &m.contributions)
                .filter(|c| c.date < cutoff)
                .map(|c| c.amount)
                .sum())
        }
    }

    fn record_with_months(membership_id: &str, months: u32) -> MemberRecord {
        let member = Member::new(membership_id, "Test Member", ShareType::FullShare);
        let contributions = (0..months)
            .map(|_| Contribution::new(membership_id, 500.0, Utc::now(), PaymentChannel::Bank, None))
            .collect();
        MemberRecord {
            member,
            contributions,
        }
    }

    #[test]
    fn test_first_member_pays_one_unit() {
        let ledger = FixtureLedger(vec![]);
        assert_eq!(full_share_upfront_payment(&ledger).unwrap(), 500.0);
    }

    #[test]
    fn test_buy_in_matches_longest_tenure() {
        let ledger = FixtureLedger(vec![
            record_with_months("M-001", 6),
            record_with_months("M-002", 12),
            record_with_months("M-003", 3),
        ]);
        assert_eq!(full_share_upfront_payment(&ledger).unwrap(), 500.0 * 12.0);
    }

    #[test]
    fn test_members_exist_but_unpaid() {
        // Existing members with zero contributions price the buy-in at zero;
        // only a fully empty pool falls back to one unit
        let ledger = FixtureLedger(vec![record_with_months("M-001", 0)]);
        assert_eq!(full_share_upfront_payment(&ledger).unwrap(), 0.0);
    }
}
