// Ledger read interface
//
// The allocation engine, buy-in calculator, and report assembler depend on
// this trait rather than on the SQLite store directly, so the arithmetic
// stays testable against in-memory fixtures. The store in `db` is the one
// production implementation.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::member::{Contribution, Member};

/// One active member together with their contributions, ordered by date
/// ascending. The ordering is significant: "months paid" is the row count
/// of that list, whatever the amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecord {
    pub member: Member,
    pub contributions: Vec<Contribution>,
}

impl MemberRecord {
    /// Tenure: count of contribution rows. A contribution of any size
    /// counts as one month.
    pub fn months_paid(&self) -> u32 {
        self.contributions.len() as u32
    }

    /// Total paid-in capital for this member.
    pub fn total_paid(&self) -> f64 {
        self.contributions.iter().map(|c| c.amount).sum()
    }
}

/// Read-side contract the ledger store must provide. Every call is an
/// independent read; implementations are not required to take a consistent
/// snapshot across calls (see DESIGN.md on report consistency).
pub trait LedgerRead {
    /// All active (non-deleted) members with their contributions ordered by
    /// date ascending, in a stable member order.
    fn active_members(&self) -> Result<Vec<MemberRecord>>;

    /// Sum of contribution amounts dated strictly before `cutoff`, across
    /// ALL members. Used to establish the historical fund a new member is
    /// diluted against.
    fn total_paid_before(&self, cutoff: DateTime<Utc>) -> Result<f64>;
}
