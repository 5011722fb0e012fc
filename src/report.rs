// Share Report Assembler
//
// Walks the full active membership once and produces one ShareCalculation
// per member, branching on the cohort tag. Derived data only: a report is a
// pure function of the ledger snapshot and is never persisted.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::allocation::{full_share_percentage, new_member_percentage};
use crate::ledger::LedgerRead;
use crate::member::ShareType;

/// Per-member result of one allocation run. Computed fresh on every report
/// request, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareCalculation {
    #[serde(rename = "membershipId")]
    pub membership_id: String,
    pub name: String,
    #[serde(rename = "shareType")]
    pub share_type: ShareType,
    #[serde(rename = "totalPaid")]
    pub total_paid: f64,
    #[serde(rename = "monthsPaid")]
    pub months_paid: u32,
    #[serde(rename = "sharePercentage")]
    pub share_percentage: f64,
}

/// What the reporting caller receives: the per-member rows plus the sum of
/// their percentages. The sum is informational only - with more than one
/// newMember admitted in overlapping windows it is not guaranteed to be 100
/// (see `new_member_percentage`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareReport {
    pub calculations: Vec<ShareCalculation>,
    #[serde(rename = "totalShares")]
    pub total_percentage: f64,
}

/// Compute the share of every active member.
///
/// Empty membership returns an empty list. Output order follows the
/// member order the ledger returns; no sorting by share. Any ledger read
/// failure aborts the whole report - no partial results.
pub fn calculate_all_shares(ledger: &impl LedgerRead) -> Result<Vec<ShareCalculation>> {
    let members = ledger.active_members()?;

    if members.is_empty() {
        return Ok(Vec::new());
    }

    // Pool-wide aggregates for the legacy formula: combined fullShare
    // tenure, and the longest tenure overall (zero-guard only).
    let total_shares: u32 = members
        .iter()
        .filter(|m| m.member.share_type == ShareType::FullShare)
        .map(|m| m.months_paid())
        .sum();

    let total_months: u32 = members.iter().map(|m| m.months_paid()).max().unwrap_or(0);

    let mut calculations = Vec::with_capacity(members.len());

    for record in &members {
        let months_paid = record.months_paid();
        let total_paid = record.total_paid();

        let share_percentage = match record.member.share_type {
            ShareType::FullShare => {
                full_share_percentage(months_paid, total_shares, total_months)
            }
            ShareType::NewMember => {
                // Historical fund as of this member's admission. Recomputed
                // per member; deliberately blind to other new members
                // admitted in the same window.
                let previous_total = ledger.total_paid_before(record.member.joined_at)?;
                new_member_percentage(months_paid, previous_total, total_paid)
            }
        };

        calculations.push(ShareCalculation {
            membership_id: record.member.membership_id.clone(),
            name: record.member.name.clone(),
            share_type: record.member.share_type,
            total_paid,
            months_paid,
            share_percentage,
        });
    }

    Ok(calculations)
}

/// Full report for the caller: rows plus the informational percentage sum.
pub fn assemble_report(ledger: &impl LedgerRead) -> Result<ShareReport> {
    let calculations = calculate_all_shares(ledger)?;
    let total_percentage = calculations.iter().map(|c| c.share_percentage).sum();

    Ok(ShareReport {
        calculations,
        total_percentage,
    })
}
