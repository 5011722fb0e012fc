// Member and Contribution entities
//
// A member is created once, never hard-deleted (soft flag only), and its
// cohort tag is immutable after creation. Contributions are append-only:
// edits change amount/date/channel in place but never reassign ownership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transaction-number marker on the administrative buy-in contribution
/// written during full-share admission. Distinguishes it from ordinary
/// member-initiated payments.
pub const INITIAL_FULL_SHARE: &str = "INITIAL-FULL-SHARE";

// ============================================================================
// SHARE TYPE (cohort tag)
// ============================================================================

/// Cohort a member was admitted into. Decides which allocation formula
/// applies; immutable for the lifetime of the member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareType {
    /// Original proportional pool: share is tenure over the pool's
    /// combined tenure.
    #[serde(rename = "fullShare")]
    FullShare,

    /// Admitted after the pool was already contributing: share is diluted
    /// against historical capital as of the admission date.
    #[serde(rename = "newMember")]
    NewMember,
}

impl ShareType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareType::FullShare => "fullShare",
            ShareType::NewMember => "newMember",
        }
    }

    /// Decode a stored tag. Unknown or missing tags fall back to
    /// `NewMember`: the cohort set is closed, and no write path produces
    /// any other tag, so a stray value can only come from a hand-edited
    /// database. Such a row is both reported and computed as a new member
    /// (see DESIGN.md on unknown cohort tags).
    pub fn from_tag(tag: &str) -> ShareType {
        match tag {
            "fullShare" => ShareType::FullShare,
            _ => ShareType::NewMember,
        }
    }
}

// ============================================================================
// PAYMENT CHANNEL
// ============================================================================

/// Channel a contribution arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentChannel {
    #[serde(rename = "bKash")]
    Bkash,
    #[serde(rename = "Nagad")]
    Nagad,
    #[serde(rename = "Bank")]
    Bank,
}

impl PaymentChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentChannel::Bkash => "bKash",
            PaymentChannel::Nagad => "Nagad",
            PaymentChannel::Bank => "Bank",
        }
    }

    pub fn from_tag(tag: &str) -> Option<PaymentChannel> {
        match tag {
            "bKash" => Some(PaymentChannel::Bkash),
            "Nagad" => Some(PaymentChannel::Nagad),
            "Bank" => Some(PaymentChannel::Bank),
            _ => None,
        }
    }
}

// ============================================================================
// MEMBER
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Stable internal identity (UUID) - never changes.
    pub id: String,

    /// Public membership number, unique across the pool.
    pub membership_id: String,

    pub name: String,

    /// Profile fields carried for reporting, no computational role.
    pub father_name: Option<String>,
    pub mobile: Option<String>,

    /// Cohort tag, fixed at admission.
    pub share_type: ShareType,

    /// Admission timestamp. The dilution formula sums all contributions
    /// dated strictly before this instant.
    pub joined_at: DateTime<Utc>,

    /// Soft-delete flag; deleted members are excluded from every
    /// allocation computation but their rows are never removed.
    pub is_deleted: bool,
}

impl Member {
    pub fn new(membership_id: &str, name: &str, share_type: ShareType) -> Self {
        Member {
            id: uuid::Uuid::new_v4().to_string(),
            membership_id: membership_id.to_string(),
            name: name.to_string(),
            father_name: None,
            mobile: None,
            share_type,
            joined_at: Utc::now(),
            is_deleted: false,
        }
    }
}

// ============================================================================
// CONTRIBUTION (ledger entry)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    /// Stable identity (UUID).
    pub id: String,

    /// Owning member. Never reassigned once written.
    pub membership_id: String,

    pub amount: f64,

    pub date: DateTime<Utc>,

    pub channel: PaymentChannel,

    /// Free-form transaction reference; `INITIAL-FULL-SHARE` on the
    /// admission buy-in row.
    pub transaction_number: Option<String>,
}

impl Contribution {
    pub fn new(
        membership_id: &str,
        amount: f64,
        date: DateTime<Utc>,
        channel: PaymentChannel,
        transaction_number: Option<String>,
    ) -> Self {
        Contribution {
            id: uuid::Uuid::new_v4().to_string(),
            membership_id: membership_id.to_string(),
            amount,
            date,
            channel,
            transaction_number,
        }
    }

    /// True if this row is the administrative buy-in written at admission
    /// rather than a member-initiated payment.
    pub fn is_initial_buy_in(&self) -> bool {
        self.transaction_number.as_deref() == Some(INITIAL_FULL_SHARE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_type_round_trip() {
        assert_eq!(ShareType::from_tag("fullShare"), ShareType::FullShare);
        assert_eq!(ShareType::from_tag("newMember"), ShareType::NewMember);
        assert_eq!(ShareType::FullShare.as_str(), "fullShare");
        assert_eq!(ShareType::NewMember.as_str(), "newMember");
    }

    #[test]
    fn test_unknown_share_tag_defaults_to_new_member() {
        // Untagged legacy rows are treated as newMember, not rejected
        assert_eq!(ShareType::from_tag(""), ShareType::NewMember);
        assert_eq!(ShareType::from_tag("partial"), ShareType::NewMember);
    }

    #[test]
    fn test_payment_channel_tags() {
        assert_eq!(PaymentChannel::from_tag("bKash"), Some(PaymentChannel::Bkash));
        assert_eq!(PaymentChannel::from_tag("Nagad"), Some(PaymentChannel::Nagad));
        assert_eq!(PaymentChannel::from_tag("Bank"), Some(PaymentChannel::Bank));
        assert_eq!(PaymentChannel::from_tag("Cash"), None);
    }

    #[test]
    fn test_initial_buy_in_marker() {
        let buy_in = Contribution::new(
            "M-001",
            3000.0,
            Utc::now(),
            PaymentChannel::Bank,
            Some(INITIAL_FULL_SHARE.to_string()),
        );
        let ordinary = Contribution::new("M-001", 500.0, Utc::now(), PaymentChannel::Bkash, None);

        assert!(buy_in.is_initial_buy_in());
        assert!(!ordinary.is_initial_buy_in());
    }
}
