// Pool Ledger - Core Library
// Membership/investment-pool contribution ledger and equity allocation engine

pub mod allocation;
pub mod buyin;
pub mod db;
pub mod ledger;
pub mod member;
pub mod report;

// Re-export commonly used types
pub use allocation::{full_share_percentage, new_member_percentage, MONTHLY_UNIT};
pub use buyin::full_share_upfront_payment;
pub use db::{
    admit_member, count_contributions, count_members, get_active_members, get_contribution,
    import_contributions, load_contributions_csv, read_contributions_csv, record_contribution,
    setup_database, soft_delete_member, sum_contributions_before, update_contribution,
    ContributionUpdate, CsvContribution,
};
pub use ledger::{LedgerRead, MemberRecord};
pub use member::{Contribution, Member, PaymentChannel, ShareType, INITIAL_FULL_SHARE};
pub use report::{assemble_report, calculate_all_shares, ShareCalculation, ShareReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
