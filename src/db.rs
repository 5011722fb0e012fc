// SQLite ledger store
//
// Members and contributions live in two tables; contributions are
// append-only (edits touch amount/date/channel in place, never the owning
// member). All write paths funnel through here, and the read side
// implements `LedgerRead` for the allocation engine.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

use crate::buyin::full_share_upfront_payment;
use crate::ledger::{LedgerRead, MemberRecord};
use crate::member::{Contribution, Member, PaymentChannel, ShareType, INITIAL_FULL_SHARE};

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_uuid TEXT UNIQUE NOT NULL,
            membership_id TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            father_name TEXT,
            mobile TEXT,
            share_type TEXT NOT NULL,
            joined_at TEXT NOT NULL,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS contributions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            contribution_uuid TEXT UNIQUE NOT NULL,
            membership_id TEXT NOT NULL REFERENCES members(membership_id),
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            channel TEXT NOT NULL,
            transaction_number TEXT,
            idempotency_hash TEXT UNIQUE,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contributions_member ON contributions(membership_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contributions_date ON contributions(date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_members_deleted ON members(is_deleted)",
        [],
    )?;

    Ok(())
}

// Timestamps are stored as RFC 3339 UTC at fixed precision so the TEXT
// column compares chronologically.
fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| rusqlite::Error::InvalidQuery)
}

// ============================================================================
// ADMISSION
// ============================================================================

/// Admit a member. For a `fullShare` admission the buy-in price is computed
/// and one administrative contribution (marked `INITIAL-FULL-SHARE`, channel
/// Bank) is written in the same transaction as the member row: both commit
/// or neither does, so an admitted member can never lack its capital record.
///
/// Returns the buy-in contribution, if one was made.
pub fn admit_member(conn: &mut Connection, member: &Member) -> Result<Option<Contribution>> {
    let tx = conn.transaction().context("Failed to begin admission")?;

    let taken: Option<i64> = tx
        .query_row(
            "SELECT id FROM members WHERE membership_id = ?1",
            params![member.membership_id],
            |row| row.get(0),
        )
        .optional()?;
    if taken.is_some() {
        bail!("Membership ID {} is already in use", member.membership_id);
    }

    // Price the buy-in before the new member row exists, so an empty pool
    // charges exactly one unit rather than unit * 0.
    let buy_in_amount = if member.share_type == ShareType::FullShare {
        Some(full_share_upfront_payment(&*tx)?)
    } else {
        None
    };

    tx.execute(
        "INSERT INTO members (
            member_uuid, membership_id, name, father_name, mobile,
            share_type, joined_at, is_deleted
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
        params![
            member.id,
            member.membership_id,
            member.name,
            member.father_name,
            member.mobile,
            member.share_type.as_str(),
            fmt_ts(member.joined_at),
        ],
    )
    .context("Failed to insert member")?;

    let buy_in = match buy_in_amount {
        Some(amount) => {
            let contribution = Contribution::new(
                &member.membership_id,
                amount,
                member.joined_at,
                PaymentChannel::Bank,
                Some(INITIAL_FULL_SHARE.to_string()),
            );
            insert_contribution_row(&tx, &contribution, None)?;
            Some(contribution)
        }
        None => None,
    };

    tx.commit().context("Failed to commit admission")?;

    Ok(buy_in)
}

// ============================================================================
// CONTRIBUTIONS
// ============================================================================

fn insert_contribution_row(
    conn: &Connection,
    c: &Contribution,
    idempotency_hash: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO contributions (
            contribution_uuid, membership_id, amount, date, channel,
            transaction_number, idempotency_hash
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            c.id,
            c.membership_id,
            c.amount,
            fmt_ts(c.date),
            c.channel.as_str(),
            c.transaction_number,
            idempotency_hash,
        ],
    )
    .context("Failed to insert contribution")?;

    Ok(())
}

fn require_active_member(conn: &Connection, membership_id: &str) -> Result<()> {
    let active: Option<i64> = conn
        .query_row(
            "SELECT id FROM members WHERE membership_id = ?1 AND is_deleted = 0",
            params![membership_id],
            |row| row.get(0),
        )
        .optional()?;
    if active.is_none() {
        bail!("Member {} not found or deleted", membership_id);
    }
    Ok(())
}

/// Append one contribution to an active member's ledger.
pub fn record_contribution(
    conn: &Connection,
    membership_id: &str,
    amount: f64,
    date: DateTime<Utc>,
    channel: PaymentChannel,
    transaction_number: Option<String>,
) -> Result<Contribution> {
    if amount < 0.0 {
        bail!("Contribution amount must not be negative");
    }
    require_active_member(conn, membership_id)?;

    let contribution = Contribution::new(membership_id, amount, date, channel, transaction_number);
    insert_contribution_row(conn, &contribution, None)?;

    Ok(contribution)
}

/// Fields of a contribution that may be edited in place. The owning member
/// is not among them.
#[derive(Debug, Default, Clone)]
pub struct ContributionUpdate {
    pub amount: Option<f64>,
    pub date: Option<DateTime<Utc>>,
    pub channel: Option<PaymentChannel>,
    pub transaction_number: Option<Option<String>>,
}

/// Edit a contribution's amount/date/channel/reference in place.
pub fn update_contribution(
    conn: &Connection,
    contribution_uuid: &str,
    update: &ContributionUpdate,
) -> Result<Contribution> {
    let mut existing = get_contribution(conn, contribution_uuid)?
        .with_context(|| format!("Contribution {} not found", contribution_uuid))?;

    if let Some(amount) = update.amount {
        if amount < 0.0 {
            bail!("Contribution amount must not be negative");
        }
        existing.amount = amount;
    }
    if let Some(date) = update.date {
        existing.date = date;
    }
    if let Some(channel) = update.channel {
        existing.channel = channel;
    }
    if let Some(ref transaction_number) = update.transaction_number {
        existing.transaction_number = transaction_number.clone();
    }

    conn.execute(
        "UPDATE contributions
         SET amount = ?1, date = ?2, channel = ?3, transaction_number = ?4
         WHERE contribution_uuid = ?5",
        params![
            existing.amount,
            fmt_ts(existing.date),
            existing.channel.as_str(),
            existing.transaction_number,
            contribution_uuid,
        ],
    )
    .context("Failed to update contribution")?;

    Ok(existing)
}

pub fn get_contribution(
    conn: &Connection,
    contribution_uuid: &str,
) -> Result<Option<Contribution>> {
    let row = conn
        .query_row(
            "SELECT contribution_uuid, membership_id, amount, date, channel, transaction_number
             FROM contributions WHERE contribution_uuid = ?1",
            params![contribution_uuid],
            map_contribution_row,
        )
        .optional()?;

    Ok(row)
}

fn map_contribution_row(row: &rusqlite::Row) -> rusqlite::Result<Contribution> {
    let date_raw: String = row.get(3)?;
    let channel_raw: String = row.get(4)?;

    Ok(Contribution {
        id: row.get(0)?,
        membership_id: row.get(1)?,
        amount: row.get(2)?,
        date: parse_ts(&date_raw)?,
        channel: PaymentChannel::from_tag(&channel_raw).ok_or(rusqlite::Error::InvalidQuery)?,
        transaction_number: row.get(5)?,
    })
}

// ============================================================================
// MEMBERS
// ============================================================================

/// Soft-delete: the row stays, the flag flips, and every subsequent
/// allocation read skips the member.
pub fn soft_delete_member(conn: &Connection, membership_id: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE members SET is_deleted = 1 WHERE membership_id = ?1 AND is_deleted = 0",
        params![membership_id],
    )?;
    if changed == 0 {
        bail!("Member {} not found or already deleted", membership_id);
    }
    Ok(())
}

fn map_member_row(row: &rusqlite::Row) -> rusqlite::Result<Member> {
    let share_tag: String = row.get(5)?;
    let joined_raw: String = row.get(6)?;
    let is_deleted: i64 = row.get(7)?;

    Ok(Member {
        id: row.get(0)?,
        membership_id: row.get(1)?,
        name: row.get(2)?,
        father_name: row.get(3)?,
        mobile: row.get(4)?,
        share_type: ShareType::from_tag(&share_tag),
        joined_at: parse_ts(&joined_raw)?,
        is_deleted: is_deleted != 0,
    })
}

/// All active members with their contributions ordered by date ascending.
/// Member order follows admission order (stable across runs with no
/// intervening writes).
pub fn get_active_members(conn: &Connection) -> Result<Vec<MemberRecord>> {
    let mut stmt = conn.prepare(
        "SELECT member_uuid, membership_id, name, father_name, mobile,
                share_type, joined_at, is_deleted
         FROM members
         WHERE is_deleted = 0
         ORDER BY joined_at ASC, id ASC",
    )?;

    let members = stmt
        .query_map([], map_member_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut contribution_stmt = conn.prepare(
        "SELECT contribution_uuid, membership_id, amount, date, channel, transaction_number
         FROM contributions
         WHERE membership_id = ?1
         ORDER BY date ASC, id ASC",
    )?;

    let mut records = Vec::with_capacity(members.len());
    for member in members {
        let contributions = contribution_stmt
            .query_map(params![member.membership_id], map_contribution_row)?
            .collect::<Result<Vec<_>, _>>()?;
        records.push(MemberRecord {
            member,
            contributions,
        });
    }

    Ok(records)
}

/// Sum of contribution amounts dated strictly before `cutoff`, across all
/// active members' ledgers. Deleted members' money does not count toward
/// the historical fund.
pub fn sum_contributions_before(conn: &Connection, cutoff: DateTime<Utc>) -> Result<f64> {
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(c.amount), 0)
         FROM contributions c
         JOIN members m ON m.membership_id = c.membership_id
         WHERE c.date < ?1 AND m.is_deleted = 0",
        params![fmt_ts(cutoff)],
        |row| row.get(0),
    )?;

    Ok(total)
}

impl LedgerRead for Connection {
    fn active_members(&self) -> Result<Vec<MemberRecord>> {
        get_active_members(self)
    }

    fn total_paid_before(&self, cutoff: DateTime<Utc>) -> Result<f64> {
        sum_contributions_before(self, cutoff)
    }
}

// ============================================================================
// CSV IMPORT (ledger seeding)
// ============================================================================

/// One row of a contribution CSV export.
#[derive(Debug, Deserialize)]
pub struct CsvContribution {
    #[serde(rename = "Membership_ID")]
    pub membership_id: String,

    #[serde(rename = "Amount")]
    pub amount: f64,

    /// RFC 3339 timestamp
    #[serde(rename = "Date")]
    pub date: String,

    #[serde(rename = "Channel")]
    pub channel: String,

    #[serde(rename = "Transaction_Number")]
    pub transaction_number: Option<String>,
}

impl CsvContribution {
    /// Hash for duplicate detection on re-import. Deduplication key, not
    /// identity: two imports of the same export insert once.
    fn idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}{}{}{}",
            self.membership_id, self.amount, self.date, self.channel
        ));
        format!("{:x}", hasher.finalize())
    }
}

pub fn read_contributions_csv(reader: impl Read) -> Result<Vec<CsvContribution>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: CsvContribution = result.context("Failed to deserialize contribution row")?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_contributions_csv(csv_path: &Path) -> Result<Vec<CsvContribution>> {
    let file = std::fs::File::open(csv_path).context("Failed to open CSV file")?;
    read_contributions_csv(file)
}

/// Insert imported rows, skipping any already present (by idempotency
/// hash). Returns (inserted, skipped). The whole import runs in one
/// transaction: a bad row (unknown or deleted member, unknown channel,
/// negative amount, unparseable date) rolls back every row of the file,
/// so a failed import never leaves a partially seeded ledger.
pub fn import_contributions(
    conn: &mut Connection,
    rows: &[CsvContribution],
) -> Result<(usize, usize)> {
    let tx = conn.transaction().context("Failed to begin import")?;

    let mut inserted = 0;
    let mut duplicates = 0;

    for row in rows {
        require_active_member(&tx, &row.membership_id)?;

        let date = DateTime::parse_from_rfc3339(&row.date)
            .with_context(|| format!("Bad date in import row: {}", row.date))?
            .with_timezone(&Utc);
        let channel = PaymentChannel::from_tag(&row.channel)
            .with_context(|| format!("Unknown payment channel: {}", row.channel))?;
        if row.amount < 0.0 {
            bail!("Contribution amount must not be negative");
        }

        let contribution = Contribution::new(
            &row.membership_id,
            row.amount,
            date,
            channel,
            row.transaction_number.clone(),
        );
        let hash = row.idempotency_hash();

        let result = tx.execute(
            "INSERT INTO contributions (
                contribution_uuid, membership_id, amount, date, channel,
                transaction_number, idempotency_hash
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                contribution.id,
                contribution.membership_id,
                contribution.amount,
                fmt_ts(contribution.date),
                contribution.channel.as_str(),
                contribution.transaction_number,
                hash,
            ],
        );

        match result {
            Ok(_) => inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit().context("Failed to commit import")?;

    Ok((inserted, duplicates))
}

pub fn count_members(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_contributions(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM contributions", [], |row| row.get(0))?;
    Ok(count)
}
