use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::env;
use std::path::{Path, PathBuf};

use pool_ledger::{
    admit_member, assemble_report, count_contributions, count_members, full_share_upfront_payment,
    import_contributions, load_contributions_csv, record_contribution, setup_database,
    soft_delete_member, update_contribution, ContributionUpdate, Member, PaymentChannel, ShareType,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("init") => run_init(),
        Some("admit") => run_admit(&args[2..]),
        Some("pay") => run_pay(&args[2..]),
        Some("edit-payment") => run_edit_payment(&args[2..]),
        Some("remove") => run_remove(&args[2..]),
        Some("buy-in") => run_buy_in(),
        Some("import") => run_import(&args[2..]),
        Some("report") | None => run_report(),
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: pool-ledger <command>");
    eprintln!("  init                                    create the ledger database");
    eprintln!("  admit <id> <name> <fullShare|newMember> admit a member");
    eprintln!("  pay <id> <amount> [channel] [date]      record a contribution");
    eprintln!("  edit-payment <uuid> [--amount X] [--date D] [--channel C] [--txn T]");
    eprintln!("                                          edit a contribution in place");
    eprintln!("  remove <id>                             soft-delete a member");
    eprintln!("  buy-in                                  show the current full-share buy-in price");
    eprintln!("  import <file.csv>                       seed contributions from a CSV export");
    eprintln!("  report                                  print the share report (default)");
}

fn db_path() -> PathBuf {
    env::var("POOL_LEDGER_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("pool-ledger.db"))
}

fn open_db() -> Result<Connection> {
    let path = db_path();
    if !path.exists() {
        bail!(
            "Ledger database not found at {} - run `pool-ledger init` first",
            path.display()
        );
    }
    let conn = Connection::open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(conn)
}

fn run_init() -> Result<()> {
    let path = db_path();
    let conn = Connection::open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    setup_database(&conn)?;
    println!("✓ Ledger initialized at {} (WAL mode)", path.display());
    Ok(())
}

fn run_admit(args: &[String]) -> Result<()> {
    let [membership_id, name, share_tag] = args else {
        bail!("Usage: pool-ledger admit <id> <name> <fullShare|newMember>");
    };
    let share_type = match share_tag.as_str() {
        "fullShare" => ShareType::FullShare,
        "newMember" => ShareType::NewMember,
        other => bail!("Unknown share type: {} (expected fullShare or newMember)", other),
    };

    let mut conn = open_db()?;
    let member = Member::new(membership_id, name, share_type);
    let buy_in = admit_member(&mut conn, &member)?;

    println!("✓ Admitted {} ({}) as {}", name, membership_id, share_type.as_str());
    if let Some(contribution) = buy_in {
        println!("✓ Buy-in contribution recorded: {:.2}", contribution.amount);
    }
    Ok(())
}

fn run_pay(args: &[String]) -> Result<()> {
    if args.len() < 2 {
        bail!("Usage: pool-ledger pay <id> <amount> [channel] [rfc3339-date]");
    }
    let membership_id = &args[0];
    let amount: f64 = args[1].parse().context("Amount must be a number")?;
    let channel = match args.get(2) {
        Some(tag) => PaymentChannel::from_tag(tag)
            .with_context(|| format!("Unknown payment channel: {}", tag))?,
        None => PaymentChannel::Bank,
    };
    let date = match args.get(3) {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .context("Date must be RFC 3339")?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let conn = open_db()?;
    let contribution = record_contribution(&conn, membership_id, amount, date, channel, None)?;
    println!(
        "✓ Recorded {:.2} via {} for {}",
        contribution.amount,
        contribution.channel.as_str(),
        contribution.membership_id
    );
    Ok(())
}

fn parse_edit_args(args: &[String]) -> Result<(String, ContributionUpdate)> {
    let Some((contribution_uuid, flags)) = args.split_first() else {
        bail!("Usage: pool-ledger edit-payment <uuid> [--amount X] [--date D] [--channel C] [--txn T]");
    };

    let mut update = ContributionUpdate::default();
    let mut it = flags.iter();
    while let Some(flag) = it.next() {
        let value = it
            .next()
            .with_context(|| format!("Missing value for {}", flag))?;
        match flag.as_str() {
            "--amount" => {
                update.amount = Some(value.parse().context("Amount must be a number")?);
            }
            "--date" => {
                update.date = Some(
                    DateTime::parse_from_rfc3339(value)
                        .context("Date must be RFC 3339")?
                        .with_timezone(&Utc),
                );
            }
            "--channel" => {
                update.channel = Some(
                    PaymentChannel::from_tag(value)
                        .with_context(|| format!("Unknown payment channel: {}", value))?,
                );
            }
            // Empty string clears the transaction reference
            "--txn" => {
                update.transaction_number = Some(if value.is_empty() {
                    None
                } else {
                    Some(value.clone())
                });
            }
            other => bail!("Unknown flag: {}", other),
        }
    }

    if update.amount.is_none()
        && update.date.is_none()
        && update.channel.is_none()
        && update.transaction_number.is_none()
    {
        bail!("Nothing to edit - pass at least one of --amount, --date, --channel, --txn");
    }

    Ok((contribution_uuid.clone(), update))
}

fn run_edit_payment(args: &[String]) -> Result<()> {
    let (contribution_uuid, update) = parse_edit_args(args)?;
    let conn = open_db()?;
    let updated = update_contribution(&conn, &contribution_uuid, &update)?;
    println!(
        "✓ Updated contribution {} for {}: {:.2} via {}",
        updated.id,
        updated.membership_id,
        updated.amount,
        updated.channel.as_str()
    );
    Ok(())
}

fn run_remove(args: &[String]) -> Result<()> {
    let [membership_id] = args else {
        bail!("Usage: pool-ledger remove <id>");
    };
    let conn = open_db()?;
    soft_delete_member(&conn, membership_id)?;
    println!("✓ Member {} removed from the active pool", membership_id);
    Ok(())
}

fn run_buy_in() -> Result<()> {
    let conn = open_db()?;
    let price = full_share_upfront_payment(&conn)?;
    println!("Current full-share buy-in: {:.2}", price);
    Ok(())
}

fn run_import(args: &[String]) -> Result<()> {
    let [csv_path] = args else {
        bail!("Usage: pool-ledger import <file.csv>");
    };
    let mut conn = open_db()?;

    println!("📂 Loading {}...", csv_path);
    let rows = load_contributions_csv(Path::new(csv_path))?;
    println!("✓ Loaded {} contribution rows", rows.len());

    let (inserted, skipped) = import_contributions(&mut conn, &rows)?;
    println!("✓ Inserted: {} contributions", inserted);
    println!("✓ Skipped duplicates: {}", skipped);
    println!(
        "✓ Ledger now holds {} contributions across {} members",
        count_contributions(&conn)?,
        count_members(&conn)?
    );
    Ok(())
}

fn run_report() -> Result<()> {
    let conn = open_db()?;
    let report = assemble_report(&conn)?;

    if report.calculations.is_empty() {
        println!("No active members.");
        return Ok(());
    }

    println!(
        "{:<12} {:<24} {:<10} {:>12} {:>8} {:>9}",
        "Member", "Name", "Cohort", "Total Paid", "Months", "Share %"
    );
    for calc in &report.calculations {
        println!(
            "{:<12} {:<24} {:<10} {:>12.2} {:>8} {:>8.3}%",
            calc.membership_id,
            calc.name,
            calc.share_type.as_str(),
            calc.total_paid,
            calc.months_paid,
            calc.share_percentage
        );
    }
    // Informational only: not guaranteed to be 100 when several new members
    // joined in overlapping windows
    println!("\nSum of shares: {:.3}%", report.total_percentage);

    println!("\n{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
