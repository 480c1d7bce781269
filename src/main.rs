use anyhow::Result;
use std::env;
use std::io::{self, BufRead};
use std::path::Path;

use txn_recon::{EventOutcome, IngestEngine, Outcome, RawEvent, SqliteStore};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match (args.get(1).map(String::as_str), args.get(2)) {
        (Some("ingest"), Some(db_path)) => run_ingest(Path::new(db_path)),
        (Some("list"), Some(db_path)) => run_list(Path::new(db_path)),
        _ => {
            eprintln!("txn-recon {}", txn_recon::VERSION);
            eprintln!();
            eprintln!("Usage:");
            eprintln!("  txn-recon ingest <db-path>   read JSON events from stdin, one per line");
            eprintln!("  txn-recon list <db-path>     print stored transactions");
            std::process::exit(1);
        }
    }
}

fn run_ingest(db_path: &Path) -> Result<()> {
    let store = SqliteStore::open(db_path)?;
    let engine = IngestEngine::new(store);

    let mut inserted = 0usize;
    let mut merged = 0usize;
    let mut dropped = 0usize;
    let mut rejected = 0usize;
    let mut malformed = 0usize;

    for (line_no, line) in io::stdin().lock().lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let event: RawEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(err) => {
                eprintln!("line {}: malformed event: {}", line_no + 1, err);
                malformed += 1;
                continue;
            }
        };

        match engine.process(&event)? {
            EventOutcome::Recorded(Outcome::Inserted(id)) => {
                println!("line {}: recorded #{}", line_no + 1, id);
                inserted += 1;
            }
            EventOutcome::Recorded(Outcome::MergedInto(id)) => {
                println!("line {}: merged into #{}", line_no + 1, id);
                merged += 1;
            }
            EventOutcome::Recorded(Outcome::DuplicateDropped) => {
                println!("line {}: duplicate, dropped", line_no + 1);
                dropped += 1;
            }
            EventOutcome::Rejected(reason) => {
                println!("line {}: rejected ({})", line_no + 1, reason);
                rejected += 1;
            }
        }
    }

    let store = engine.into_store();
    println!();
    println!("✓ Inserted: {}", inserted);
    println!("✓ Merged: {}", merged);
    println!("✓ Duplicates dropped: {}", dropped);
    println!("✓ Rejected: {}", rejected);
    if malformed > 0 {
        println!("✗ Malformed lines: {}", malformed);
    }
    println!("✓ Store now holds {} transactions", store.count()?);

    Ok(())
}

fn run_list(db_path: &Path) -> Result<()> {
    let store = SqliteStore::open(db_path)?;
    let transactions = store.all()?;

    if transactions.is_empty() {
        println!("No transactions stored.");
        return Ok(());
    }

    for tx in &transactions {
        println!(
            "#{} {} {} ₹{:.2} {} [{}] {}{}",
            tx.id,
            tx.transaction_at.format("%Y-%m-%d %H:%M"),
            tx.direction.as_str(),
            tx.amount,
            tx.merchant.as_deref().unwrap_or("-"),
            tx.category,
            tx.origin_label,
            tx.account_suffix
                .as_ref()
                .map(|s| format!(" ••{}", s))
                .unwrap_or_default(),
        );
    }
    println!();
    println!("✓ {} transactions", transactions.len());

    Ok(())
}
