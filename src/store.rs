// Transaction store: the contract the reconciliation engine consumes, and
// its SQLite implementation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::model::{CanonicalTransaction, Direction, EventSource, TransactionPatch};

// ============================================================================
// STORE CONTRACT
// ============================================================================

/// Operations the reconciliation engine requires from the persistence
/// collaborator. The engine consumes nothing else; concrete stores may
/// offer additional read helpers for their own callers.
pub trait TransactionStore {
    /// Look up a transaction by its exact fingerprint.
    fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<CanonicalTransaction>>;

    /// Find one transaction with equal amount and direction whose
    /// transaction time falls inside the inclusive window.
    fn find_in_window(
        &self,
        amount: f64,
        direction: Direction,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<CanonicalTransaction>>;

    /// Insert a new canonical transaction, returning its row id.
    fn insert(&mut self, tx: &CanonicalTransaction) -> Result<i64>;

    /// Apply a field-level patch to an existing transaction. Patched rows
    /// are marked unsynced again.
    fn update_fields(&mut self, id: i64, patch: &TransactionPatch) -> Result<()>;
}

// ============================================================================
// SQLITE IMPLEMENTATION
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        let store = SqliteStore { conn };
        store.setup()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = SqliteStore {
            conn: Connection::open_in_memory()?,
        };
        store.setup()?;
        Ok(store)
    }

    fn setup(&self) -> Result<()> {
        // WAL for crash recovery on file-backed databases.
        let _ = self
            .conn
            .pragma_update(None, "journal_mode", "WAL");

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uid TEXT UNIQUE NOT NULL,
                fingerprint TEXT UNIQUE NOT NULL,
                direction TEXT NOT NULL,
                amount REAL NOT NULL,
                account_suffix TEXT,
                merchant TEXT,
                reference TEXT,
                balance_after REAL,
                origin_label TEXT NOT NULL,
                category TEXT NOT NULL,
                category_icon TEXT NOT NULL,
                category_color TEXT NOT NULL,
                confidence REAL NOT NULL,
                source TEXT NOT NULL,
                transaction_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                synced INTEGER NOT NULL DEFAULT 0,
                note TEXT
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_fingerprint ON transactions(fingerprint)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_window
             ON transactions(amount, direction, transaction_at)",
            [],
        )?;

        Ok(())
    }

    /// All stored transactions, newest first. CLI helper; not part of the
    /// reconciliation contract.
    pub fn all(&self) -> Result<Vec<CanonicalTransaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM transactions ORDER BY transaction_at DESC",
            COLUMNS
        ))?;
        let rows = stmt
            .query_map([], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(&self) -> Result<i64> {
        let count =
            self.conn
                .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }
}

const COLUMNS: &str = "id, uid, fingerprint, direction, amount, account_suffix, merchant, \
                       reference, balance_after, origin_label, category, category_icon, \
                       category_color, confidence, source, transaction_at, created_at, \
                       synced, note";

fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<CanonicalTransaction> {
    let direction_str: String = row.get(3)?;
    let source_str: String = row.get(14)?;
    let transaction_at_ms: i64 = row.get(15)?;
    let created_at_ms: i64 = row.get(16)?;
    let synced: i64 = row.get(17)?;

    Ok(CanonicalTransaction {
        id: row.get(0)?,
        uid: row.get(1)?,
        fingerprint: row.get(2)?,
        direction: Direction::from_str(&direction_str).ok_or(rusqlite::Error::InvalidQuery)?,
        amount: row.get(4)?,
        account_suffix: row.get(5)?,
        merchant: row.get(6)?,
        reference: row.get(7)?,
        balance_after: row.get(8)?,
        origin_label: row.get(9)?,
        category: row.get(10)?,
        category_icon: row.get(11)?,
        category_color: row.get(12)?,
        confidence: row.get(13)?,
        source: EventSource::from_str(&source_str).ok_or(rusqlite::Error::InvalidQuery)?,
        transaction_at: DateTime::from_timestamp_millis(transaction_at_ms)
            .unwrap_or(DateTime::UNIX_EPOCH),
        created_at: DateTime::from_timestamp_millis(created_at_ms).unwrap_or(DateTime::UNIX_EPOCH),
        synced: synced != 0,
        note: row.get(18)?,
    })
}

impl TransactionStore for SqliteStore {
    fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<CanonicalTransaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE fingerprint = ?1 LIMIT 1",
            COLUMNS
        ))?;
        let tx = stmt
            .query_row(params![fingerprint], row_to_transaction)
            .optional()?;
        Ok(tx)
    }

    fn find_in_window(
        &self,
        amount: f64,
        direction: Direction,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<CanonicalTransaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM transactions
             WHERE amount = ?1 AND direction = ?2
               AND transaction_at BETWEEN ?3 AND ?4
             ORDER BY transaction_at ASC
             LIMIT 1",
            COLUMNS
        ))?;
        let tx = stmt
            .query_row(
                params![
                    amount,
                    direction.as_str(),
                    start.timestamp_millis(),
                    end.timestamp_millis()
                ],
                row_to_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    fn insert(&mut self, tx: &CanonicalTransaction) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO transactions (
                uid, fingerprint, direction, amount, account_suffix, merchant,
                reference, balance_after, origin_label, category, category_icon,
                category_color, confidence, source, transaction_at, created_at,
                synced, note
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                tx.uid,
                tx.fingerprint,
                tx.direction.as_str(),
                tx.amount,
                tx.account_suffix,
                tx.merchant,
                tx.reference,
                tx.balance_after,
                tx.origin_label,
                tx.category,
                tx.category_icon,
                tx.category_color,
                tx.confidence,
                tx.source.as_str(),
                tx.transaction_at.timestamp_millis(),
                tx.created_at.timestamp_millis(),
                tx.synced as i64,
                tx.note,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_fields(&mut self, id: i64, patch: &TransactionPatch) -> Result<()> {
        if let Some(label) = &patch.origin_label {
            self.conn.execute(
                "UPDATE transactions SET origin_label = ?1, synced = 0 WHERE id = ?2",
                params![label, id],
            )?;
        }
        if let Some(suffix) = &patch.account_suffix {
            self.conn.execute(
                "UPDATE transactions SET account_suffix = ?1, synced = 0 WHERE id = ?2",
                params![suffix, id],
            )?;
        }
        if let Some(merchant) = &patch.merchant {
            self.conn.execute(
                "UPDATE transactions SET merchant = ?1, synced = 0 WHERE id = ?2",
                params![merchant, id],
            )?;
        }
        if let Some(category) = &patch.category {
            self.conn.execute(
                "UPDATE transactions SET category = ?1, synced = 0 WHERE id = ?2",
                params![category, id],
            )?;
        }
        if let Some(icon) = &patch.category_icon {
            self.conn.execute(
                "UPDATE transactions SET category_icon = ?1 WHERE id = ?2",
                params![icon, id],
            )?;
        }
        if let Some(color) = &patch.category_color {
            self.conn.execute(
                "UPDATE transactions SET category_color = ?1 WHERE id = ?2",
                params![color, id],
            )?;
        }
        if let Some(fingerprint) = &patch.fingerprint {
            self.conn.execute(
                "UPDATE transactions SET fingerprint = ?1 WHERE id = ?2",
                params![fingerprint, id],
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn sample_tx(fingerprint: &str, amount: f64, transaction_at: DateTime<Utc>) -> CanonicalTransaction {
        CanonicalTransaction {
            id: 0,
            uid: uuid::Uuid::new_v4().to_string(),
            direction: Direction::Expense,
            amount,
            account_suffix: Some("4532".to_string()),
            merchant: Some("SWIGGY".to_string()),
            reference: Some("REF123456789".to_string()),
            balance_after: Some(15667.62),
            origin_label: "HDFC Bank".to_string(),
            category: "Food & Dining".to_string(),
            category_icon: "restaurant".to_string(),
            category_color: "#EF4444".to_string(),
            confidence: 0.9,
            fingerprint: fingerprint.to_string(),
            source: EventSource::Sms,
            transaction_at,
            created_at: transaction_at,
            synced: false,
            note: None,
        }
    }

    #[test]
    fn test_insert_and_find_by_fingerprint() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let tx = sample_tx("fp-1", 350.0, at(1_700_000_000));

        let id = store.insert(&tx).unwrap();
        assert!(id > 0);

        let found = store.find_by_fingerprint("fp-1").unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.merchant.as_deref(), Some("SWIGGY"));
        assert_eq!(found.direction, Direction::Expense);
        assert_eq!(found.transaction_at, at(1_700_000_000));
        assert!(!found.synced);

        assert!(store.find_by_fingerprint("fp-other").unwrap().is_none());
    }

    #[test]
    fn test_window_query_boundaries() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert(&sample_tx("fp-1", 500.0, at(10_000))).unwrap();

        // Inside the window.
        assert!(store
            .find_in_window(500.0, Direction::Expense, at(9_000), at(11_000))
            .unwrap()
            .is_some());

        // Window edges are inclusive.
        assert!(store
            .find_in_window(500.0, Direction::Expense, at(10_000), at(12_000))
            .unwrap()
            .is_some());
        assert!(store
            .find_in_window(500.0, Direction::Expense, at(8_000), at(10_000))
            .unwrap()
            .is_some());

        // Outside the window.
        assert!(store
            .find_in_window(500.0, Direction::Expense, at(10_001), at(12_000))
            .unwrap()
            .is_none());

        // Amount and direction must both match.
        assert!(store
            .find_in_window(500.01, Direction::Expense, at(9_000), at(11_000))
            .unwrap()
            .is_none());
        assert!(store
            .find_in_window(500.0, Direction::Income, at(9_000), at(11_000))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_fields_partial() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut tx = sample_tx("fp-1", 500.0, at(10_000));
        tx.merchant = Some("UPI-DR/5671".to_string());
        tx.synced = true;
        let id = store.insert(&tx).unwrap();

        let patch = TransactionPatch {
            merchant: Some("JOHN DOE".to_string()),
            category: Some("Transfers".to_string()),
            category_icon: Some("swap_horiz".to_string()),
            category_color: Some("#64748B".to_string()),
            ..Default::default()
        };
        store.update_fields(id, &patch).unwrap();

        let updated = store.find_by_fingerprint("fp-1").unwrap().unwrap();
        assert_eq!(updated.merchant.as_deref(), Some("JOHN DOE"));
        assert_eq!(updated.category, "Transfers");
        // Untouched fields survive.
        assert_eq!(updated.origin_label, "HDFC Bank");
        assert_eq!(updated.account_suffix.as_deref(), Some("4532"));
        // A patched row needs syncing again.
        assert!(!updated.synced);
    }

    #[test]
    fn test_update_fingerprint() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let id = store.insert(&sample_tx("fp-old", 500.0, at(10_000))).unwrap();

        let patch = TransactionPatch {
            fingerprint: Some("fp-new".to_string()),
            ..Default::default()
        };
        store.update_fields(id, &patch).unwrap();

        assert!(store.find_by_fingerprint("fp-old").unwrap().is_none());
        assert!(store.find_by_fingerprint("fp-new").unwrap().is_some());
    }

    #[test]
    fn test_all_and_count() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert(&sample_tx("fp-1", 100.0, at(1_000))).unwrap();
        store.insert(&sample_tx("fp-2", 200.0, at(2_000))).unwrap();

        assert_eq!(store.count().unwrap(), 2);
        let all = store.all().unwrap();
        assert_eq!(all.len(), 2);
        // Newest first.
        assert_eq!(all[0].fingerprint, "fp-2");
    }
}
