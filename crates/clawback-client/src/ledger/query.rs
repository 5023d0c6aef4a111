use std::path::Path;

use rusqlite::types::ValueRef;

use crate::ClientResult;
use crate::ledger::cache::{LedgerQuery, LedgerSource};
use crate::ledger::types::LedgerEntry;
use crate::state::{map_sqlite_error, open_readonly_connection};

/// Loads every commission payment joined to its policy number. No filtering
/// happens here; range and segment selection run over the whole snapshot.
pub fn load_ledger_entries(db_path: &Path) -> ClientResult<Vec<LedgerEntry>> {
    let connection = open_readonly_connection(db_path)?;
    let mut statement = connection
        .prepare(
            "SELECT
                policy_id,
                policy_number,
                statement_date,
                paid_override_amount
             FROM v1_commission_ledger
             ORDER BY policy_id ASC, entry_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([], |row| {
            let policy_id: i64 = row.get(0)?;
            let policy_number: String = row.get(1)?;
            let statement_date = raw_date_text(row.get_ref(2)?);
            let override_amount: f64 = row.get(3)?;
            Ok(LedgerEntry {
                policy_id,
                policy_number,
                statement_date,
                override_amount,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut entries: Vec<LedgerEntry> = Vec::new();
    for row in rows_iter {
        entries.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }

    log::debug!(
        "ledger: loaded {} entries from {}",
        entries.len(),
        db_path.display()
    );
    Ok(entries)
}

// Statement dates are stored as TEXT, but rows written by other tools may
// carry any storage class. Those become text that later fails date parsing.
fn raw_date_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(number) => number.to_string(),
        ValueRef::Real(number) => number.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// The SQLite ledger as a cacheable data source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteLedgerSource;

impl LedgerSource for SqliteLedgerSource {
    fn load(&self, query: &LedgerQuery) -> ClientResult<Vec<LedgerEntry>> {
        load_ledger_entries(&query.db_path)
    }
}
