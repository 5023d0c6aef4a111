#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use clawback_client::commands::common::ReportRunOptions;
use clawback_client::commands::import::{self, ImportRunOptions};
use clawback_client::setup::ensure_initialized_at;
use clawback_client::{ClientResult, SuccessEnvelope};
use rusqlite::{Connection, params};
use tempfile::{Builder, TempDir};

pub const HEADER: &str = "policy_id,policy_number,statement_date,paid_override_amount";

/// One ledger row as `(policy_id, policy_number, statement_date, amount)`.
pub type Row<'a> = (i64, &'a str, &'a str, f64);

pub fn temp_home() -> std::io::Result<(TempDir, PathBuf)> {
    let dir = Builder::new().prefix("clawback-test").tempdir()?;
    let home = dir.path().join("ledger-home");
    Ok((dir, home))
}

pub fn csv_body(rows: &[Row<'_>]) -> String {
    let mut lines = vec![HEADER.to_string()];
    lines.extend(
        rows.iter()
            .map(|(id, number, date, amount)| format!("{id},{number},{date},{amount:.2}")),
    );
    lines.push(String::new());
    lines.join("\n")
}

pub fn write_file(path: &Path, body: &str) {
    let result = fs::write(path, body);
    assert!(result.is_ok());
}

pub fn run_import(
    home: &Path,
    body: &str,
    dry_run: bool,
) -> ClientResult<SuccessEnvelope> {
    import::run_with_options(ImportRunOptions {
        path: Some("-".to_string()),
        dry_run,
        home_override: Some(home),
        stdin_override: Some(body.to_string()),
    })
}

/// Imports `rows` through the public import command and asserts it committed.
pub fn import_rows(home: &Path, rows: &[Row<'_>]) {
    let result = run_import(home, &csv_body(rows), false);
    assert!(result.is_ok(), "import failed: {result:?}");
}

/// Writes rows straight into the ledger tables, bypassing import validation.
/// Used for raw values the importer would reject, such as malformed dates.
pub fn insert_raw_rows(home: &Path, rows: &[Row<'_>]) {
    let setup = ensure_initialized_at(home);
    assert!(setup.is_ok());
    let Ok(setup) = setup else {
        return;
    };

    let connection = Connection::open(setup.db_path());
    assert!(connection.is_ok());
    if let Ok(conn) = connection {
        let run = conn.execute(
            "INSERT OR IGNORE INTO internal_import_runs
                (import_id, status, created_at, committed_at, source_kind)
             VALUES ('imp_raw_fixture', 'committed', '0', '0', 'fixture')",
            [],
        );
        assert!(run.is_ok());

        for (index, (policy_id, policy_number, statement_date, amount)) in rows.iter().enumerate()
        {
            let policy = conn.execute(
                "INSERT INTO internal_policies (policy_id, policy_number, updated_at)
                 VALUES (?1, ?2, '0')
                 ON CONFLICT (policy_id) DO UPDATE SET policy_number = excluded.policy_number",
                params![policy_id, policy_number],
            );
            assert!(policy.is_ok());

            let entry = conn.execute(
                "INSERT INTO internal_commission_paid
                    (entry_id, import_id, policy_id, statement_date, paid_override_amount)
                 VALUES (?1, 'imp_raw_fixture', ?2, ?3, ?4)",
                params![
                    format!("pay_raw_{policy_id}_{index}"),
                    policy_id,
                    statement_date,
                    amount
                ],
            );
            assert!(entry.is_ok());
        }
    }
}

pub fn report_options<'a>(home: &'a Path) -> ReportRunOptions<'a> {
    ReportRunOptions {
        home_override: Some(home),
        ..ReportRunOptions::default()
    }
}

pub fn query_count(db_path: &Path, sql: &str) -> i64 {
    let connection = Connection::open(db_path);
    assert!(connection.is_ok());
    if let Ok(conn) = connection {
        let value = conn.query_row(sql, [], |row| row.get::<_, i64>(0));
        assert!(value.is_ok());
        if let Ok(count) = value {
            return count;
        }
    }
    0
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
