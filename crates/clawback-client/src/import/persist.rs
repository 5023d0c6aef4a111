use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use ulid::Ulid;

use crate::ClientResult;
use crate::import::validate::CommissionPayment;
use crate::state::map_sqlite_error;

#[derive(Debug, Clone)]
pub(crate) struct PersistResult {
    pub(crate) import_id: String,
    pub(crate) inserted: i64,
    pub(crate) policies_upserted: i64,
}

pub(crate) struct PersistInput<'a> {
    pub(crate) rows: &'a [CommissionPayment],
    pub(crate) rows_read: i64,
    pub(crate) rows_valid: i64,
    pub(crate) rows_invalid: i64,
    pub(crate) source_kind: &'a str,
    pub(crate) source_ref: Option<&'a str>,
}

/// Writes one import run in a single immediate transaction: the run record,
/// the latest policy number per policy id, then every payment row.
pub(crate) fn persist_import(
    connection: &mut Connection,
    db_path: &Path,
    input: PersistInput<'_>,
) -> ClientResult<PersistResult> {
    let import_id = format!("imp_{}", Ulid::new());
    let timestamp = now_timestamp();

    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    transaction
        .execute(
            "INSERT INTO internal_import_runs (
                import_id,
                status,
                created_at,
                committed_at,
                rows_read,
                rows_valid,
                rows_invalid,
                inserted,
                source_kind,
                source_ref
             ) VALUES (?1, 'committed', ?2, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &import_id,
                &timestamp,
                input.rows_read,
                input.rows_valid,
                input.rows_invalid,
                input.rows.len() as i64,
                input.source_kind,
                input.source_ref
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let policy_numbers = input
        .rows
        .iter()
        .map(|row| (row.policy_id, row.policy_number.as_str()))
        .collect::<BTreeMap<i64, &str>>();
    for (policy_id, policy_number) in &policy_numbers {
        upsert_policy(&transaction, db_path, *policy_id, policy_number, &timestamp)?;
    }

    let mut inserted = 0_i64;
    for row in input.rows {
        insert_payment(&transaction, db_path, &import_id, row)?;
        inserted += 1;
    }

    transaction
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    log::info!(
        "committed import {import_id}: {inserted} payments across {} policies",
        policy_numbers.len()
    );

    Ok(PersistResult {
        import_id,
        inserted,
        policies_upserted: policy_numbers.len() as i64,
    })
}

fn upsert_policy(
    transaction: &Transaction<'_>,
    db_path: &Path,
    policy_id: i64,
    policy_number: &str,
    timestamp: &str,
) -> ClientResult<()> {
    transaction
        .execute(
            "INSERT INTO internal_policies (policy_id, policy_number, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (policy_id) DO UPDATE SET
                policy_number = excluded.policy_number,
                updated_at = excluded.updated_at",
            params![policy_id, policy_number, timestamp],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

fn insert_payment(
    transaction: &Transaction<'_>,
    db_path: &Path,
    import_id: &str,
    row: &CommissionPayment,
) -> ClientResult<()> {
    transaction
        .execute(
            "INSERT INTO internal_commission_paid (
                entry_id,
                import_id,
                policy_id,
                statement_date,
                paid_override_amount
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                format!("pay_{}", Ulid::new()),
                import_id,
                row.policy_id,
                &row.statement_date,
                row.paid_override_amount
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

/// Seconds since the Unix epoch, as text.
pub(crate) fn now_timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
