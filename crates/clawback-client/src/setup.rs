use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};

use crate::contracts::types::DataRange;
use crate::migrations::{
    LATEST_USER_VERSION, REQUIRED_INDEX_NAMES, REQUIRED_META_KEYS, REQUIRED_VIEW_NAMES,
    run_pending, safe_repair_statement,
};
use crate::state::{
    ensure_ledger_directory, ledger_db_path, map_sqlite_error, open_connection, resolve_ledger_home,
};
use crate::{ClientError, ClientResult};

const REQUIRED_CORE_TABLES: [(&str, &[&str]); 4] = [
    ("internal_meta", &["key", "value"]),
    (
        "internal_import_runs",
        &[
            "import_id",
            "status",
            "created_at",
            "committed_at",
            "rows_read",
            "rows_valid",
            "rows_invalid",
            "inserted",
            "source_kind",
            "source_ref",
        ],
    ),
    (
        "internal_policies",
        &["policy_id", "policy_number", "updated_at"],
    ),
    (
        "internal_commission_paid",
        &[
            "entry_id",
            "import_id",
            "policy_id",
            "statement_date",
            "paid_override_amount",
        ],
    ),
];

#[derive(Debug, Clone)]
pub struct SetupContext {
    pub db_path: String,
    pub schema_version: String,
    pub data_range: DataRange,
}

impl SetupContext {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.db_path)
    }
}

pub fn ensure_initialized() -> ClientResult<SetupContext> {
    initialize(None)
}

pub fn ensure_initialized_at(home_override: &Path) -> ClientResult<SetupContext> {
    initialize(Some(home_override))
}

fn initialize(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    let ledger_home = resolve_ledger_home(home_override)?;
    ensure_ledger_directory(&ledger_home)?;

    let db_path = ledger_db_path(&ledger_home);
    let mut connection = open_connection(&db_path)?;
    run_pending(&mut connection).map_err(|error| map_migration_error(&db_path, &error))?;

    verify_core_tables(&connection, &db_path)?;
    repair_safe_objects(&connection, &db_path)?;
    verify_repaired_objects(&connection, &db_path)?;

    let schema_version = read_schema_version(&connection, &db_path)?;
    let data_range = read_data_range(&connection, &db_path)?;
    log::debug!(
        "ledger ready at {} (schema {schema_version})",
        db_path.display()
    );

    Ok(SetupContext {
        db_path: db_path.display().to_string(),
        schema_version,
        data_range,
    })
}

fn map_migration_error(db_path: &Path, error: &rusqlite_migration::Error) -> ClientError {
    if let rusqlite_migration::Error::RusqliteError { query: _, err } = error {
        let mapped = map_sqlite_error(db_path, err);
        if matches!(
            mapped.code.as_str(),
            "ledger_locked" | "ledger_corrupt" | "ledger_init_permission_denied"
        ) {
            return mapped;
        }
    }
    ClientError::migration_failed(db_path, &error.to_string())
}

fn verify_core_tables(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    for (table_name, required_columns) in REQUIRED_CORE_TABLES {
        if !object_exists(connection, "table", table_name, db_path)? {
            return Err(ClientError::ledger_corrupt(db_path));
        }
        let columns = table_columns(connection, table_name, db_path)?;
        if required_columns
            .iter()
            .any(|required| !columns.iter().any(|column| column == required))
        {
            return Err(ClientError::ledger_corrupt(db_path));
        }
    }
    Ok(())
}

fn repair_safe_objects(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    // Missing meta keys are restored; a changed value is left for verification to reject.
    for (meta_key, default_value) in REQUIRED_META_KEYS {
        connection
            .execute(
                "INSERT OR IGNORE INTO internal_meta (key, value) VALUES (?1, ?2)",
                params![meta_key, default_value],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    let missing_objects = REQUIRED_VIEW_NAMES
        .iter()
        .map(|name| ("view", *name))
        .chain(REQUIRED_INDEX_NAMES.iter().map(|name| ("index", *name)));
    for (object_type, object_name) in missing_objects {
        if object_exists(connection, object_type, object_name, db_path)? {
            continue;
        }
        log::info!("recreating missing {object_type} {object_name}");
        let sql = safe_repair_statement(object_name).ok_or_else(|| {
            ClientError::ledger_init_failed(db_path, "Missing canonical SQL for ledger repair.")
        })?;
        connection
            .execute_batch(&sql)
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    Ok(())
}

fn verify_repaired_objects(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    let user_version = connection
        .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    if user_version != LATEST_USER_VERSION {
        return Err(ClientError::ledger_corrupt(db_path));
    }

    for (meta_key, expected_value) in REQUIRED_META_KEYS {
        let value = connection
            .query_row(
                "SELECT value FROM internal_meta WHERE key = ?1 LIMIT 1",
                [meta_key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        if value.as_deref() != Some(expected_value) {
            return Err(ClientError::ledger_corrupt(db_path));
        }
    }

    for index_name in REQUIRED_INDEX_NAMES {
        if !object_exists(connection, "index", index_name, db_path)? {
            return Err(ClientError::ledger_corrupt(db_path));
        }
    }

    for view_name in REQUIRED_VIEW_NAMES {
        verify_canonical_view(connection, view_name, db_path)?;
    }

    Ok(())
}

fn verify_canonical_view(connection: &Connection, view_name: &str, db_path: &Path) -> ClientResult<()> {
    let actual_sql = connection
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'view' AND name = ?1 LIMIT 1",
            [view_name],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?
        .ok_or_else(|| ClientError::ledger_corrupt(db_path))?;

    let repair_block = safe_repair_statement(view_name).ok_or_else(|| {
        ClientError::ledger_init_failed(db_path, "Missing canonical SQL for view verification.")
    })?;
    let expected_sql = repair_block
        .split(';')
        .map(str::trim)
        .find(|statement| statement.to_ascii_lowercase().starts_with("create view "))
        .ok_or_else(|| {
            ClientError::ledger_init_failed(db_path, "Missing canonical CREATE VIEW statement.")
        })?;

    if normalize_sql(&actual_sql) != normalize_sql(expected_sql) {
        return Err(ClientError::ledger_corrupt(db_path));
    }
    Ok(())
}

fn normalize_sql(sql: &str) -> String {
    sql.chars()
        .filter(|value| !value.is_whitespace() && *value != ';')
        .flat_map(char::to_lowercase)
        .collect()
}

fn object_exists(
    connection: &Connection,
    object_type: &str,
    object_name: &str,
    db_path: &Path,
) -> ClientResult<bool> {
    let found = connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2 LIMIT 1",
            params![object_type, object_name],
            |_row| Ok(()),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(found.is_some())
}

fn table_columns(
    connection: &Connection,
    table_name: &str,
    db_path: &Path,
) -> ClientResult<Vec<String>> {
    if !REQUIRED_CORE_TABLES
        .iter()
        .any(|(required_name, _)| *required_name == table_name)
    {
        return Err(ClientError::ledger_init_failed(
            db_path,
            "Refused PRAGMA table inspection for non-core table.",
        ));
    }

    // `table_name` comes from the allowlist above, never from user input.
    let sql = format!("PRAGMA table_info({table_name})");
    let mut statement = connection
        .prepare(&sql)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let names = statement
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut columns = Vec::new();
    for name in names {
        columns.push(name.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(columns)
}

fn read_schema_version(connection: &Connection, db_path: &Path) -> ClientResult<String> {
    let value = connection
        .query_row(
            "SELECT value FROM internal_meta WHERE key = 'schema_version' LIMIT 1",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(value.unwrap_or_else(|| "v1".to_string()))
}

fn read_data_range(connection: &Connection, db_path: &Path) -> ClientResult<DataRange> {
    connection
        .query_row(
            "SELECT MIN(statement_date), MAX(statement_date)
             FROM internal_commission_paid
             WHERE typeof(statement_date) = 'text'",
            [],
            |row| {
                Ok(DataRange {
                    earliest: row.get::<_, Option<String>>(0)?,
                    latest: row.get::<_, Option<String>>(1)?,
                })
            },
        )
        .map_err(|error| map_sqlite_error(db_path, &error))
}
