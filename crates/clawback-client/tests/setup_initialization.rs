mod support;

use std::path::Path;

use clawback_client::migrations::{
    LATEST_USER_VERSION, REQUIRED_INDEX_NAMES, REQUIRED_META_KEYS, REQUIRED_VIEW_NAMES,
};
use clawback_client::setup::ensure_initialized_at;
use rusqlite::Connection;
use support::ledger_testkit::{import_rows, temp_home};

fn object_exists(connection: &Connection, object_type: &str, object_name: &str) -> bool {
    connection
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = ?1 AND name = ?2",
            [object_type, object_name],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count > 0)
        .unwrap_or(false)
}

fn meta_value(connection: &Connection, key: &str) -> Option<String> {
    connection
        .query_row(
            "SELECT value FROM internal_meta WHERE key = ?1 LIMIT 1",
            [key],
            |row| row.get::<_, String>(0),
        )
        .ok()
}

fn user_version(connection: &Connection) -> Option<i64> {
    connection
        .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .ok()
}

fn with_ledger(home: &Path, action: impl FnOnce(&Connection)) {
    let connection = Connection::open(home.join("ledger.db"));
    assert!(connection.is_ok());
    if let Ok(conn) = connection {
        action(&conn);
    }
}

#[test]
fn setup_creates_ledger_db_at_home_override() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let context = ensure_initialized_at(&home);
        assert!(context.is_ok());
        if let Ok(setup_context) = context {
            assert!(setup_context.db_path.ends_with("ledger.db"));
            assert_eq!(setup_context.schema_version, "v1");
            assert_eq!(setup_context.data_range.earliest, None);
            assert_eq!(setup_context.data_range.latest, None);
            assert!(home.join("ledger.db").exists());
        }
    }
}

#[test]
fn setup_is_idempotent_and_migrates_once() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let first = ensure_initialized_at(&home);
        let second = ensure_initialized_at(&home);
        assert!(first.is_ok());
        assert!(second.is_ok());
        if let (Ok(first_context), Ok(second_context)) = (first, second) {
            assert_eq!(first_context.db_path, second_context.db_path);
            assert_eq!(first_context.schema_version, second_context.schema_version);
        }

        with_ledger(&home, |conn| {
            assert_eq!(user_version(conn), Some(LATEST_USER_VERSION));
        });
    }
}

#[test]
fn setup_creates_every_public_object() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        assert!(ensure_initialized_at(&home).is_ok());
        with_ledger(&home, |conn| {
            for table in [
                "internal_meta",
                "internal_import_runs",
                "internal_policies",
                "internal_commission_paid",
            ] {
                assert!(object_exists(conn, "table", table), "missing {table}");
            }
            for view in REQUIRED_VIEW_NAMES {
                assert!(object_exists(conn, "view", view), "missing {view}");
            }
            for index in REQUIRED_INDEX_NAMES {
                assert!(object_exists(conn, "index", index), "missing {index}");
            }
            for (key, value) in REQUIRED_META_KEYS {
                assert_eq!(meta_value(conn, key).as_deref(), Some(value));
            }
        });
    }
}

#[test]
fn setup_reports_data_range_of_imported_statements() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        import_rows(
            &home,
            &[
                (1, "POL-1", "2024-03-01", 1200.0),
                (1, "POL-1", "2024-04-01", -600.0),
                (2, "POL-2", "2023-11-15", 500.0),
            ],
        );

        let context = ensure_initialized_at(&home);
        assert!(context.is_ok());
        if let Ok(setup_context) = context {
            assert_eq!(
                setup_context.data_range.earliest.as_deref(),
                Some("2023-11-15")
            );
            assert_eq!(
                setup_context.data_range.latest.as_deref(),
                Some("2024-04-01")
            );
        }
    }
}

#[test]
fn setup_repairs_missing_safe_view() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        assert!(ensure_initialized_at(&home).is_ok());
        with_ledger(&home, |conn| {
            assert!(conn.execute_batch("DROP VIEW v1_commission_ledger;").is_ok());
        });

        assert!(ensure_initialized_at(&home).is_ok());
        with_ledger(&home, |conn| {
            assert!(object_exists(conn, "view", "v1_commission_ledger"));
        });
    }
}

#[test]
fn setup_repairs_missing_safe_index() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        assert!(ensure_initialized_at(&home).is_ok());
        with_ledger(&home, |conn| {
            let dropped = conn.execute_batch("DROP INDEX idx_internal_commission_paid_policy_id;");
            assert!(dropped.is_ok());
        });

        assert!(ensure_initialized_at(&home).is_ok());
        with_ledger(&home, |conn| {
            assert!(object_exists(
                conn,
                "index",
                "idx_internal_commission_paid_policy_id"
            ));
        });
    }
}

#[test]
fn setup_repairs_missing_safe_meta_key() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        assert!(ensure_initialized_at(&home).is_ok());
        with_ledger(&home, |conn| {
            let deleted = conn.execute(
                "DELETE FROM internal_meta WHERE key = ?1",
                ["public_views_version"],
            );
            assert!(deleted.is_ok());
        });

        assert!(ensure_initialized_at(&home).is_ok());
        with_ledger(&home, |conn| {
            assert_eq!(
                meta_value(conn, "public_views_version").as_deref(),
                Some("v1")
            );
        });
    }
}

#[test]
fn setup_fails_when_required_view_sql_is_tampered() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        assert!(ensure_initialized_at(&home).is_ok());
        with_ledger(&home, |conn| {
            let tampered = conn.execute_batch(
                "DROP VIEW v1_commission_ledger;
                 CREATE VIEW v1_commission_ledger AS
                 SELECT key AS policy_id FROM internal_meta;",
            );
            assert!(tampered.is_ok());
        });

        let failed = ensure_initialized_at(&home);
        assert!(failed.is_err());
        if let Err(error) = failed {
            assert_eq!(error.code, "ledger_corrupt");
            assert!(error.is_internal());
        }
    }
}

#[test]
fn setup_fails_when_core_table_missing() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        assert!(ensure_initialized_at(&home).is_ok());
        with_ledger(&home, |conn| {
            let dropped = conn.execute_batch(
                "DROP VIEW v1_commission_ledger; DROP TABLE internal_commission_paid;",
            );
            assert!(dropped.is_ok());
        });

        let failed = ensure_initialized_at(&home);
        assert!(failed.is_err());
        if let Err(error) = failed {
            assert_eq!(error.code, "ledger_corrupt");
        }
    }
}

#[test]
fn setup_maps_locked_database_to_ledger_locked() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        assert!(ensure_initialized_at(&home).is_ok());
        with_ledger(&home, |conn| {
            assert!(conn.execute_batch("BEGIN EXCLUSIVE;").is_ok());

            let locked = ensure_initialized_at(&home);
            assert!(locked.is_err());
            if let Err(error) = locked {
                assert_eq!(error.code, "ledger_locked");
            }

            assert!(conn.execute_batch("ROLLBACK;").is_ok());
        });
    }
}
