use std::collections::HashMap;

use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

const BOOTSTRAP_SQL: &str = include_str!("migrations/0001_bootstrap.sql");

const REPAIR_START_MARKER: &str = "-- clawback:safe_repair:start:";
const REPAIR_END_MARKER: &str = "-- clawback:safe_repair:end:";

pub const LATEST_USER_VERSION: i64 = 1;

pub const REQUIRED_VIEW_NAMES: [&str; 2] = ["v1_commission_ledger", "v1_imports"];

pub const REQUIRED_INDEX_NAMES: [&str; 3] = [
    "idx_internal_commission_paid_policy_id",
    "idx_internal_commission_paid_import_id",
    "idx_internal_import_runs_created_at_desc",
];

pub const REQUIRED_META_KEYS: [(&str, &str); 3] = [
    ("schema_version", "v1"),
    ("public_views_version", "v1"),
    ("import_contract_version", "v1"),
];

pub fn run_pending(conn: &mut Connection) -> rusqlite_migration::Result<()> {
    Migrations::new(vec![M::up(BOOTSTRAP_SQL)]).to_latest(conn)
}

/// Canonical SQL for a view or index that may be recreated without touching
/// ledger rows.
pub fn safe_repair_statement(object_name: &str) -> Option<String> {
    safe_repair_blocks().remove(object_name)
}

fn safe_repair_blocks() -> HashMap<String, String> {
    let mut blocks: HashMap<String, String> = HashMap::new();
    let mut open_block: Option<(&str, Vec<&str>)> = None;

    for line in BOOTSTRAP_SQL.lines() {
        let trimmed = line.trim();
        if let Some(name) = trimmed.strip_prefix(REPAIR_START_MARKER) {
            open_block = Some((name, Vec::new()));
            continue;
        }
        if let Some(name) = trimmed.strip_prefix(REPAIR_END_MARKER) {
            if let Some((open_name, lines)) = open_block.take()
                && open_name == name
            {
                blocks.insert(name.to_string(), lines.join("\n").trim().to_string());
            }
            continue;
        }
        if let Some((_, lines)) = open_block.as_mut() {
            lines.push(line);
        }
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::{REQUIRED_INDEX_NAMES, REQUIRED_VIEW_NAMES, safe_repair_statement};

    #[test]
    fn every_required_object_has_repair_sql() {
        for name in REQUIRED_VIEW_NAMES.iter().chain(REQUIRED_INDEX_NAMES.iter()) {
            let sql = safe_repair_statement(name);
            assert!(sql.is_some(), "missing repair SQL for {name}");
            if let Some(statement) = sql {
                assert!(statement.contains(name));
            }
        }
    }

    #[test]
    fn unknown_objects_have_no_repair_sql() {
        assert!(safe_repair_statement("internal_commission_paid").is_none());
    }
}
