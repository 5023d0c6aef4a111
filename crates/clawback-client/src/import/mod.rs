pub(crate) mod input;
pub(crate) mod parse;
pub(crate) mod persist;
pub(crate) mod validate;

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::contracts::types::{
    ImportCreateSummary, ImportIssue, ImportNextStep, ImportPolicyImpact, ImportWarning,
};
use crate::setup::SetupContext;
use crate::state::{map_sqlite_error, open_connection};
use crate::{ClientError, ClientResult};

/// Fields every ledger row carries, in canonical order.
pub(crate) const IMPORT_FIELDS: [&str; 4] = [
    "policy_id",
    "policy_number",
    "statement_date",
    "paid_override_amount",
];

#[derive(Debug, Clone)]
pub(crate) struct ImportExecutionResult {
    pub dry_run: bool,
    pub import_id: Option<String>,
    pub message: String,
    pub summary: ImportCreateSummary,
    pub policy_impact: ImportPolicyImpact,
    pub warnings: Vec<ImportWarning>,
    pub issues: Vec<ImportIssue>,
    pub next_step: ImportNextStep,
    pub source_used: String,
}

pub(crate) fn execute(
    setup: &SetupContext,
    path: Option<&str>,
    dry_run: bool,
    stdin_override: Option<String>,
) -> ClientResult<ImportExecutionResult> {
    let source = input::resolve_source(path, stdin_override)?;
    let parsed_rows = parse::parse_source(&source.content)?;
    let validated = validate::validate_rows(parsed_rows)?;

    let db_path = setup.db_path();
    let mut connection = open_connection(&db_path)?;
    let (policy_impact, warnings) = assess_policy_impact(&connection, &db_path, &validated.rows)?;

    if dry_run {
        return Ok(ImportExecutionResult {
            dry_run: true,
            import_id: None,
            message: "Validation passed. No rows were written.".to_string(),
            summary: ImportCreateSummary {
                rows_read: validated.summary.rows_read,
                rows_valid: validated.summary.rows_valid,
                rows_invalid: validated.summary.rows_invalid,
                inserted: 0,
            },
            policy_impact,
            warnings,
            issues: Vec::new(),
            next_step: ImportNextStep {
                label: "Commit this import".to_string(),
                command: match source.kind {
                    input::SourceKind::Stdin => "clawback import create -".to_string(),
                    input::SourceKind::File => "clawback import create <path>".to_string(),
                },
            },
            source_used: source.kind.as_str().to_string(),
        });
    }

    let persisted = persist::persist_import(
        &mut connection,
        &db_path,
        persist::PersistInput {
            rows: &validated.rows,
            rows_read: validated.summary.rows_read,
            rows_valid: validated.summary.rows_valid,
            rows_invalid: validated.summary.rows_invalid,
            source_kind: source.kind.as_str(),
            source_ref: source.source_ref.as_deref(),
        },
    )?;
    log::debug!(
        "import {} upserted {} policies",
        persisted.import_id,
        persisted.policies_upserted
    );

    Ok(ImportExecutionResult {
        dry_run: false,
        import_id: Some(persisted.import_id),
        message: "Import completed successfully.".to_string(),
        summary: ImportCreateSummary {
            rows_read: validated.summary.rows_read,
            rows_valid: validated.summary.rows_valid,
            rows_invalid: validated.summary.rows_invalid,
            inserted: persisted.inserted,
        },
        policy_impact,
        warnings,
        issues: Vec::new(),
        next_step: ImportNextStep {
            label: "Review the chargeback overview".to_string(),
            command: "clawback overview".to_string(),
        },
        source_used: source.kind.as_str().to_string(),
    })
}

/// Compares incoming policy numbers with the stored ones. A changed number is
/// not an error (the import overwrites it) but is surfaced as a warning.
fn assess_policy_impact(
    connection: &Connection,
    db_path: &Path,
    rows: &[validate::CommissionPayment],
) -> ClientResult<(ImportPolicyImpact, Vec<ImportWarning>)> {
    let incoming = rows
        .iter()
        .map(|row| (row.policy_id, row.policy_number.as_str()))
        .collect::<BTreeMap<i64, &str>>();

    let mut statement = connection
        .prepare("SELECT policy_number FROM internal_policies WHERE policy_id = ?1")
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut impact = ImportPolicyImpact::default();
    let mut warnings = Vec::new();
    for (policy_id, policy_number) in incoming {
        let stored = statement
            .query_row([policy_id], |row| row.get::<_, String>(0))
            .optional()
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        match stored {
            None => impact.new_policies += 1,
            Some(existing) => {
                impact.existing_policies += 1;
                if existing != policy_number {
                    impact.renumbered_policies += 1;
                    warnings.push(ImportWarning {
                        code: "policy_number_changed".to_string(),
                        message: format!(
                            "policy_id {policy_id} is stored as \"{existing}\" and will become \"{policy_number}\"."
                        ),
                    });
                }
            }
        }
    }

    Ok((impact, warnings))
}

pub(crate) fn invalid_input_error(message: &str) -> ClientError {
    ClientError::invalid_argument_with_recovery(
        message,
        vec![
            "Provide a JSON array or CSV ledger via a path or stdin.".to_string(),
            "Run `clawback import create --help` to confirm the ledger fields.".to_string(),
        ],
    )
    .with_import_help()
}
