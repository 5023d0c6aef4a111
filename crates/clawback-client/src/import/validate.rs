use std::collections::{BTreeMap, BTreeSet};

use crate::contracts::types::{ImportIssue, ImportSummary};
use crate::import::parse::ParsedRow;
use crate::ledger::date::{format_iso_date, parse_statement_date};
use crate::ledger::policy::REPORT_POLICY_V1;
use crate::{ClientError, ClientResult};

const AMOUNT_EXPECTATION: &str = "number with <= 2 decimal places (e.g. -600.00)";

/// A ledger row that passed validation, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CommissionPayment {
    pub(crate) policy_id: i64,
    pub(crate) policy_number: String,
    pub(crate) statement_date: String,
    pub(crate) paid_override_amount: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct ValidatedRows {
    pub(crate) rows: Vec<CommissionPayment>,
    pub(crate) summary: ImportSummary,
}

/// All-or-nothing: any issue fails the whole batch with every issue listed.
pub(crate) fn validate_rows(parsed_rows: Vec<ParsedRow>) -> ClientResult<ValidatedRows> {
    let rows_read = parsed_rows.len() as i64;
    let mut rows = Vec::new();
    let mut issues = Vec::new();
    let mut numbers_by_policy: BTreeMap<i64, String> = BTreeMap::new();

    for raw in parsed_rows {
        let mut row_issues = Vec::new();
        let policy_id = validate_policy_id(raw.row, raw.policy_id, &mut row_issues);
        let policy_number = validate_policy_number(raw.row, raw.policy_number, &mut row_issues);
        let statement_date = validate_statement_date(raw.row, raw.statement_date, &mut row_issues);
        let amount = validate_amount(raw.row, raw.paid_override_amount, &mut row_issues);

        if let (Some(id), Some(number)) = (policy_id, policy_number.as_deref()) {
            match numbers_by_policy.get(&id) {
                Some(seen) if seen != number => row_issues.push(ImportIssue {
                    row: raw.row,
                    field: "policy_number".to_string(),
                    code: "conflicting_policy_number".to_string(),
                    description: format!(
                        "policy_id {id} already uses policy_number \"{seen}\" earlier in this import."
                    ),
                    expected: Some(seen.clone()),
                    received: Some(number.to_string()),
                }),
                Some(_) => {}
                None => {
                    numbers_by_policy.insert(id, number.to_string());
                }
            }
        }

        match (policy_id, policy_number, statement_date, amount) {
            (Some(policy_id), Some(policy_number), Some(statement_date), Some(amount))
                if row_issues.is_empty() =>
            {
                rows.push(CommissionPayment {
                    policy_id,
                    policy_number,
                    statement_date,
                    paid_override_amount: amount,
                });
            }
            _ => issues.extend(row_issues),
        }
    }

    let summary = ImportSummary {
        rows_read,
        rows_valid: rows.len() as i64,
        rows_invalid: issues
            .iter()
            .map(|issue| issue.row)
            .collect::<BTreeSet<i64>>()
            .len() as i64,
    };

    if !issues.is_empty() {
        return Err(ClientError::import_validation_failed(summary, issues));
    }

    Ok(ValidatedRows { rows, summary })
}

fn validate_policy_id(row: i64, value: Option<String>, issues: &mut Vec<ImportIssue>) -> Option<i64> {
    let Some(candidate) = normalize(value) else {
        issues.push(missing(row, "policy_id", "integer"));
        return None;
    };
    match candidate.parse::<i64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            issues.push(ImportIssue {
                row,
                field: "policy_id".to_string(),
                code: "invalid_integer".to_string(),
                description: format!("policy_id must be a whole number; got \"{candidate}\""),
                expected: Some("integer".to_string()),
                received: Some(candidate),
            });
            None
        }
    }
}

fn validate_policy_number(
    row: i64,
    value: Option<String>,
    issues: &mut Vec<ImportIssue>,
) -> Option<String> {
    let normalized = normalize(value);
    if normalized.is_none() {
        issues.push(missing(row, "policy_number", "non-empty string"));
    }
    normalized
}

fn validate_statement_date(
    row: i64,
    value: Option<String>,
    issues: &mut Vec<ImportIssue>,
) -> Option<String> {
    let Some(candidate) = normalize(value) else {
        issues.push(missing(row, "statement_date", "YYYY-MM-DD"));
        return None;
    };

    let Some(parsed) = parse_statement_date(&candidate) else {
        issues.push(ImportIssue {
            row,
            field: "statement_date".to_string(),
            code: "invalid_date".to_string(),
            description: format!(
                "statement_date must be a real YYYY-MM-DD calendar date; got \"{candidate}\""
            ),
            expected: Some("YYYY-MM-DD".to_string()),
            received: Some(candidate),
        });
        return None;
    };

    if !REPORT_POLICY_V1.accepts_statement_date(parsed) {
        issues.push(ImportIssue {
            row,
            field: "statement_date".to_string(),
            code: "date_out_of_range".to_string(),
            description: format!(
                "statement_date must fall between {} and {}; got \"{candidate}\"",
                REPORT_POLICY_V1.earliest_statement_date, REPORT_POLICY_V1.latest_statement_date
            ),
            expected: Some("YYYY-MM-DD within the supported range".to_string()),
            received: Some(candidate),
        });
        return None;
    }

    Some(format_iso_date(&parsed))
}

fn validate_amount(row: i64, value: Option<String>, issues: &mut Vec<ImportIssue>) -> Option<f64> {
    let Some(candidate) = normalize(value) else {
        issues.push(missing(row, "paid_override_amount", AMOUNT_EXPECTATION));
        return None;
    };

    let amount = candidate.parse::<f64>().ok().filter(|parsed| parsed.is_finite());
    let Some(amount) = amount else {
        issues.push(ImportIssue {
            row,
            field: "paid_override_amount".to_string(),
            code: "invalid_number".to_string(),
            description: format!("paid_override_amount must be numeric; got \"{candidate}\""),
            expected: Some(AMOUNT_EXPECTATION.to_string()),
            received: Some(candidate),
        });
        return None;
    };

    if let Some(scale) = fractional_digits(&candidate)
        && scale > 2
    {
        issues.push(ImportIssue {
            row,
            field: "paid_override_amount".to_string(),
            code: "invalid_amount_scale".to_string(),
            description: format!(
                "paid_override_amount must use at most 2 decimal places; got {scale}."
            ),
            expected: Some(AMOUNT_EXPECTATION.to_string()),
            received: Some(candidate),
        });
        return None;
    }

    Some(amount)
}

/// Decimal places implied by a numeric literal, accounting for an exponent.
fn fractional_digits(value: &str) -> Option<usize> {
    let (mantissa, exponent) = match value.find(['e', 'E']) {
        Some(index) => (&value[..index], value[index + 1..].parse::<i32>().ok()?),
        None => (value, 0),
    };
    let unsigned = mantissa.trim_start_matches(['+', '-']);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().chain(fraction.chars()).all(|character| character.is_ascii_digit()) {
        return None;
    }

    let scale = fraction.len();
    if exponent >= 0 {
        Some(scale.saturating_sub(exponent.unsigned_abs() as usize))
    } else {
        Some(scale.saturating_add(exponent.unsigned_abs() as usize))
    }
}

fn missing(row: i64, field: &str, expected: &str) -> ImportIssue {
    ImportIssue {
        row,
        field: field.to_string(),
        code: "missing_required_field".to_string(),
        description: format!("{field} must be present and non-empty."),
        expected: Some(expected.to_string()),
        received: Some(String::new()),
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
