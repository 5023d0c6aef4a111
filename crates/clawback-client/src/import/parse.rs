use std::collections::HashMap;

use serde_json::Value;

use crate::import::{IMPORT_FIELDS, invalid_input_error};
use crate::{ClientError, ClientResult};

/// One source row with every field still as raw text.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParsedRow {
    pub(crate) row: i64,
    pub(crate) policy_id: Option<String>,
    pub(crate) policy_number: Option<String>,
    pub(crate) statement_date: Option<String>,
    pub(crate) paid_override_amount: Option<String>,
}

pub(crate) fn parse_source(content: &str) -> ClientResult<Vec<ParsedRow>> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(invalid_input_error("Import source is empty."));
    }

    if trimmed.starts_with('[') {
        return parse_json_array(trimmed);
    }

    if serde_json::from_str::<Value>(trimmed).is_ok() {
        return Err(ClientError::invalid_import_format(
            "JSON input must be a top-level array of ledger row objects.",
            "json_non_array",
        ));
    }

    if first_line_has_delimiter(trimmed) {
        return parse_csv(trimmed);
    }

    Err(ClientError::invalid_import_format(
        "Unsupported import format. Provide a JSON array or CSV with headers.",
        "unknown",
    ))
}

fn parse_json_array(content: &str) -> ClientResult<Vec<ParsedRow>> {
    let parsed = serde_json::from_str::<Value>(content)
        .map_err(|_| invalid_input_error("Invalid JSON input. Provide a valid JSON array."))?;
    let Some(items) = parsed.as_array() else {
        return Err(invalid_input_error(
            "JSON input must be a top-level array of ledger row objects.",
        ));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let object = item.as_object().ok_or_else(|| {
                invalid_input_error("JSON array entries must all be objects with ledger fields.")
            })?;
            Ok(ParsedRow {
                row: (index as i64) + 1,
                policy_id: json_text(object.get("policy_id")),
                policy_number: json_text(object.get("policy_number")),
                statement_date: json_text(object.get("statement_date")),
                paid_override_amount: json_text(object.get("paid_override_amount")),
            })
        })
        .collect()
}

fn parse_csv(content: &str) -> ClientResult<Vec<ParsedRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|_| invalid_input_error("CSV header row is missing or unreadable."))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<String>>();

    if !headers_match(&headers) {
        return Err(ClientError::import_schema_mismatch(
            IMPORT_FIELDS.iter().map(|name| name.to_string()).collect(),
            headers,
        ));
    }

    let column_of = headers
        .iter()
        .enumerate()
        .map(|(index, name)| (name.as_str(), index))
        .collect::<HashMap<&str, usize>>();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record =
            record.map_err(|_| invalid_input_error("CSV rows are malformed or not UTF-8."))?;
        let cell = |name: &str| {
            column_of
                .get(name)
                .and_then(|column| record.get(*column))
                .map(str::to_string)
        };
        rows.push(ParsedRow {
            row: (index as i64) + 1,
            policy_id: cell("policy_id"),
            policy_number: cell("policy_number"),
            statement_date: cell("statement_date"),
            paid_override_amount: cell("paid_override_amount"),
        });
    }

    Ok(rows)
}

// Integers are kept exact; other numbers go through their JSON text form.
fn json_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

fn first_line_has_delimiter(content: &str) -> bool {
    content
        .lines()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| line.contains(','))
}

fn headers_match(headers: &[String]) -> bool {
    headers.len() == IMPORT_FIELDS.len()
        && IMPORT_FIELDS
            .iter()
            .all(|field| headers.iter().filter(|header| header == field).count() == 1)
}
