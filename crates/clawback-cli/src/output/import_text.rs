use std::io;

use chrono::{Local, TimeZone};
use serde_json::{Map, Value};

use super::format::{self, Column};

pub fn render_import_run(data: &Value) -> io::Result<String> {
    let dry_run = data
        .get("dry_run")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let summary = data
        .get("summary")
        .and_then(Value::as_object)
        .ok_or_else(|| io::Error::other("import output requires summary"))?;

    let mut lines = vec![
        data.get("message")
            .and_then(Value::as_str)
            .unwrap_or("Import finished.")
            .to_string(),
        String::new(),
        "Summary:".to_string(),
    ];

    let mut entries = Vec::new();
    if let Some(import_id) = data.get("import_id").and_then(Value::as_str) {
        entries.push(("Import ID:", import_id.to_string()));
    }
    entries.push(("Source:", source_label(data)));
    entries.push(("Rows read:", get_i64(summary, "rows_read").to_string()));
    entries.push(("Rows valid:", get_i64(summary, "rows_valid").to_string()));
    entries.push(("Rows invalid:", get_i64(summary, "rows_invalid").to_string()));
    entries.push(("Inserted:", get_i64(summary, "inserted").to_string()));
    lines.extend(format::key_value_rows(&entries, 2));

    if let Some(impact) = data.get("policy_impact").and_then(Value::as_object) {
        lines.push(String::new());
        lines.push("Policies:".to_string());
        lines.extend(format::key_value_rows(
            &[
                ("New:", get_i64(impact, "new_policies").to_string()),
                ("Already known:", get_i64(impact, "existing_policies").to_string()),
                ("Renumbered:", get_i64(impact, "renumbered_policies").to_string()),
            ],
            2,
        ));
    }

    let warnings = render_warnings(data);
    if !warnings.is_empty() {
        lines.push(String::new());
        lines.push("Warnings:".to_string());
        lines.extend(warnings);
    }

    if !dry_run && let Some(range) = render_data_range(data) {
        lines.push(String::new());
        lines.push(range);
    }

    if dry_run {
        lines.push(String::new());
        lines.push("No rows were written because this was a dry run.".to_string());
    }

    if let Some(next) = data.get("next_step").and_then(Value::as_object) {
        let label = next.get("label").and_then(Value::as_str).unwrap_or("Next");
        let command = next.get("command").and_then(Value::as_str).unwrap_or("");
        lines.push(String::new());
        lines.push("What to do next:".to_string());
        lines.push(format!("  {label}: {command}"));
    }

    Ok(lines.join("\n"))
}

pub fn render_import_list(data: &Value) -> io::Result<String> {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("import list output requires rows"))?;

    if rows.is_empty() {
        return Ok([
            "No imports found yet.",
            "",
            "Run your first import:",
            "  1. clawback import create --help",
            "  2. clawback import create --dry-run <path>",
            "  3. clawback import create <path>",
        ]
        .join("\n"));
    }

    let count_label = if rows.len() == 1 {
        "1 import found.".to_string()
    } else {
        format!("{} imports found.", rows.len())
    };

    let columns = [
        Column::left("Import ID"),
        Column::left("Status"),
        Column::left("Created (local)"),
        Column::right("Rows Read"),
        Column::right("Inserted"),
        Column::left("Source"),
    ];
    let table_rows = rows
        .iter()
        .map(|row| {
            vec![
                value_str(row, "import_id").to_string(),
                value_str(row, "status").to_string(),
                format_created_local(row),
                value_i64(row, "rows_read").to_string(),
                value_i64(row, "inserted").to_string(),
                value_str(row, "source_ref").to_string(),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec![count_label, String::new()];
    lines.extend(format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Import",
    ));
    Ok(lines.join("\n"))
}

fn source_label(data: &Value) -> String {
    match data.get("source_used").and_then(Value::as_str) {
        Some("stdin") => "stdin".to_string(),
        Some(other) => other.to_string(),
        None => data
            .get("path")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
    }
}

fn render_warnings(data: &Value) -> Vec<String> {
    data.get("warnings")
        .and_then(Value::as_array)
        .map(|warnings| {
            warnings
                .iter()
                .filter_map(|warning| warning.get("message").and_then(Value::as_str))
                .map(|message| format!("  - {message}"))
                .collect()
        })
        .unwrap_or_default()
}

fn render_data_range(data: &Value) -> Option<String> {
    let range = data.get("data_range")?;
    let earliest = range.get("earliest").and_then(Value::as_str)?;
    let latest = range.get("latest").and_then(Value::as_str)?;
    Some(format!("Ledger now covers statements from {earliest} to {latest}."))
}

fn format_created_local(row: &Value) -> String {
    let Some(seconds) = parse_created_at(row) else {
        return value_str(row, "created_at").to_string();
    };
    match Local.timestamp_opt(seconds, 0).single() {
        Some(local) => local.format("%Y-%m-%d %H:%M").to_string(),
        None => seconds.to_string(),
    }
}

fn parse_created_at(row: &Value) -> Option<i64> {
    let raw = row.get("created_at")?;
    raw.as_i64()
        .or_else(|| raw.as_str().and_then(|text| text.parse::<i64>().ok()))
}

fn get_i64(map: &Map<String, Value>, key: &str) -> i64 {
    map.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn value_i64(row: &Value, key: &str) -> i64 {
    row.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn value_str<'a>(row: &'a Value, key: &str) -> &'a str {
    row.get(key).and_then(Value::as_str).unwrap_or("")
}
