use std::collections::{BTreeMap, BTreeSet};
use std::io;

use serde_json::Value;

use super::format::{self, Column, format_decimal, format_money, format_percent};

pub fn render_policies(data: &Value) -> io::Result<String> {
    let rows = required_array(data, "rows", "policies")?;
    let mut lines = render_scope(data)?;

    lines.push(String::new());
    lines.extend(render_segment_metrics(data.get("metrics")));
    lines.push(String::new());

    if rows.is_empty() {
        lines.push("No policies match this segment and date range.".to_string());
        return Ok(lines.join("\n"));
    }

    let columns = [
        Column::right("Policy ID"),
        Column::left("Policy Number"),
        Column::left("First Statement"),
        Column::right("Advance"),
        Column::right("Chargeback"),
        Column::right("CB %"),
        Column::right("Months Paid"),
        Column::left("Status"),
    ];
    let table_rows = rows
        .iter()
        .map(|row| {
            vec![
                number_i64(row, "policy_id").to_string(),
                text(row, "policy_number").to_string(),
                text(row, "first_statement_date").to_string(),
                format_money(number_f64(row, "advance_amount")),
                format_money(number_f64(row, "chargeback_amount")),
                format_percent(number_f64(row, "cb_fraction")),
                number_i64(row, "months_paid").to_string(),
                status_label(text(row, "status")).to_string(),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    lines.extend(format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Policy",
    ));
    Ok(lines.join("\n"))
}

pub fn render_timeseries(data: &Value) -> io::Result<String> {
    let buckets = required_array(data, "buckets", "timeseries")?;
    let interval = data
        .get("interval")
        .and_then(Value::as_str)
        .unwrap_or("month");
    let mut lines = render_scope(data)?;
    lines.extend(format::key_value_rows(&[("Interval:", interval.to_string())], 2));
    lines.push(String::new());

    if buckets.is_empty() {
        lines.push("No policies fall inside this date range.".to_string());
        return Ok(lines.join("\n"));
    }

    let columns = [
        Column::left("Period Start"),
        Column::right("Policies"),
        Column::right("Advanced"),
        Column::right("Chargebacks"),
        Column::right("Mean Months Paid"),
    ];
    let table_rows = buckets
        .iter()
        .map(|bucket| {
            vec![
                text(bucket, "period_start").to_string(),
                number_i64(bucket, "count").to_string(),
                format_money(number_f64(bucket, "advance_total")),
                format_money(number_f64(bucket, "chargeback_total")),
                format_decimal(number_f64(bucket, "mean_months_paid")),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    lines.extend(format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Bucket",
    ));
    Ok(lines.join("\n"))
}

pub fn render_distribution(data: &Value) -> io::Result<String> {
    let status_counts = required_array(data, "status_counts", "distribution")?;
    let months_paid = required_array(data, "months_paid", "distribution")?;
    let heatmap = required_array(data, "heatmap", "distribution")?;
    let mut lines = render_scope(data)?;

    lines.push(String::new());
    lines.push("Status:".to_string());
    let status_labels = status_counts
        .iter()
        .map(|entry| format!("{}:", text(entry, "label")))
        .collect::<Vec<String>>();
    let status_entries = status_labels
        .iter()
        .zip(status_counts)
        .map(|(label, entry)| (label.as_str(), number_i64(entry, "count").to_string()))
        .collect::<Vec<(&str, String)>>();
    lines.extend(format::key_value_rows(&status_entries, 2));

    lines.push(String::new());
    lines.push("Months paid before chargeback:".to_string());
    if months_paid.is_empty() {
        lines.push("  No charged-back policies.".to_string());
    } else {
        let rows = months_paid
            .iter()
            .map(|entry| {
                vec![
                    number_i64(entry, "months_paid").to_string(),
                    number_i64(entry, "count").to_string(),
                ]
            })
            .collect::<Vec<Vec<String>>>();
        lines.extend(format::render_table_or_blocks(
            &[Column::right("Months Paid"), Column::right("Policies")],
            &rows,
            format::terminal_width(),
            "Bucket",
        ));
    }

    lines.push(String::new());
    lines.push("Charged-back policies by first statement month:".to_string());
    if heatmap.is_empty() {
        lines.push("  No charged-back policies.".to_string());
    } else {
        lines.extend(render_heatmap_grid(heatmap));
    }

    Ok(lines.join("\n"))
}

pub fn render_overview(data: &Value) -> io::Result<String> {
    let totals = data
        .get("totals")
        .ok_or_else(|| io::Error::other("overview output requires totals"))?;
    let segments = required_array(data, "segments", "overview")?;
    let mut lines = render_scope(data)?;

    lines.push(String::new());
    lines.push("Totals:".to_string());
    lines.extend(format::key_value_rows(
        &[
            ("Policies:", number_i64(totals, "total_policies").to_string()),
            ("Active:", number_i64(totals, "active_policies").to_string()),
            (
                "Charged back:",
                number_i64(totals, "charged_back_policies").to_string(),
            ),
            ("Advanced:", format_money(number_f64(totals, "total_advanced"))),
            (
                "Chargebacks:",
                format_money(number_f64(totals, "total_chargebacks")),
            ),
        ],
        2,
    ));

    lines.push(String::new());
    lines.push("Segments:".to_string());
    let columns = [
        Column::left("Segment"),
        Column::right("Policies"),
        Column::right("Chargebacks"),
        Column::right("Avg CB / Policy"),
        Column::right("Avg Months Paid"),
    ];
    let table_rows = segments
        .iter()
        .map(|segment| {
            let metrics = segment.get("metrics").unwrap_or(&Value::Null);
            vec![
                text(segment, "label").to_string(),
                number_i64(metrics, "total_policies").to_string(),
                format_money(number_f64(metrics, "total_chargebacks")),
                format_money(number_f64(metrics, "avg_chargeback_per_policy")),
                format_decimal(number_f64(metrics, "avg_months_paid")),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    lines.extend(format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Segment",
    ));

    Ok(lines.join("\n"))
}

/// Header shared by every report: segment, effective range and the
/// invalid-date diagnostic when anything was dropped.
fn render_scope(data: &Value) -> io::Result<Vec<String>> {
    let scope = data
        .get("scope")
        .ok_or_else(|| io::Error::other("report output requires scope"))?;

    let range = match (
        scope.get("from").and_then(Value::as_str),
        scope.get("to").and_then(Value::as_str),
    ) {
        (Some(from), Some(to)) => format!("{from} to {to}"),
        _ => "no data".to_string(),
    };

    let mut lines = vec![format!("{} ({range})", text(scope, "segment_label"))];
    let dropped = number_i64(scope, "dropped_invalid_dates");
    if dropped > 0 {
        let noun = if dropped == 1 { "policy" } else { "policies" };
        lines.push(format!(
            "Note: {dropped} {noun} skipped because of invalid statement dates."
        ));
    }
    Ok(lines)
}

fn render_segment_metrics(metrics: Option<&Value>) -> Vec<String> {
    let metrics = metrics.unwrap_or(&Value::Null);
    format::key_value_rows(
        &[
            ("Policies:", number_i64(metrics, "total_policies").to_string()),
            (
                "Chargebacks:",
                format_money(number_f64(metrics, "total_chargebacks")),
            ),
            (
                "Avg CB / policy:",
                format_money(number_f64(metrics, "avg_chargeback_per_policy")),
            ),
            (
                "Avg months paid:",
                format_decimal(number_f64(metrics, "avg_months_paid")),
            ),
        ],
        2,
    )
}

/// Pivot of the long-form heatmap cells: one row per month, one column per
/// months-paid value that occurs anywhere in the data.
fn render_heatmap_grid(cells: &[Value]) -> Vec<String> {
    let mut grid: BTreeMap<&str, BTreeMap<i64, i64>> = BTreeMap::new();
    let mut months_paid_values = BTreeSet::new();
    for cell in cells {
        let months_paid = number_i64(cell, "months_paid");
        months_paid_values.insert(months_paid);
        grid.entry(text(cell, "year_month"))
            .or_default()
            .insert(months_paid, number_i64(cell, "count"));
    }

    let headers = months_paid_values
        .iter()
        .map(i64::to_string)
        .collect::<Vec<String>>();
    let mut columns = vec![Column::left("Month")];
    columns.extend(headers.iter().map(|header| Column::right(header.as_str())));

    let rows = grid
        .iter()
        .map(|(year_month, counts)| {
            let mut row = vec![(*year_month).to_string()];
            row.extend(months_paid_values.iter().map(|months_paid| {
                counts
                    .get(months_paid)
                    .map_or_else(|| ".".to_string(), i64::to_string)
            }));
            row
        })
        .collect::<Vec<Vec<String>>>();

    format::render_table_or_blocks(&columns, &rows, format::terminal_width(), "Month")
}

fn status_label(status: &str) -> &str {
    match status {
        "active" => "Active",
        "charged_back" => "Charged Back",
        other => other,
    }
}

fn required_array<'a>(data: &'a Value, key: &str, command: &str) -> io::Result<&'a Vec<Value>> {
    data.get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other(format!("{command} output requires {key}")))
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn number_i64(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn number_f64(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}
