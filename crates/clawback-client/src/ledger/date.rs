use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::ledger::types::RangeRequest;
use crate::{ClientError, ClientResult};

pub fn build_range_request(
    from: Option<&str>,
    to: Option<&str>,
    command: &str,
) -> ClientResult<RangeRequest> {
    let parsed_from = match from {
        Some(value) => Some(parse_iso_date_strict(value, "from", command)?),
        None => None,
    };
    let parsed_to = match to {
        Some(value) => Some(parse_iso_date_strict(value, "to", command)?),
        None => None,
    };

    if let (Some(start), Some(end)) = (parsed_from, parsed_to)
        && start > end
    {
        return Err(ClientError::invalid_argument_for_command(
            "Invalid date range: `from` must be on or before `to`.",
            Some(command),
        ));
    }

    Ok(RangeRequest {
        from: parsed_from,
        to: parsed_to,
    })
}

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_year_month(date: &NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Lenient parse used for raw ledger values; surrounding whitespace is ignored
/// and anything that is not a real `YYYY-MM-DD` date yields `None`.
pub fn parse_statement_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if !looks_like_iso_date(trimmed) {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn week_start(date: NaiveDate, anchor: Weekday) -> NaiveDate {
    let offset = (7 + date.weekday().num_days_from_monday() - anchor.num_days_from_monday()) % 7;
    date - Duration::days(i64::from(offset))
}

fn parse_iso_date_strict(value: &str, field_name: &str, command: &str) -> ClientResult<NaiveDate> {
    if !looks_like_iso_date(value) {
        return Err(ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with a real calendar date."),
            Some(command),
        ));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with valid calendar values."),
            Some(command),
        )
    })
}

pub(crate) fn looks_like_iso_date(value: &str) -> bool {
    if value.len() != 10 {
        return false;
    }
    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return false;
        }
    }
    true
}
