use std::path::Path;

use crate::contracts::types::{PolicyRow, ReportScope, TimeBucketRow};
use crate::ledger::date::{build_range_request, format_iso_date};
use crate::ledger::pipeline::LedgerReport;
use crate::ledger::policy::REPORT_POLICY_VERSION;
use crate::ledger::types::{
    AggregationInterval, ClassifiedSummary, RangeRequest, Segment, TimeBucket,
};
use crate::setup::{SetupContext, ensure_initialized, ensure_initialized_at};
use crate::{ClientError, ClientResult};

/// Raw report parameters as they arrive from a caller. Everything is
/// validated before the ledger is touched.
#[derive(Debug, Default, Clone)]
pub struct ReportRunOptions<'a> {
    pub from: Option<String>,
    pub to: Option<String>,
    pub segment: Option<String>,
    pub interval: Option<String>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ReportParameters {
    pub range: RangeRequest,
    pub segment: Segment,
    pub interval: AggregationInterval,
}

pub(crate) fn parse_report_parameters(
    options: &ReportRunOptions<'_>,
    command: &str,
) -> ClientResult<ReportParameters> {
    Ok(ReportParameters {
        range: build_range_request(options.from.as_deref(), options.to.as_deref(), command)?,
        segment: parse_segment(options.segment.as_deref(), command)?,
        interval: parse_interval(options.interval.as_deref(), command)?,
    })
}

pub(crate) fn parse_segment(value: Option<&str>, command: &str) -> ClientResult<Segment> {
    match value {
        None => Ok(Segment::All),
        Some(raw) => Segment::parse(raw).ok_or_else(|| ClientError::invalid_segment(raw, command)),
    }
}

pub(crate) fn parse_interval(value: Option<&str>, command: &str) -> ClientResult<AggregationInterval> {
    match value {
        None => Ok(AggregationInterval::Month),
        Some(raw) => AggregationInterval::parse(raw)
            .ok_or_else(|| ClientError::invalid_interval(raw, command)),
    }
}

pub(crate) fn load_setup(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    match home_override {
        Some(home) => ensure_initialized_at(home),
        None => ensure_initialized(),
    }
}

pub(crate) fn report_scope(
    report: &LedgerReport,
    segment: Segment,
    setup: &SetupContext,
) -> ReportScope {
    let range = report.range();
    ReportScope {
        segment,
        segment_label: segment.label().to_string(),
        from: range.map(|value| format_iso_date(&value.start)),
        to: range.map(|value| format_iso_date(&value.end)),
        policy_version: REPORT_POLICY_VERSION.to_string(),
        dropped_invalid_dates: report.dropped_invalid_dates(),
        data_range: setup.data_range.clone(),
    }
}

pub(crate) fn policy_row(record: &ClassifiedSummary) -> PolicyRow {
    PolicyRow {
        policy_id: record.summary.policy_id,
        policy_number: record.summary.policy_number.clone(),
        first_statement_date: format_iso_date(&record.first_statement_date()),
        advance_amount: record.summary.advance_amount,
        chargeback_amount: record.summary.chargeback_amount,
        cb_fraction: record.cb_fraction,
        months_paid: record.months_paid,
        status: record.status,
    }
}

pub(crate) fn time_bucket_row(bucket: &TimeBucket) -> TimeBucketRow {
    TimeBucketRow {
        period_start: format_iso_date(&bucket.period_start),
        advance_total: bucket.advance_total,
        chargeback_total: bucket.chargeback_total,
        count: bucket.count,
        mean_months_paid: bucket.mean_months_paid,
    }
}
