use serde::Serialize;

use crate::ledger::distribution::{HeatmapCell, MonthsPaidCount, StatusCount};
use crate::ledger::metrics::{OverviewMetrics, SegmentMetrics};
use crate::ledger::types::{AggregationInterval, PolicyStatus, Segment};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportData {
    pub dry_run: bool,
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_id: Option<String>,
    pub message: String,
    pub summary: ImportCreateSummary,
    pub policy_impact: ImportPolicyImpact,
    pub warnings: Vec<ImportWarning>,
    pub issues: Vec<ImportIssue>,
    pub next_step: ImportNextStep,
    pub source_used: String,
    pub data_range: DataRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportNextStep {
    pub label: String,
    pub command: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportCreateSummary {
    pub rows_read: i64,
    pub rows_valid: i64,
    pub rows_invalid: i64,
    pub inserted: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub rows_read: i64,
    pub rows_valid: i64,
    pub rows_invalid: i64,
}

/// How an import touches the policy table: ids seen for the first time,
/// ids already present, and ids whose stored policy number will change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportPolicyImpact {
    pub new_policies: i64,
    pub existing_policies: i64,
    pub renumbered_policies: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportIssue {
    pub row: i64,
    pub field: String,
    pub code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportWarning {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportListItem {
    pub import_id: String,
    pub status: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed_at: Option<String>,
    pub rows_read: i64,
    pub rows_valid: i64,
    pub rows_invalid: i64,
    pub inserted: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportListData {
    pub rows: Vec<ImportListItem>,
}

/// Parameters and diagnostics shared by every report command.
#[derive(Debug, Clone, Serialize)]
pub struct ReportScope {
    pub segment: Segment,
    pub segment_label: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub policy_version: String,
    pub dropped_invalid_dates: usize,
    pub data_range: DataRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyRow {
    pub policy_id: i64,
    pub policy_number: String,
    pub first_statement_date: String,
    pub advance_amount: f64,
    pub chargeback_amount: f64,
    pub cb_fraction: f64,
    pub months_paid: u8,
    pub status: PolicyStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoliciesData {
    pub scope: ReportScope,
    pub metrics: SegmentMetrics,
    pub rows: Vec<PolicyRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeBucketRow {
    pub period_start: String,
    pub advance_total: f64,
    pub chargeback_total: f64,
    pub count: usize,
    pub mean_months_paid: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesData {
    pub scope: ReportScope,
    pub interval: AggregationInterval,
    pub buckets: Vec<TimeBucketRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionData {
    pub scope: ReportScope,
    pub status_counts: Vec<StatusCount>,
    pub months_paid: Vec<MonthsPaidCount>,
    pub heatmap: Vec<HeatmapCell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentOverview {
    pub segment: Segment,
    pub label: String,
    pub metrics: SegmentMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewData {
    pub scope: ReportScope,
    pub totals: OverviewMetrics,
    pub segments: Vec<SegmentOverview>,
}
