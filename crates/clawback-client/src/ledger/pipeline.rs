use std::cmp::Ordering;

use crate::ledger::aggregate::summarize_ledger;
use crate::ledger::classify::classify_all;
use crate::ledger::distribution::{Distributions, distributions};
use crate::ledger::metrics::{OverviewMetrics, SegmentMetrics, overview_metrics, segment_metrics};
use crate::ledger::segment::{filter_by_range, resolve_range, segment_view};
use crate::ledger::timeseries::aggregate_time_series;
use crate::ledger::types::{
    AggregationInterval, ClassifiedSummary, DateRange, LedgerEntry, RangeRequest, Segment,
    TimeBucket,
};

/// One invocation of the reporting pipeline over a ledger snapshot.
///
/// The report owns the classified population; range and segment views borrow
/// from it.
#[derive(Debug, Clone)]
pub struct LedgerReport {
    population: Vec<ClassifiedSummary>,
    range: Option<DateRange>,
    dropped_invalid_dates: usize,
}

impl LedgerReport {
    pub fn build(entries: &[LedgerEntry], request: &RangeRequest) -> Self {
        let summarized = summarize_ledger(entries);
        if summarized.dropped_invalid_dates > 0 {
            log::warn!(
                "dropped {} policies with invalid statement dates",
                summarized.dropped_invalid_dates
            );
        }

        let population = classify_all(summarized.summaries);
        let range = resolve_range(&population, request);
        log::debug!(
            "ledger report: {} classified policies, range {:?}",
            population.len(),
            range
        );

        Self {
            population,
            range,
            dropped_invalid_dates: summarized.dropped_invalid_dates,
        }
    }

    pub fn population(&self) -> &[ClassifiedSummary] {
        &self.population
    }

    pub fn range(&self) -> Option<DateRange> {
        self.range
    }

    pub fn dropped_invalid_dates(&self) -> usize {
        self.dropped_invalid_dates
    }

    pub fn filtered(&self) -> Vec<&ClassifiedSummary> {
        filter_by_range(&self.population, self.range.as_ref())
    }

    pub fn segment(&self, segment: Segment) -> Vec<&ClassifiedSummary> {
        segment_view(&self.filtered(), segment)
    }

    /// Segment rows ordered newest first statement first, then by policy id.
    pub fn policy_rows(&self, segment: Segment) -> Vec<&ClassifiedSummary> {
        let mut rows = self.segment(segment);
        rows.sort_by(|left, right| presentation_order(left, right));
        rows
    }

    pub fn time_series(&self, segment: Segment, interval: AggregationInterval) -> Vec<TimeBucket> {
        aggregate_time_series(&self.segment(segment), interval)
    }

    pub fn distributions(&self, segment: Segment) -> Distributions {
        distributions(&self.segment(segment))
    }

    pub fn overview(&self) -> OverviewMetrics {
        overview_metrics(&self.filtered())
    }

    pub fn segment_metrics(&self, segment: Segment) -> SegmentMetrics {
        segment_metrics(&self.segment(segment))
    }
}

fn presentation_order(left: &ClassifiedSummary, right: &ClassifiedSummary) -> Ordering {
    right
        .first_statement_date()
        .cmp(&left.first_statement_date())
        .then_with(|| left.summary.policy_id.cmp(&right.summary.policy_id))
}
