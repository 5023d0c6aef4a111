use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::ledger::date::{month_start, week_start};
use crate::ledger::policy::{REPORT_POLICY_V1, ReportPolicy};
use crate::ledger::types::{AggregationInterval, ClassifiedSummary, TimeBucket};

#[derive(Debug, Default)]
struct BucketTotals {
    advance_total: f64,
    chargeback_total: f64,
    count: usize,
    months_paid_total: u64,
}

pub fn bucket_start(date: NaiveDate, interval: AggregationInterval, policy: ReportPolicy) -> NaiveDate {
    match interval {
        AggregationInterval::Day => date,
        AggregationInterval::Week => week_start(date, policy.week_start),
        AggregationInterval::Month => month_start(date),
    }
}

/// Buckets records by first statement date. Periods without records are omitted.
pub fn aggregate_time_series(
    records: &[&ClassifiedSummary],
    interval: AggregationInterval,
) -> Vec<TimeBucket> {
    aggregate_time_series_with_policy(records, interval, REPORT_POLICY_V1)
}

pub(crate) fn aggregate_time_series_with_policy(
    records: &[&ClassifiedSummary],
    interval: AggregationInterval,
    policy: ReportPolicy,
) -> Vec<TimeBucket> {
    let mut buckets: BTreeMap<NaiveDate, BucketTotals> = BTreeMap::new();
    for record in records {
        let start = bucket_start(record.first_statement_date(), interval, policy);
        let totals = buckets.entry(start).or_default();
        totals.advance_total += record.summary.advance_amount;
        totals.chargeback_total += record.summary.chargeback_amount.abs();
        totals.count += 1;
        totals.months_paid_total += u64::from(record.months_paid);
    }

    buckets
        .into_iter()
        .map(|(period_start, totals)| TimeBucket {
            period_start,
            advance_total: totals.advance_total,
            chargeback_total: totals.chargeback_total,
            count: totals.count,
            mean_months_paid: mean(totals.months_paid_total, totals.count),
        })
        .collect()
}

fn mean(total: u64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total as f64 / count as f64
}
