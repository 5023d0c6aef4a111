use serde::Serialize;

use crate::ledger::types::{ClassifiedSummary, PolicyStatus};

/// Headline numbers for the unsegmented, range-filtered population.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverviewMetrics {
    pub total_policies: usize,
    pub active_policies: usize,
    pub charged_back_policies: usize,
    pub total_advanced: f64,
    pub total_chargebacks: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentMetrics {
    pub total_policies: usize,
    pub total_chargebacks: f64,
    pub avg_chargeback_per_policy: f64,
    pub avg_months_paid: f64,
}

pub fn overview_metrics(records: &[&ClassifiedSummary]) -> OverviewMetrics {
    let active_policies = records
        .iter()
        .filter(|record| record.status == PolicyStatus::Active)
        .count();
    OverviewMetrics {
        total_policies: records.len(),
        active_policies,
        charged_back_policies: records.len() - active_policies,
        total_advanced: records.iter().map(|record| record.summary.advance_amount).sum(),
        total_chargebacks: total_chargebacks(records),
    }
}

pub fn segment_metrics(records: &[&ClassifiedSummary]) -> SegmentMetrics {
    let total_chargebacks = total_chargebacks(records);
    let months_paid_total = records
        .iter()
        .map(|record| f64::from(record.months_paid))
        .sum::<f64>();
    SegmentMetrics {
        total_policies: records.len(),
        total_chargebacks,
        avg_chargeback_per_policy: average(total_chargebacks, records.len()),
        avg_months_paid: average(months_paid_total, records.len()),
    }
}

fn total_chargebacks(records: &[&ClassifiedSummary]) -> f64 {
    records
        .iter()
        .map(|record| record.summary.chargeback_amount)
        .sum()
}

fn average(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::ledger::classify::classify;
    use crate::ledger::metrics::{overview_metrics, segment_metrics};
    use crate::ledger::types::{ClassifiedSummary, PolicySummary};

    fn record(policy_id: i64, advance: f64, chargeback: f64) -> ClassifiedSummary {
        classify(PolicySummary {
            policy_id,
            policy_number: format!("POL-{policy_id}"),
            first_statement_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap_or(NaiveDate::MIN),
            advance_amount: advance,
            chargeback_amount: chargeback,
        })
    }

    #[test]
    fn overview_counts_statuses_and_sums_signed_amounts() {
        let records = vec![
            record(1, 1000.0, 0.0),
            record(2, 1200.0, -600.0),
            record(3, 800.0, -800.0),
        ];
        let refs = records.iter().collect::<Vec<&ClassifiedSummary>>();
        let metrics = overview_metrics(&refs);
        assert_eq!(metrics.total_policies, 3);
        assert_eq!(metrics.active_policies, 1);
        assert_eq!(metrics.charged_back_policies, 2);
        assert!((metrics.total_advanced - 3000.0).abs() < 1e-9);
        assert!((metrics.total_chargebacks + 1400.0).abs() < 1e-9);
    }

    #[test]
    fn segment_averages_use_segment_size() {
        let records = vec![record(2, 1200.0, -600.0), record(3, 1200.0, -300.0)];
        let refs = records.iter().collect::<Vec<&ClassifiedSummary>>();
        let metrics = segment_metrics(&refs);
        assert!((metrics.avg_chargeback_per_policy + 450.0).abs() < 1e-9);
        // months paid 6 and 9.
        assert!((metrics.avg_months_paid - 7.5).abs() < 1e-9);
    }

    #[test]
    fn empty_segment_reports_zero_averages() {
        let metrics = segment_metrics(&[]);
        assert_eq!(metrics.total_policies, 0);
        assert_eq!(metrics.avg_chargeback_per_policy, 0.0);
        assert_eq!(metrics.avg_months_paid, 0.0);
    }
}
