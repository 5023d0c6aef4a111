use std::collections::BTreeMap;

use serde::Serialize;

use crate::ledger::date::format_year_month;
use crate::ledger::types::{ClassifiedSummary, PolicyStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: PolicyStatus,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthsPaidCount {
    pub months_paid: u8,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapCell {
    pub year_month: String,
    pub months_paid: u8,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Distributions {
    pub status_counts: Vec<StatusCount>,
    pub months_paid: Vec<MonthsPaidCount>,
    pub heatmap: Vec<HeatmapCell>,
}

pub fn distributions(records: &[&ClassifiedSummary]) -> Distributions {
    Distributions {
        status_counts: status_counts(records),
        months_paid: months_paid_histogram(records),
        heatmap: month_heatmap(records),
    }
}

/// Always reports both statuses, with zero counts where absent.
pub fn status_counts(records: &[&ClassifiedSummary]) -> Vec<StatusCount> {
    [PolicyStatus::Active, PolicyStatus::ChargedBack]
        .into_iter()
        .map(|status| StatusCount {
            status,
            label: status.label().to_string(),
            count: records.iter().filter(|record| record.status == status).count(),
        })
        .collect()
}

pub fn months_paid_histogram(records: &[&ClassifiedSummary]) -> Vec<MonthsPaidCount> {
    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for record in records.iter().filter(|record| record.is_charged_back()) {
        *counts.entry(record.months_paid).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(months_paid, count)| MonthsPaidCount { months_paid, count })
        .collect()
}

pub fn month_heatmap(records: &[&ClassifiedSummary]) -> Vec<HeatmapCell> {
    let mut counts: BTreeMap<(String, u8), usize> = BTreeMap::new();
    for record in records.iter().filter(|record| record.is_charged_back()) {
        let key = (
            format_year_month(&record.first_statement_date()),
            record.months_paid,
        );
        *counts.entry(key).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((year_month, months_paid), count)| HeatmapCell {
            year_month,
            months_paid,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::ledger::classify::classify;
    use crate::ledger::distribution::{distributions, month_heatmap, months_paid_histogram};
    use crate::ledger::types::{ClassifiedSummary, PolicyStatus, PolicySummary};

    fn record(policy_id: i64, first: &str, advance: f64, chargeback: f64) -> ClassifiedSummary {
        classify(PolicySummary {
            policy_id,
            policy_number: format!("POL-{policy_id}"),
            first_statement_date: NaiveDate::parse_from_str(first, "%Y-%m-%d")
                .unwrap_or(NaiveDate::MIN),
            advance_amount: advance,
            chargeback_amount: chargeback,
        })
    }

    fn fixture() -> Vec<ClassifiedSummary> {
        vec![
            record(1, "2024-01-10", 1200.0, 0.0),
            record(2, "2024-01-12", 1200.0, -1200.0),
            record(3, "2024-01-30", 1200.0, -600.0),
            record(4, "2024-02-02", 1200.0, -1200.0),
            record(5, "2024-02-14", 1200.0, -600.0),
            record(6, "2024-02-20", 1200.0, -600.0),
        ]
    }

    #[test]
    fn status_counts_cover_both_statuses() {
        let records = fixture();
        let refs = records.iter().collect::<Vec<&ClassifiedSummary>>();
        let result = distributions(&refs);
        assert_eq!(result.status_counts.len(), 2);
        assert_eq!(result.status_counts[0].status, PolicyStatus::Active);
        assert_eq!(result.status_counts[0].count, 1);
        assert_eq!(result.status_counts[1].label, "Charged Back");
        assert_eq!(result.status_counts[1].count, 5);
    }

    #[test]
    fn months_paid_histogram_skips_active_and_sorts_ascending() {
        let records = fixture();
        let refs = records.iter().collect::<Vec<&ClassifiedSummary>>();
        let histogram = months_paid_histogram(&refs);
        let pairs = histogram
            .iter()
            .map(|row| (row.months_paid, row.count))
            .collect::<Vec<(u8, usize)>>();
        assert_eq!(pairs, vec![(0, 2), (6, 3)]);
    }

    #[test]
    fn heatmap_counts_year_month_and_months_paid_pairs() {
        let records = fixture();
        let refs = records.iter().collect::<Vec<&ClassifiedSummary>>();
        let cells = month_heatmap(&refs);
        let triples = cells
            .iter()
            .map(|cell| (cell.year_month.as_str(), cell.months_paid, cell.count))
            .collect::<Vec<(&str, u8, usize)>>();
        assert_eq!(
            triples,
            vec![("2024-01", 0, 1), ("2024-01", 6, 1), ("2024-02", 0, 1), ("2024-02", 6, 2)]
        );
    }

    #[test]
    fn empty_segment_yields_zero_counts() {
        let result = distributions(&[]);
        assert!(result.status_counts.iter().all(|row| row.count == 0));
        assert!(result.months_paid.is_empty());
        assert!(result.heatmap.is_empty());
    }
}
