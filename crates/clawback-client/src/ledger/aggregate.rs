use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::ledger::date::parse_statement_date;
use crate::ledger::policy::{REPORT_POLICY_V1, ReportPolicy};
use crate::ledger::types::{LedgerEntry, PolicySummary};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSummaries {
    pub summaries: Vec<PolicySummary>,
    pub dropped_invalid_dates: usize,
}

#[derive(Debug)]
struct PolicyGroup<'a> {
    policy_number: &'a str,
    rows: Vec<(Option<NaiveDate>, f64)>,
}

/// Groups raw ledger rows into one summary per policy id, ordered by id.
///
/// A policy is dropped (and counted) when any of its statement dates cannot be
/// parsed, since its first statement date is then unknowable, or when that
/// first date falls outside the policy's accepted bounds.
pub fn summarize_ledger(entries: &[LedgerEntry]) -> LedgerSummaries {
    summarize_ledger_with_policy(entries, REPORT_POLICY_V1)
}

pub(crate) fn summarize_ledger_with_policy(
    entries: &[LedgerEntry],
    policy: ReportPolicy,
) -> LedgerSummaries {
    let mut groups: BTreeMap<i64, PolicyGroup<'_>> = BTreeMap::new();
    for entry in entries {
        let group = groups.entry(entry.policy_id).or_insert_with(|| PolicyGroup {
            policy_number: entry.policy_number.as_str(),
            rows: Vec::new(),
        });
        if entry.policy_number.as_str() < group.policy_number {
            group.policy_number = entry.policy_number.as_str();
        }
        group.rows.push((
            parse_statement_date(&entry.statement_date),
            entry.override_amount,
        ));
    }

    let mut summaries = Vec::with_capacity(groups.len());
    let mut dropped_invalid_dates = 0_usize;
    for (policy_id, group) in groups {
        let Some(first_statement_date) = first_statement_date(&group.rows) else {
            dropped_invalid_dates += 1;
            continue;
        };
        if !policy.accepts_statement_date(first_statement_date) {
            dropped_invalid_dates += 1;
            continue;
        }

        summaries.push(PolicySummary {
            policy_id,
            policy_number: group.policy_number.to_string(),
            first_statement_date,
            advance_amount: advance_amount(&group.rows, first_statement_date),
            chargeback_amount: chargeback_amount(&group.rows),
        });
    }

    log::debug!(
        "ledger: {} entries grouped into {} policy summaries ({} dropped for invalid dates)",
        entries.len(),
        summaries.len(),
        dropped_invalid_dates
    );

    LedgerSummaries {
        summaries,
        dropped_invalid_dates,
    }
}

fn first_statement_date(rows: &[(Option<NaiveDate>, f64)]) -> Option<NaiveDate> {
    let mut earliest: Option<NaiveDate> = None;
    for (date, _) in rows {
        let parsed = (*date)?;
        earliest = Some(earliest.map_or(parsed, |current| current.min(parsed)));
    }
    earliest
}

fn advance_amount(rows: &[(Option<NaiveDate>, f64)], first_statement_date: NaiveDate) -> f64 {
    rows.iter()
        .filter(|(date, amount)| *amount > 0.0 && *date == Some(first_statement_date))
        .map(|(_, amount)| amount)
        .sum()
}

fn chargeback_amount(rows: &[(Option<NaiveDate>, f64)]) -> f64 {
    rows.iter()
        .filter(|(_, amount)| *amount < 0.0)
        .map(|(_, amount)| amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::ledger::aggregate::summarize_ledger;
    use crate::ledger::types::LedgerEntry;

    fn entry(policy_id: i64, statement_date: &str, amount: f64) -> LedgerEntry {
        LedgerEntry {
            policy_id,
            policy_number: format!("POL-{policy_id}"),
            statement_date: statement_date.to_string(),
            override_amount: amount,
        }
    }

    #[test]
    fn advance_counts_only_positive_rows_on_first_statement() {
        let rows = vec![
            entry(7, "2024-03-01", 800.0),
            entry(7, "2024-03-01", 400.0),
            entry(7, "2024-04-01", 250.0),
            entry(7, "2024-05-01", -300.0),
        ];

        let result = summarize_ledger(&rows);
        assert_eq!(result.summaries.len(), 1);
        let summary = &result.summaries[0];
        assert_eq!(summary.first_statement_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default());
        assert!((summary.advance_amount - 1200.0).abs() < 1e-9);
        assert!((summary.chargeback_amount + 300.0).abs() < 1e-9);
    }

    #[test]
    fn chargebacks_sum_across_every_statement_date() {
        let rows = vec![
            entry(1, "2024-01-10", 1000.0),
            entry(1, "2024-01-10", -100.0),
            entry(1, "2024-02-10", -150.0),
            entry(1, "2024-06-10", -50.0),
        ];
        let result = summarize_ledger(&rows);
        assert!((result.summaries[0].chargeback_amount + 300.0).abs() < 1e-9);
    }

    #[test]
    fn negative_only_policy_has_zero_advance() {
        let rows = vec![entry(3, "2024-02-01", -75.0), entry(3, "2024-03-01", -25.0)];
        let result = summarize_ledger(&rows);
        assert_eq!(result.summaries.len(), 1);
        assert_eq!(result.summaries[0].advance_amount, 0.0);
        assert!((result.summaries[0].chargeback_amount + 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_amount_rows_only_set_the_first_statement_date() {
        let rows = vec![entry(4, "2024-01-05", 0.0), entry(4, "2024-01-20", 500.0)];
        let result = summarize_ledger(&rows);
        let summary = &result.summaries[0];
        assert_eq!(summary.first_statement_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap_or_default());
        assert_eq!(summary.advance_amount, 0.0);
        assert_eq!(summary.chargeback_amount, 0.0);
    }

    #[test]
    fn invalid_dates_drop_the_whole_policy_and_are_counted() {
        let rows = vec![
            entry(1, "2024-01-10", 1000.0),
            entry(2, "not-a-date", 500.0),
            entry(2, "2024-01-10", 500.0),
            entry(3, "1500-01-01", 900.0),
            entry(4, "2024-01-10", 100.0),
            entry(4, "9999-12-31", -10.0),
        ];
        let result = summarize_ledger(&rows);
        assert_eq!(result.dropped_invalid_dates, 2);
        let ids = result
            .summaries
            .iter()
            .map(|summary| summary.policy_id)
            .collect::<Vec<i64>>();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn bad_later_date_drops_a_policy_with_a_valid_first_statement() {
        let rows = vec![
            entry(5, "2024-01-10", 1200.0),
            entry(5, "2024-03-10", -300.0),
            entry(5, "2024-13-40", -100.0),
            entry(6, "2024-01-11", 800.0),
        ];
        let result = summarize_ledger(&rows);
        assert_eq!(result.dropped_invalid_dates, 1);
        let ids = result
            .summaries
            .iter()
            .map(|summary| summary.policy_id)
            .collect::<Vec<i64>>();
        assert_eq!(ids, vec![6]);
    }

    #[test]
    fn output_is_independent_of_input_order() {
        let mut rows = vec![
            entry(9, "2024-05-01", 600.0),
            entry(2, "2024-01-01", 100.0),
            entry(9, "2024-04-01", 300.0),
            entry(2, "2024-02-01", -100.0),
        ];
        let forward = summarize_ledger(&rows);
        rows.reverse();
        let backward = summarize_ledger(&rows);
        assert_eq!(forward, backward);
        assert_eq!(forward.summaries[0].policy_id, 2);
    }

    #[test]
    fn empty_ledger_produces_no_summaries() {
        let result = summarize_ledger(&[]);
        assert!(result.summaries.is_empty());
        assert_eq!(result.dropped_invalid_dates, 0);
    }
}
