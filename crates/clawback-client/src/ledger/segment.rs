use crate::ledger::policy::{REPORT_POLICY_V1, ReportPolicy};
use crate::ledger::types::{ClassifiedSummary, DateRange, RangeRequest, Segment};

/// Resolves the effective range for a request against the whole population.
///
/// Missing bounds default to `max(global_min, policy epoch)` and `global_max`.
/// Returns `None` when a bound is missing and the population is empty.
pub fn resolve_range(population: &[ClassifiedSummary], request: &RangeRequest) -> Option<DateRange> {
    resolve_range_with_policy(population, request, REPORT_POLICY_V1)
}

pub(crate) fn resolve_range_with_policy(
    population: &[ClassifiedSummary],
    request: &RangeRequest,
    policy: ReportPolicy,
) -> Option<DateRange> {
    let global_min = population.iter().map(ClassifiedSummary::first_statement_date).min();
    let global_max = population.iter().map(ClassifiedSummary::first_statement_date).max();

    let default_start = match (global_min, policy.default_range_start_date()) {
        (Some(min), Some(epoch)) => Some(min.max(epoch)),
        (Some(min), None) => Some(min),
        (None, _) => None,
    };

    let start = request.from.or(default_start)?;
    let end = request.to.or(global_max)?;
    Some(DateRange { start, end })
}

/// Selects records whose first statement date falls in `range`, keeping input order.
pub fn filter_by_range<'a>(
    population: &'a [ClassifiedSummary],
    range: Option<&DateRange>,
) -> Vec<&'a ClassifiedSummary> {
    let Some(range) = range else {
        return Vec::new();
    };
    population
        .iter()
        .filter(|record| range.contains(record.first_statement_date()))
        .collect()
}

pub fn segment_view<'a>(
    filtered: &[&'a ClassifiedSummary],
    segment: Segment,
) -> Vec<&'a ClassifiedSummary> {
    filtered
        .iter()
        .copied()
        .filter(|record| segment.contains(record))
        .collect()
}
