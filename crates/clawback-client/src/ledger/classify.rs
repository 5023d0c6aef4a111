use crate::ledger::policy::{REPORT_POLICY_V1, ReportPolicy};
use crate::ledger::types::{ClassifiedSummary, PolicyStatus, PolicySummary};

/// Share of the advance recovered through chargebacks, capped at 1.0.
pub fn cb_fraction(summary: &PolicySummary) -> f64 {
    if summary.advance_amount <= 0.0 {
        return 0.0;
    }
    (summary.chargeback_amount.abs() / summary.advance_amount).min(1.0)
}

/// Derived from the amounts, not from [`cb_fraction`], which is already rounded.
pub fn months_paid(summary: &PolicySummary) -> u8 {
    REPORT_POLICY_V1.months_paid(summary.advance_amount, summary.chargeback_amount)
}

pub fn status(summary: &PolicySummary) -> PolicyStatus {
    if summary.chargeback_amount == 0.0 {
        PolicyStatus::Active
    } else {
        PolicyStatus::ChargedBack
    }
}

pub fn classify(summary: PolicySummary) -> ClassifiedSummary {
    classify_with_policy(summary, REPORT_POLICY_V1)
}

pub fn classify_all(summaries: Vec<PolicySummary>) -> Vec<ClassifiedSummary> {
    summaries.into_iter().map(classify).collect()
}

pub(crate) fn classify_with_policy(summary: PolicySummary, policy: ReportPolicy) -> ClassifiedSummary {
    let fraction = cb_fraction(&summary);
    let months = policy.months_paid(summary.advance_amount, summary.chargeback_amount);
    let status = status(&summary);
    ClassifiedSummary {
        summary,
        cb_fraction: fraction,
        months_paid: months,
        status,
    }
}
