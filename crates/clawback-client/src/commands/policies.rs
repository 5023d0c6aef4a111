use crate::ClientResult;
use crate::commands::common::{
    ReportRunOptions, load_setup, parse_report_parameters, policy_row, report_scope,
};
use crate::commands::session::ReportSession;
use crate::contracts::envelope::{SuccessEnvelope, report_success};
use crate::contracts::types::PoliciesData;
use crate::ledger::cache::LedgerSource;

const COMMAND: &str = "policies";

pub fn run(
    from: Option<String>,
    to: Option<String>,
    segment: Option<String>,
) -> ClientResult<SuccessEnvelope> {
    run_with_options(ReportRunOptions {
        from,
        to,
        segment,
        ..ReportRunOptions::default()
    })
}

#[doc(hidden)]
pub fn run_with_options(options: ReportRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    run_in_session(&mut ReportSession::new(), &options)
}

/// Classified policies of one segment, newest first statement first.
pub fn run_in_session<S: LedgerSource>(
    session: &mut ReportSession<S>,
    options: &ReportRunOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    let parameters = parse_report_parameters(options, COMMAND)?;
    let setup = load_setup(options.home_override)?;
    let report = session.build_report(&setup, &parameters.range)?;

    let rows = report
        .policy_rows(parameters.segment)
        .into_iter()
        .map(policy_row)
        .collect();

    report_success(
        COMMAND,
        PoliciesData {
            scope: report_scope(&report, parameters.segment, &setup),
            metrics: report.segment_metrics(parameters.segment),
            rows,
        },
    )
}
