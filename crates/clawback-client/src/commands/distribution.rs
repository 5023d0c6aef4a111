use crate::ClientResult;
use crate::commands::common::{ReportRunOptions, load_setup, parse_report_parameters, report_scope};
use crate::commands::session::ReportSession;
use crate::contracts::envelope::{SuccessEnvelope, report_success};
use crate::contracts::types::DistributionData;
use crate::ledger::cache::LedgerSource;

const COMMAND: &str = "distribution";

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

pub fn run_in_session<S: LedgerSource>(
    session: &mut ReportSession<S>,
    options: &ReportRunOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    let parameters = parse_report_parameters(options, COMMAND)?;
    let setup = load_setup(options.home_override)?;
    let report = session.build_report(&setup, &parameters.range)?;
    let distributions = report.distributions(parameters.segment);

    report_success(
        COMMAND,
        DistributionData {
            scope: report_scope(&report, parameters.segment, &setup),
            status_counts: distributions.status_counts,
            months_paid: distributions.months_paid,
            heatmap: distributions.heatmap,
        },
    )
}
