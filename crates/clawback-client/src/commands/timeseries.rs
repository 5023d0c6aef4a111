use crate::ClientResult;
use crate::commands::common::{
    ReportRunOptions, load_setup, parse_report_parameters, report_scope, time_bucket_row,
};
use crate::commands::session::ReportSession;
use crate::contracts::envelope::{SuccessEnvelope, report_success};
use crate::contracts::types::TimeSeriesData;
use crate::ledger::cache::LedgerSource;

const COMMAND: &str = "timeseries";

pub fn run(
    from: Option<String>,
    to: Option<String>,
    segment: Option<String>,
    interval: Option<String>,
) -> ClientResult<SuccessEnvelope> {
    run_with_options(ReportRunOptions {
        from,
        to,
        segment,
        interval,
        home_override: None,
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

    let buckets = report
        .time_series(parameters.segment, parameters.interval)
        .iter()
        .map(time_bucket_row)
        .collect();

    report_success(
        COMMAND,
        TimeSeriesData {
            scope: report_scope(&report, parameters.segment, &setup),
            interval: parameters.interval,
            buckets,
        },
    )
}
