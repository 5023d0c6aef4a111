use crate::ClientResult;
use crate::commands::common::{ReportRunOptions, load_setup, parse_report_parameters, report_scope};
use crate::commands::session::ReportSession;
use crate::contracts::envelope::{SuccessEnvelope, report_success};
use crate::contracts::types::{OverviewData, SegmentOverview};
use crate::ledger::cache::LedgerSource;
use crate::ledger::types::Segment;

const COMMAND: &str = "overview";

pub fn run(from: Option<String>, to: Option<String>) -> ClientResult<SuccessEnvelope> {
    run_with_options(ReportRunOptions {
        from,
        to,
        ..ReportRunOptions::default()
    })
}

#[doc(hidden)]
pub fn run_with_options(options: ReportRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    run_in_session(&mut ReportSession::new(), &options)
}

/// Headline totals for the filtered population plus KPIs for every segment.
/// A `segment` option is validated but the overview always covers all of them.
pub fn run_in_session<S: LedgerSource>(
    session: &mut ReportSession<S>,
    options: &ReportRunOptions<'_>,
) -> ClientResult<SuccessEnvelope> {
    let parameters = parse_report_parameters(options, COMMAND)?;
    let setup = load_setup(options.home_override)?;
    let report = session.build_report(&setup, &parameters.range)?;

    let segments = Segment::ALL_SEGMENTS
        .into_iter()
        .map(|segment| SegmentOverview {
            segment,
            label: segment.label().to_string(),
            metrics: report.segment_metrics(segment),
        })
        .collect();

    report_success(
        COMMAND,
        OverviewData {
            scope: report_scope(&report, Segment::All, &setup),
            totals: report.overview(),
            segments,
        },
    )
}
