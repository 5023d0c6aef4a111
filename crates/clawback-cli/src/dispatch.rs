use clawback_client::commands;
use clawback_client::commands::common::ReportRunOptions;
use clawback_client::commands::import::{ImportListOptions, ImportRunOptions};
use clawback_client::{ClientResult, SuccessEnvelope};

use crate::cli::{Cli, Commands, ImportCommand, ReportArgs};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    let home_override = cli.home.as_deref();
    match &cli.command {
        Commands::Import { command } => match command {
            ImportCommand::Create { dry_run, path, .. } => {
                commands::import::run_with_options(ImportRunOptions {
                    path: path.clone(),
                    dry_run: *dry_run,
                    home_override,
                    stdin_override: None,
                })
            }
            ImportCommand::List { .. } => {
                commands::import::list_with_options(ImportListOptions { home_override })
            }
        },
        Commands::Policies { report } => {
            commands::policies::run_with_options(report_options(cli, report, None))
        }
        Commands::Timeseries { report, interval } => {
            commands::timeseries::run_with_options(report_options(cli, report, interval.clone()))
        }
        Commands::Distribution { report } => {
            commands::distribution::run_with_options(report_options(cli, report, None))
        }
        Commands::Overview { report } => {
            commands::overview::run_with_options(report_options(cli, report, None))
        }
    }
}

fn report_options<'a>(
    cli: &'a Cli,
    report: &ReportArgs,
    interval: Option<String>,
) -> ReportRunOptions<'a> {
    ReportRunOptions {
        from: report.from.clone(),
        to: report.to.clone(),
        segment: report.segment.clone(),
        interval,
        home_override: cli.home.as_deref(),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::cli::parse_from;

    use super::dispatch;

    #[test]
    fn dispatches_to_expected_command_names() {
        let home = tempdir();
        assert!(home.is_ok());
        if let Ok(home) = home {
            let home_arg = home.path().display().to_string();
            let cases: [(&[&str], &str); 5] = [
                (&["policies"], "policies"),
                (&["timeseries", "--interval", "week"], "timeseries"),
                (&["distribution"], "distribution"),
                (&["overview"], "overview"),
                (&["import", "list"], "import list"),
            ];

            for (args, expected_command) in cases {
                let mut argv = vec!["clawback", "--home", home_arg.as_str()];
                argv.extend_from_slice(args);
                let parsed = parse_from(argv);
                assert!(parsed.is_ok());
                if let Ok(cli) = parsed {
                    let response = dispatch(&cli);
                    assert!(response.is_ok(), "{expected_command} failed");
                    if let Ok(success) = response {
                        assert_eq!(success.command, expected_command);
                    }
                }
            }
        }
    }

    #[test]
    fn invalid_segment_surfaces_as_client_error() {
        let home = tempdir();
        assert!(home.is_ok());
        if let Ok(home) = home {
            let home_arg = home.path().display().to_string();
            let parsed = parse_from([
                "clawback",
                "--home",
                home_arg.as_str(),
                "policies",
                "--segment",
                "lapsed",
            ]);
            assert!(parsed.is_ok());
            if let Ok(cli) = parsed {
                let response = dispatch(&cli);
                assert!(response.is_err());
                if let Err(error) = response {
                    assert_eq!(error.code, "invalid_argument");
                    assert!(!error.is_internal());
                }
            }
        }
    }
}
