use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Extended help shown after `clawback import create --help`.
pub const IMPORT_CREATE_AFTER_HELP: &str = "\
How import works:
  Clawback reads a normalized commission ledger, not raw carrier statements.
  Convert each statement into a CSV or JSON file first, then import it.

  Accepted formats:
    JSON: one top-level array of payment objects
    CSV:  one header row with the four field names, in any order

  <path> is a local file path. Use `-` to read stdin explicitly.
  Example: cat payments.csv | clawback import create --dry-run -

What to do next:
  1. Run `clawback import create --dry-run <path>` and fix any reported issues.
  2. Run `clawback import create <path>` once the dry run passes.
  3. Run `clawback overview` to see the classified book.

Import schema:
  CSV example:
  policy_id,policy_number,statement_date,paid_override_amount
  1001,POL-1001,2024-01-15,400.00
  1001,POL-1001,2024-03-15,-150.00

  JSON example:
  [
    {
      \"policy_id\": 1001,
      \"policy_number\": \"POL-1001\",
      \"statement_date\": \"2024-01-15\",
      \"paid_override_amount\": 400.00
    }
  ]

Field rules:
  policy_id (required):
    Whole number identifying the policy. Every row of one policy shares it.

  policy_number (required):
    Display label for the policy. One policy_id keeps one policy_number
    within a file; a later import may rename it.

  statement_date (required):
    Date only, exactly `YYYY-MM-DD`.

  paid_override_amount (required):
    A number with at most 2 decimal places.
    Positive = advance paid to you, negative = chargeback taken back.
";

const REPORT_AFTER_HELP: &str = "\
Segments:
  all            every classified policy (default)
  in-policy      charged back before any month was earned
  non-in-policy  charged back after at least one month was earned

Without --from/--to the range runs from the later of the first statement
date and 2024-01-01 through the last statement date in the ledger.
";

#[derive(Debug, Parser)]
#[command(
    name = "clawback",
    version,
    about = "commission chargeback analytics for insurance agents",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Ledger directory (defaults to $CLAWBACK_HOME, then ~/.clawback)
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load commission payments into your local ledger
    #[command(arg_required_else_help = true)]
    Import {
        #[command(subcommand)]
        command: ImportCommand,
    },
    /// List classified policies for one segment
    #[command(after_help = REPORT_AFTER_HELP)]
    Policies {
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Bucket advances and chargebacks by day, week or month
    #[command(after_help = REPORT_AFTER_HELP)]
    Timeseries {
        #[command(flatten)]
        report: ReportArgs,
        /// Bucket width: day, week or month
        #[arg(long)]
        interval: Option<String>,
    },
    /// Status counts, months-paid histogram and first-statement heatmap
    #[command(after_help = REPORT_AFTER_HELP)]
    Distribution {
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Headline totals plus key figures for every segment
    #[command(after_help = REPORT_AFTER_HELP)]
    Overview {
        #[command(flatten)]
        report: ReportArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    /// Start date filter on first statement date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,
    /// End date filter on first statement date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,
    /// Segment to report on: all, in-policy or non-in-policy
    #[arg(long)]
    pub segment: Option<String>,
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ImportCommand {
    /// Validate and import a commission ledger file
    #[command(after_long_help = IMPORT_CREATE_AFTER_HELP)]
    Create {
        /// Validate import data without writing to the ledger
        #[arg(long)]
        dry_run: bool,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
        /// Path to a CSV or JSON file (use `-` for stdin)
        path: Option<String>,
    },
    /// List past imports, newest first
    List {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::error::ErrorKind;

    use super::{Commands, ImportCommand, parse_from};

    #[test]
    fn parse_command_paths() {
        let cases: [Vec<&str>; 14] = [
            vec!["clawback", "import", "create"],
            vec!["clawback", "import", "create", "--dry-run", "./ledger.csv"],
            vec!["clawback", "import", "create", "./ledger.csv", "--json"],
            vec!["clawback", "import", "create", "-"],
            vec!["clawback", "import", "list"],
            vec!["clawback", "import", "list", "--json"],
            vec!["clawback", "policies"],
            vec!["clawback", "policies", "--segment", "in-policy", "--json"],
            vec![
                "clawback",
                "policies",
                "--from",
                "2024-01-01",
                "--to",
                "2024-06-30",
            ],
            vec!["clawback", "timeseries", "--interval", "week"],
            vec!["clawback", "timeseries", "--segment", "non-in-policy"],
            vec!["clawback", "distribution", "--json"],
            vec!["clawback", "overview", "--from", "2024-02-01"],
            vec!["clawback", "--home", "/tmp/ledger", "overview"],
        ];

        for case in cases {
            let parsed = parse_from(case.clone());
            assert!(parsed.is_ok(), "failed to parse: {case:?}");
        }
    }

    #[test]
    fn parse_import_subcommands() {
        let parsed = parse_from(["clawback", "import", "create", "--dry-run", "rows.csv"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            match cli.command {
                Commands::Import {
                    command:
                        ImportCommand::Create {
                            dry_run,
                            json,
                            path,
                        },
                } => {
                    assert!(dry_run);
                    assert!(!json);
                    assert_eq!(path.as_deref(), Some("rows.csv"));
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }

        let parsed_list = parse_from(["clawback", "import", "list", "--json"]);
        assert!(parsed_list.is_ok());
        if let Ok(cli) = parsed_list {
            assert!(matches!(
                cli.command,
                Commands::Import {
                    command: ImportCommand::List { json: true },
                }
            ));
        }
    }

    #[test]
    fn parse_report_flags() {
        let parsed = parse_from([
            "clawback",
            "timeseries",
            "--segment",
            "in-policy",
            "--interval",
            "day",
            "--from",
            "2024-01-01",
        ]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            match cli.command {
                Commands::Timeseries { report, interval } => {
                    assert_eq!(report.segment.as_deref(), Some("in-policy"));
                    assert_eq!(report.from.as_deref(), Some("2024-01-01"));
                    assert_eq!(report.to, None);
                    assert_eq!(interval.as_deref(), Some("day"));
                    assert!(!report.json);
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }
    }

    #[test]
    fn home_flag_is_accepted_after_the_subcommand() {
        let parsed = parse_from(["clawback", "policies", "--home", "/tmp/ledger"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            assert_eq!(cli.home.as_deref(), Some(Path::new("/tmp/ledger")));
        }
    }

    #[test]
    fn report_commands_reject_unknown_flags() {
        let parsed = parse_from(["clawback", "overview", "--bucket", "week"]);
        assert!(parsed.is_err());
        if let Err(error) = parsed {
            assert_eq!(error.kind(), ErrorKind::UnknownArgument);
        }
    }

    #[test]
    fn unknown_commands_are_rejected() {
        for name in ["help", "export", "classify"] {
            let parsed = parse_from(["clawback", name]);
            assert!(parsed.is_err(), "unexpectedly parsed {name}");
        }
    }

    #[test]
    fn import_without_subcommand_shows_help() {
        let parsed = parse_from(["clawback", "import"]);
        assert!(parsed.is_err());
        if let Err(error) = parsed {
            assert_eq!(
                error.kind(),
                ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            );
        }
    }
}
