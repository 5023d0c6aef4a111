mod cli;
mod dispatch;
mod output;
mod stdout_io;

use std::process::ExitCode;

use clap::{Parser, error::ErrorKind};
use clawback_client::ClientError;
use stdout_io::write_stdout_text;

const ROOT_HELP: &str = "Clawback - commission chargeback analytics

Usage:
  clawback <command>

Start here:
  clawback import create --help
  clawback overview
";

const TOP_LEVEL_HELP: &str = "Clawback - commission chargeback analytics

USAGE: clawback <command>

Load your commission ledger:
  1. clawback import create --help                        Read the import schema
  2. clawback import create --dry-run <path>              Validate a file without writing
  3. clawback import create <path>                        Import commission payments
  clawback import list                                    List past imports

Analyze chargebacks:
  clawback overview                                       Headline totals and per-segment figures
  clawback policies --segment in-policy                   Classified policies in one segment
  clawback timeseries --interval week                     Advances and chargebacks over time
  clawback distribution                                   Status counts, months paid, heatmap

Every report accepts --from/--to (YYYY-MM-DD) and --json.
Set CLAWBACK_HOME or pass --home <dir> to use a different ledger.
Run `clawback <command> --help` for command usage.
";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

fn run() -> Result<ExitCode, ExitCode> {
    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 {
        if write_stdout_text(ROOT_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let cli = match cli::Cli::try_parse() {
        Ok(value) => value,
        Err(err) => return handle_parse_error(&err, &raw_args),
    };
    let mode = output::mode_for_command(&cli.command);
    log::debug!("dispatching {:?}", cli.command);

    match dispatch::dispatch(&cli) {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

fn handle_parse_error(err: &clap::Error, raw_args: &[String]) -> Result<ExitCode, ExitCode> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let text = if is_top_level_help_request(raw_args) {
                TOP_LEVEL_HELP.to_string()
            } else {
                err.to_string()
            };
            if write_stdout_text(&text).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        ErrorKind::DisplayVersion => {
            if write_stdout_text(&err.to_string()).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        kind => {
            let command_hint = if matches!(
                kind,
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::InvalidValue
                    | ErrorKind::ValueValidation
                    | ErrorKind::WrongNumberOfValues
                    | ErrorKind::UnknownArgument
                    | ErrorKind::InvalidSubcommand
            ) {
                command_path_from_args(raw_args)
            } else {
                None
            };
            let clean_message = strip_clap_boilerplate(&err.to_string());
            let parse_error =
                ClientError::invalid_argument_for_command(&clean_message, command_hint.as_deref());
            let mode = infer_requested_output_mode(raw_args);
            if output::print_failure(&parse_error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(ExitCode::from(1))
        }
    }
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Drops clap's trailing usage line and "For more information" hint; the
/// error block prints its own recovery steps.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_end().to_string()
}

/// Subcommand path for help hints, e.g. "import create" or "timeseries".
/// Values that follow a flag are skipped so `--home import` is not mistaken
/// for a command word.
fn command_path_from_args(raw_args: &[String]) -> Option<String> {
    let mut words = Vec::new();
    let mut skip_next = false;
    for value in raw_args.iter().skip(1) {
        if skip_next {
            skip_next = false;
            continue;
        }
        if value.starts_with('-') {
            skip_next = flag_takes_value(value);
            continue;
        }
        words.push(value.as_str());
    }

    let hint = match words.as_slice() {
        ["import", "create", ..] => Some("import create"),
        ["import", "list", ..] => Some("import list"),
        ["import", ..] => Some("import"),
        ["policies", ..] => Some("policies"),
        ["timeseries", ..] => Some("timeseries"),
        ["distribution", ..] => Some("distribution"),
        ["overview", ..] => Some("overview"),
        _ => None,
    };
    hint.map(std::string::ToString::to_string)
}

fn flag_takes_value(flag: &str) -> bool {
    !flag.contains('=')
        && matches!(
            flag,
            "--home" | "--from" | "--to" | "--segment" | "--interval"
        )
}

fn exit_code_for_error(error: &ClientError) -> ExitCode {
    if error.is_internal() {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}
