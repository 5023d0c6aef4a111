use std::fs;
use std::io::{IsTerminal, Read};

use crate::import::invalid_input_error;
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum SourceKind {
    File,
    Stdin,
}

impl SourceKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Stdin => "stdin",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ResolvedSource {
    pub(crate) kind: SourceKind,
    pub(crate) source_ref: Option<String>,
    pub(crate) content: String,
}

/// Picks exactly one import source. `-` or a missing path means stdin; a
/// file path combined with non-empty piped stdin is rejected as ambiguous.
pub(crate) fn resolve_source(
    path: Option<&str>,
    stdin_override: Option<String>,
) -> ClientResult<ResolvedSource> {
    let stdin_body = read_stdin(stdin_override)?;

    match path {
        Some(file_path) if file_path != "-" => {
            if stdin_body.is_some() {
                return Err(invalid_input_error(
                    "Both stdin and a file path were provided. Pass exactly one import source.",
                ));
            }
            let content = fs::read_to_string(file_path).map_err(|error| {
                ClientError::invalid_argument_with_recovery(
                    &format!("Could not read import file `{file_path}`: {error}"),
                    vec![
                        "Verify the path exists and is readable.".to_string(),
                        "Rerun clawback import create <path>.".to_string(),
                    ],
                )
            })?;
            Ok(ResolvedSource {
                kind: SourceKind::File,
                source_ref: Some(file_path.to_string()),
                content,
            })
        }
        _ => match stdin_body {
            Some(content) => Ok(ResolvedSource {
                kind: SourceKind::Stdin,
                source_ref: None,
                content,
            }),
            None if path.is_some() => Err(invalid_input_error(
                "Path `-` means stdin input, but stdin was empty. Pipe CSV/JSON input or pass a file path.",
            )),
            None => Err(invalid_input_error(
                "No import source provided. Pass a file path or pipe input via stdin.",
            )),
        },
    }
}

// Blank stdin counts as absent.
fn read_stdin(stdin_override: Option<String>) -> ClientResult<Option<String>> {
    let body = match stdin_override {
        Some(value) => value,
        None => {
            if std::io::stdin().is_terminal() {
                return Ok(None);
            }
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|error| {
                    ClientError::invalid_argument_with_recovery(
                        &format!("Could not read stdin: {error}"),
                        vec!["Retry with an explicit file path argument.".to_string()],
                    )
                })?;
            buffer
        }
    };

    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(body))
}
