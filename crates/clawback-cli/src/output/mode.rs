use crate::cli::{Commands, ImportCommand};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    let json = match command {
        Commands::Import { command } => match command {
            ImportCommand::Create { json, .. } | ImportCommand::List { json } => *json,
        },
        Commands::Policies { report }
        | Commands::Timeseries { report, .. }
        | Commands::Distribution { report }
        | Commands::Overview { report } => report.json,
    };

    if json {
        OutputMode::Json
    } else {
        OutputMode::Text
    }
}
