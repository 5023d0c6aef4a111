use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Error as SqliteError, OpenFlags, ffi::ErrorCode};

use crate::{ClientError, ClientResult};

pub const HOME_ENV_VAR: &str = "CLAWBACK_HOME";
const DEFAULT_HOME_DIR_NAME: &str = ".clawback";
const LEDGER_FILE_NAME: &str = "ledger.db";
const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

/// Ledger home precedence: explicit override, then `CLAWBACK_HOME`, then
/// `~/.clawback`. Relative paths are resolved against the working directory.
pub fn resolve_ledger_home(home_override: Option<&Path>) -> ClientResult<PathBuf> {
    let candidate = match home_override {
        Some(path) => path.to_path_buf(),
        None => match std::env::var_os(HOME_ENV_VAR) {
            Some(from_env) if !from_env.is_empty() => PathBuf::from(from_env),
            _ => home::home_dir()
                .map(|home_path| home_path.join(DEFAULT_HOME_DIR_NAME))
                .ok_or_else(|| {
                    ClientError::ledger_init_failed(
                        Path::new("."),
                        "Could not resolve a home directory for the commission ledger.",
                    )
                })?,
        },
    };

    absolutize(&candidate)
}

pub fn ensure_ledger_directory(path: &Path) -> ClientResult<()> {
    fs::create_dir_all(path).map_err(|error| map_io_error(path, &error))?;
    restrict_permissions(path);
    Ok(())
}

pub fn ledger_db_path(home: &Path) -> PathBuf {
    home.join(LEDGER_FILE_NAME)
}

pub fn open_connection(db_path: &Path) -> ClientResult<Connection> {
    let connection =
        Connection::open(db_path).map_err(|error| map_sqlite_error(db_path, &error))?;
    with_busy_timeout(connection, db_path)
}

/// Report queries never write, so they use a read-only handle.
pub fn open_readonly_connection(db_path: &Path) -> ClientResult<Connection> {
    let connection = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    with_busy_timeout(connection, db_path)
}

fn with_busy_timeout(connection: Connection, db_path: &Path) -> ClientResult<Connection> {
    connection
        .busy_timeout(BUSY_TIMEOUT)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(connection)
}

pub fn map_io_error(path: &Path, error: &std::io::Error) -> ClientError {
    match error.kind() {
        std::io::ErrorKind::PermissionDenied => {
            ClientError::ledger_init_permission_denied(path, &error.to_string())
        }
        _ => ClientError::ledger_init_failed(path, &error.to_string()),
    }
}

pub fn map_sqlite_error(path: &Path, error: &SqliteError) -> ClientError {
    match error.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => ClientError::ledger_locked(path),
        Some(ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt) => {
            ClientError::ledger_corrupt(path)
        }
        Some(ErrorCode::CannotOpen | ErrorCode::ReadOnly | ErrorCode::PermissionDenied) => {
            ClientError::ledger_init_permission_denied(path, &error.to_string())
        }
        _ => ClientError::ledger_init_failed(path, &error.to_string()),
    }
}

fn absolutize(path: &Path) -> ClientResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|error| ClientError::ledger_init_failed(path, &error.to_string()))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    // Best effort; a shared directory the user does not own stays as it is.
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o700));
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{ledger_db_path, resolve_ledger_home};

    #[test]
    fn explicit_override_wins_and_is_absolute() {
        let resolved = resolve_ledger_home(Some(Path::new("relative-home")));
        assert!(resolved.is_ok());
        if let Ok(path) = resolved {
            assert!(path.is_absolute());
            assert!(path.ends_with("relative-home"));
        }
    }

    #[test]
    fn ledger_file_lives_in_the_home_directory() {
        let path = ledger_db_path(Path::new("/tmp/clawback-home"));
        assert_eq!(path, Path::new("/tmp/clawback-home/ledger.db"));
    }
}
