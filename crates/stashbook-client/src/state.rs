use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Error as SqliteError, ffi::ErrorCode};

use crate::{ClientError, ClientResult};

pub const HOME_ENV_VAR: &str = "STASHBOOK_HOME";

const DEFAULT_DIR_NAME: &str = ".stashbook";
const DB_FILE_NAME: &str = "ledger.db";
const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

/// Where the ledger lives on disk: the home directory and the database inside it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LedgerLocation {
    pub home: PathBuf,
    pub db_path: PathBuf,
}

impl LedgerLocation {
    /// An explicit override wins, then `$STASHBOOK_HOME`, then `~/.stashbook`.
    /// Relative paths are anchored at the working directory.
    pub fn resolve(home_override: Option<&Path>) -> ClientResult<Self> {
        let home = match home_override {
            Some(path) => path.to_path_buf(),
            None => default_home()?,
        };
        let home = if home.is_absolute() {
            home
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&home))
                .map_err(|error| map_io_error(&home, &error))?
        };

        Ok(Self {
            db_path: home.join(DB_FILE_NAME),
            home,
        })
    }

    /// Creates the home directory, owner-only on unix.
    pub fn prepare(&self) -> ClientResult<()> {
        fs::create_dir_all(&self.home).map_err(|error| map_io_error(&self.home, &error))?;
        restrict_to_owner(&self.home);
        Ok(())
    }
}

fn default_home() -> ClientResult<PathBuf> {
    if let Some(from_env) = std::env::var_os(HOME_ENV_VAR) {
        return Ok(PathBuf::from(from_env));
    }
    home::home_dir()
        .map(|user_home| user_home.join(DEFAULT_DIR_NAME))
        .ok_or_else(|| {
            ClientError::ledger_init_failed(
                Path::new("."),
                "No home directory found; pass --home or set STASHBOOK_HOME.",
            )
        })
}

pub fn open_connection(db_path: &Path) -> ClientResult<Connection> {
    let connection =
        Connection::open(db_path).map_err(|error| map_sqlite_error(db_path, &error))?;
    connection
        .busy_timeout(BUSY_TIMEOUT)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(connection)
}

pub fn map_io_error(path: &Path, error: &io::Error) -> ClientError {
    match error.kind() {
        io::ErrorKind::PermissionDenied => {
            ClientError::ledger_init_permission_denied(path, &error.to_string())
        }
        _ => ClientError::ledger_init_failed(path, &error.to_string()),
    }
}

pub fn map_sqlite_error(path: &Path, error: &SqliteError) -> ClientError {
    match error.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
            ClientError::ledger_locked(path)
        }
        Some(ErrorCode::NotADatabase) => ClientError::ledger_corrupt(path),
        Some(ErrorCode::CannotOpen | ErrorCode::ReadOnly) => {
            ClientError::ledger_init_permission_denied(path, &error.to_string())
        }
        _ => ClientError::ledger_init_failed(path, &error.to_string()),
    }
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    // Best effort: a shared home the user cannot chmod still works.
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o700));
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) {}
