use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{Connection, params};
use tracing::debug;

use crate::migrations::{
    EXPECTED_USER_VERSION, IMPORT_RUNS_COLUMNS, REQUIRED_META_KEYS, STATEMENT_TABLE_COLUMNS,
    run_pending,
};
use crate::state::{LedgerLocation, map_sqlite_error, open_connection};
use crate::statement::profiles::PROFILES;
use crate::{ClientError, ClientResult};

const INTERNAL_META_COLUMNS: [&str; 2] = ["key", "value"];

#[derive(Debug, Clone)]
pub struct SetupContext {
    pub db_path: String,
    pub schema_version: String,
}

pub fn ensure_initialized_at(home_override: &Path) -> ClientResult<SetupContext> {
    ensure_initialized_in(Some(home_override))
}

/// Creates the ledger on first use, migrates it, and refuses to hand out a
/// ledger whose tables or meta rows do not match what this build expects.
/// `None` resolves the home from the environment.
pub fn ensure_initialized_in(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    let location = LedgerLocation::resolve(home_override)?;
    location.prepare()?;

    let db_path = location.db_path.as_path();
    let mut connection = open_connection(db_path)?;
    run_pending(&mut connection).map_err(|error| migration_error(db_path, &error))?;

    let ledger = LedgerCheck {
        connection: &connection,
        db_path,
    };
    ledger.tables_have_required_columns()?;
    ledger.restore_missing_meta()?;
    let meta = ledger.read_meta()?;
    ledger.version_and_meta_match(&meta)?;

    let schema_version = meta
        .get("schema_version")
        .cloned()
        .unwrap_or_else(|| "v1".to_string());
    debug!(db_path = %db_path.display(), %schema_version, "ledger ready");

    Ok(SetupContext {
        db_path: db_path.display().to_string(),
        schema_version,
    })
}

/// Storage problems keep their own code; anything else is a schema conflict.
fn migration_error(db_path: &Path, error: &rusqlite_migration::Error) -> ClientError {
    if let rusqlite_migration::Error::RusqliteError { err, .. } = error {
        let mapped = map_sqlite_error(db_path, err);
        if matches!(
            mapped.code.as_str(),
            "ledger_locked" | "ledger_corrupt" | "ledger_init_permission_denied"
        ) {
            return mapped;
        }
    }
    ClientError::migration_failed(db_path, &error.to_string())
}

struct LedgerCheck<'a> {
    connection: &'a Connection,
    db_path: &'a Path,
}

impl LedgerCheck<'_> {
    fn sqlite(&self, error: rusqlite::Error) -> ClientError {
        map_sqlite_error(self.db_path, &error)
    }

    fn corrupt(&self) -> ClientError {
        ClientError::ledger_corrupt(self.db_path)
    }

    /// A dropped table reports no columns, so it fails the same check.
    fn tables_have_required_columns(&self) -> ClientResult<()> {
        let fixed: [(&str, &[&str]); 2] = [
            ("internal_meta", &INTERNAL_META_COLUMNS),
            ("internal_import_runs", &IMPORT_RUNS_COLUMNS),
        ];
        let statement_columns: &[&str] = &STATEMENT_TABLE_COLUMNS;
        let statement_tables = PROFILES
            .iter()
            .map(|profile| (profile.table, statement_columns));

        let mut statement = self
            .connection
            .prepare("SELECT name FROM pragma_table_info(?1)")
            .map_err(|error| self.sqlite(error))?;

        for (table, required) in fixed.into_iter().chain(statement_tables) {
            let present = statement
                .query_map([table], |row| row.get::<_, String>(0))
                .map_err(|error| self.sqlite(error))?
                .collect::<Result<Vec<String>, _>>()
                .map_err(|error| self.sqlite(error))?;

            if let Some(missing) = required
                .iter()
                .find(|column| !present.iter().any(|name| name == *column))
            {
                debug!(table, column = *missing, "ledger is missing a column");
                return Err(self.corrupt());
            }
        }
        Ok(())
    }

    /// Insert-only: a deleted key comes back, a changed value is left for
    /// `version_and_meta_match` to reject.
    fn restore_missing_meta(&self) -> ClientResult<()> {
        for (key, default_value) in REQUIRED_META_KEYS {
            self.connection
                .execute(
                    "INSERT OR IGNORE INTO internal_meta (key, value) VALUES (?1, ?2)",
                    params![key, default_value],
                )
                .map_err(|error| self.sqlite(error))?;
        }
        Ok(())
    }

    fn read_meta(&self) -> ClientResult<BTreeMap<String, String>> {
        let mut statement = self
            .connection
            .prepare("SELECT key, value FROM internal_meta")
            .map_err(|error| self.sqlite(error))?;
        let meta = statement
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|error| self.sqlite(error))?
            .collect::<Result<BTreeMap<String, String>, _>>()
            .map_err(|error| self.sqlite(error))?;
        Ok(meta)
    }

    fn version_and_meta_match(&self, meta: &BTreeMap<String, String>) -> ClientResult<()> {
        let user_version = self
            .connection
            .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
            .map_err(|error| self.sqlite(error))?;
        if user_version != EXPECTED_USER_VERSION {
            return Err(self.corrupt());
        }

        let drifted = REQUIRED_META_KEYS
            .iter()
            .any(|(key, expected)| meta.get(*key).map(String::as_str) != Some(*expected));
        if drifted {
            return Err(self.corrupt());
        }
        Ok(())
    }
}
