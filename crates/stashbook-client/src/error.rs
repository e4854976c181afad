use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

use crate::statement::parse::DropCounts;

pub(crate) const IMPORT_HELP_COMMAND: &str = "stashbook import create --help";

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

/// Codes that mean the ledger or the binary is at fault rather than the input.
const INTERNAL_CODES: [&str; 5] = [
    "ledger_init_permission_denied",
    "ledger_locked",
    "ledger_corrupt",
    "migration_failed",
    "ledger_init_failed",
];

impl ClientError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        recovery_steps: Vec<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(self, data: Value) -> Self {
        Self {
            data: Some(data),
            ..self
        }
    }

    pub fn is_internal(&self) -> bool {
        self.code.starts_with("internal_") || INTERNAL_CODES.contains(&self.code.as_str())
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::invalid_argument_for_command(message, None)
    }

    /// `command` is the subcommand path (`import create`) the bad argument was given to.
    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let usage = command.map_or_else(
            || "stashbook --help".to_string(),
            |path| format!("stashbook {path} --help"),
        );
        let error = Self::new(
            "invalid_argument",
            message,
            vec![format!("Run `{usage}` for usage.")],
        );
        match command {
            Some(path) => error.with_data(json!({ "command_hint": path })),
            None => error,
        }
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    /// The file name (or explicit bank id) matched no registered profile.
    pub fn unrecognized_source(identifier: &str, accepted: &[&str]) -> Self {
        Self::new(
            "unrecognized_source",
            &format!("Could not match `{identifier}` to a supported bank statement."),
            vec![
                format!(
                    "Rename the file so it starts with one of: {}.",
                    accepted.join(", ")
                ),
                "Or pass the bank explicitly with `--bank <id>` (see `stashbook banks`)."
                    .to_string(),
                "Then re-upload the statement.".to_string(),
            ],
        )
        .with_data(json!({
            "identifier": identifier,
            "accepted": accepted,
            "help_command": IMPORT_HELP_COMMAND,
        }))
    }

    pub fn unknown_bank(bank_id: &str, known_ids: &[&str]) -> Self {
        Self::new(
            "unrecognized_source",
            &format!("Bank id `{bank_id}` is not registered."),
            vec![
                format!("Use one of: {}.", known_ids.join(", ")),
                "Run `stashbook banks` to list supported banks.".to_string(),
            ],
        )
        .with_data(json!({
            "bank_id": bank_id,
            "accepted": known_ids,
        }))
    }

    pub fn statement_empty(bank_id: &str, rows_read: i64, dropped: &DropCounts) -> Self {
        Self::new(
            "statement_empty",
            &format!(
                "No usable rows were found in the statement ({rows_read} read, all dropped). Nothing was written."
            ),
            vec![
                "Check that the file is the raw CSV export for the selected bank.".to_string(),
                "Confirm the column order matches `stashbook banks` for that bank.".to_string(),
            ],
        )
        .with_data(json!({
            "bank_id": bank_id,
            "rows_read": rows_read,
            "dropped": dropped,
            "help_command": IMPORT_HELP_COMMAND,
        }))
    }

    pub fn statement_unreadable(source: &str, detail: &str) -> Self {
        Self::new(
            "statement_unreadable",
            &format!("Could not read statement `{source}`: {detail}"),
            vec![
                "Verify the path exists and the file is a UTF-8 CSV export.".to_string(),
                "Rerun `stashbook import create <path>`.".to_string(),
            ],
        )
    }

    pub fn invalid_date_range(from: &str, to: &str) -> Self {
        Self::new(
            "invalid_date_range",
            &format!("Start date `{from}` must be earlier than end date `{to}`."),
            vec!["Pick a start date before the end date and retry.".to_string()],
        )
        .with_data(json!({
            "from": from,
            "to": to,
        }))
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    fn ledger(code: &str, path: &Path, message: String, recovery_steps: Vec<String>) -> Self {
        Self::new(code, message, recovery_steps)
            .with_data(json!({ "path": path.display().to_string() }))
    }

    pub fn ledger_init_permission_denied(path: &Path, detail: &str) -> Self {
        Self::ledger(
            "ledger_init_permission_denied",
            path,
            format!("No write access to the ledger at `{}`: {detail}", path.display()),
            vec![
                "Point `--home` or `STASHBOOK_HOME` at a directory you can write to.".to_string(),
            ],
        )
    }

    pub fn ledger_locked(path: &Path) -> Self {
        Self::ledger(
            "ledger_locked",
            path,
            format!("Another process is writing to the ledger at `{}`.", path.display()),
            vec!["Wait for the other stashbook command to finish, then retry.".to_string()],
        )
    }

    pub fn ledger_corrupt(path: &Path) -> Self {
        Self::ledger(
            "ledger_corrupt",
            path,
            format!("`{}` is not a usable stashbook ledger.", path.display()),
            vec![
                "Restore the file from a backup.".to_string(),
                "Or move it aside and rerun to start an empty ledger.".to_string(),
            ],
        )
    }

    pub fn migration_failed(path: &Path, detail: &str) -> Self {
        Self::ledger(
            "migration_failed",
            path,
            format!("Could not upgrade the ledger schema at `{}`: {detail}", path.display()),
            vec![
                "Back up the ledger, then drop the conflicting object named above.".to_string(),
            ],
        )
    }

    pub fn ledger_init_failed(path: &Path, detail: &str) -> Self {
        Self::ledger(
            "ledger_init_failed",
            path,
            format!("Could not open the ledger at `{}`: {detail}", path.display()),
            Vec::new(),
        )
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::ClientError;

    #[test]
    fn unrecognized_source_lists_accepted_prefixes() {
        let error = ClientError::unrecognized_source("chase.csv", &["amex_credit", "scotia_debit"]);
        assert_eq!(error.code, "unrecognized_source");
        assert!(error.recovery_steps[0].contains("amex_credit, scotia_debit"));
        let accepted = error
            .data
            .as_ref()
            .and_then(|data| data.get("accepted"))
            .and_then(|value| value.as_array())
            .map(Vec::len);
        assert_eq!(accepted, Some(2));
    }

    #[test]
    fn invalid_date_range_keeps_both_bounds() {
        let error = ClientError::invalid_date_range("2024-03-31", "2024-03-01");
        assert_eq!(error.code, "invalid_date_range");
        assert!(error.message.contains("2024-03-31"));
        assert!(error.message.contains("2024-03-01"));
    }

    #[test]
    fn ledger_codes_are_internal_and_carry_the_path() {
        let corrupt = ClientError::ledger_corrupt(std::path::Path::new("/tmp/ledger.db"));
        assert!(corrupt.is_internal());
        assert_eq!(
            corrupt
                .data
                .as_ref()
                .and_then(|data| data.get("path"))
                .and_then(|value| value.as_str()),
            Some("/tmp/ledger.db")
        );

        let range = ClientError::invalid_date_range("2024-03-31", "2024-03-01");
        assert!(!range.is_internal());
        assert!(ClientError::internal_serialization("bad").is_internal());
    }
}
