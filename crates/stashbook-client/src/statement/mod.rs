pub mod classify;
pub mod date;
pub mod detail;
pub mod parse;
pub mod persist;
pub mod profiles;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::state::{map_sqlite_error, open_connection};
use crate::statement::classify::PurchaseType;
use crate::statement::parse::{DroppedRow, parse_statement};
use crate::statement::persist::{ImportRunRecord, InsertOutcome, commit_batch, insert_batch};
use crate::statement::profiles::{BankProfile, resolve_for_source};
use crate::{ClientError, ClientResult};

/// Canonical, persisted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub purchase_type: PurchaseType,
    pub detail: String,
    pub transaction_date: NaiveDate,
    pub amount: Decimal,
}

/// A parsed row whose detail collapsed to nothing during cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyDetailRow {
    pub row: i64,
    pub raw_detail: String,
}

/// Everything the write path needs, computed without touching the ledger.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    pub profile: &'static BankProfile,
    pub source_name: Option<String>,
    pub transactions: Vec<Transaction>,
    /// Source row number for each entry in `transactions`.
    pub source_rows: Vec<i64>,
    pub rows_read: i64,
    pub dropped: Vec<DroppedRow>,
    pub empty_detail: Vec<EmptyDetailRow>,
}

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub path: PathBuf,
    pub bank: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Inserted,
    Partial,
    #[serde(rename = "none")]
    NothingInserted,
}

impl ImportStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Partial => "partial",
            Self::NothingInserted => "none",
        }
    }

    pub fn from_counts(outcome: &InsertOutcome, empty_detail_rows: usize) -> Self {
        if outcome.inserted_count == 0 {
            return Self::NothingInserted;
        }
        if outcome.inserted_count == outcome.requested_count && empty_detail_rows == 0 {
            return Self::Inserted;
        }
        Self::Partial
    }
}

#[derive(Debug, Clone)]
pub struct ImportExecution {
    pub prepared: PreparedStatement,
    pub dry_run: bool,
    pub import_id: Option<String>,
    pub outcome: InsertOutcome,
    pub status: ImportStatus,
}

/// Runs parse, classify and normalize over raw statement text.
pub fn prepare(
    content: &str,
    source: &str,
    profile: &'static BankProfile,
) -> ClientResult<PreparedStatement> {
    let parsed = parse_statement(content, source, profile)?;

    let mut transactions = Vec::with_capacity(parsed.rows.len());
    let mut source_rows = Vec::with_capacity(parsed.rows.len());
    let mut empty_detail = Vec::new();

    for row in &parsed.rows {
        let Some(label) = detail::normalize(row, profile) else {
            warn!(
                row = row.row,
                bank = profile.id,
                "detail empty after cleanup; row excluded"
            );
            empty_detail.push(EmptyDetailRow {
                row: row.row,
                raw_detail: row.detail.clone(),
            });
            continue;
        };

        let classification = classify::classify(row, profile);
        transactions.push(Transaction {
            purchase_type: classification.purchase_type,
            detail: label,
            transaction_date: row.transaction_date,
            amount: classification.amount,
        });
        source_rows.push(row.row);
    }

    debug!(
        bank = profile.id,
        transactions = transactions.len(),
        empty_detail = empty_detail.len(),
        "prepared statement"
    );

    Ok(PreparedStatement {
        profile,
        source_name: Some(source.to_string()),
        transactions,
        source_rows,
        rows_read: parsed.rows_read,
        dropped: parsed.dropped,
        empty_detail,
    })
}

/// Resolves the profile for the request, then reads and prepares the file.
///
/// Profile resolution happens before the file is opened so an unrecognized
/// upload is rejected without reading it.
pub fn load(request: &ImportRequest) -> ClientResult<PreparedStatement> {
    let profile = resolve_for_source(&request.path.to_string_lossy(), request.bank.as_deref())?;
    let source = source_name(&request.path);
    let content = read_statement_file(&request.path)?;
    prepare(&content, &source, profile)
}

/// Sends a prepared statement through the persistence gateway.
///
/// A dry run attempts the same inserts inside a transaction that is always
/// rolled back, so the reported outcome includes ledger duplicates.
pub fn execute(
    db_path: &Path,
    prepared: PreparedStatement,
    dry_run: bool,
) -> ClientResult<ImportExecution> {
    let mut connection = open_connection(db_path)?;

    let (import_id, outcome) = if dry_run {
        let transaction = connection
            .transaction()
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        let outcome = insert_batch(&transaction, prepared.profile, &prepared.transactions);
        transaction
            .rollback()
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        (None, outcome)
    } else {
        let committed = commit_batch(
            &mut connection,
            db_path,
            prepared.profile,
            &prepared.transactions,
            ImportRunRecord {
                source_name: prepared.source_name.as_deref(),
                rows_read: prepared.rows_read,
                rows_dropped: prepared.dropped.len() as i64,
                rows_empty_detail: prepared.empty_detail.len() as i64,
            },
        )?;
        (Some(committed.import_id), committed.outcome)
    };

    let status = ImportStatus::from_counts(&outcome, prepared.empty_detail.len());
    Ok(ImportExecution {
        prepared,
        dry_run,
        import_id,
        outcome,
        status,
    })
}

fn read_statement_file(path: &Path) -> ClientResult<String> {
    let display = path.display().to_string();
    let bytes = fs::read(path).map_err(|error| {
        ClientError::statement_unreadable(&display, &error.to_string())
    })?;
    let text = String::from_utf8(bytes).map_err(|_| {
        ClientError::statement_unreadable(&display, "file is not valid UTF-8 text")
    })?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
