use std::path::{Path, PathBuf};

use crate::ClientResult;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{
    ImportData, ImportListData, ImportListItem, ImportRejectedRow, ImportSummary,
};
use crate::setup::ensure_initialized_in;
use crate::state::{map_sqlite_error, open_connection};
use crate::statement::date::format_iso_date;
use crate::statement::parse::DropCounts;
use crate::statement::persist::RejectReason;
use crate::statement::{self, ImportExecution, ImportRequest, ImportStatus};

#[derive(Debug, Default)]
pub struct ImportRunOptions<'a> {
    pub path: String,
    pub bank: Option<String>,
    pub dry_run: bool,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct ImportListOptions<'a> {
    pub home_override: Option<&'a Path>,
}

pub fn run(path: String, bank: Option<String>, dry_run: bool) -> ClientResult<SuccessEnvelope> {
    run_with_options(ImportRunOptions {
        path,
        bank,
        dry_run,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: ImportRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let request = ImportRequest {
        path: PathBuf::from(&options.path),
        bank: options.bank.clone(),
        dry_run: options.dry_run,
    };

    // Source-level failures surface before the ledger is created or opened.
    let prepared = statement::load(&request)?;

    let setup = ensure_initialized_in(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let execution = statement::execute(&db_path, prepared, request.dry_run)?;

    success("import", import_data(options.path, setup.db_path, &execution))
}

fn import_data(path: String, db_path: String, execution: &ImportExecution) -> ImportData {
    let prepared = &execution.prepared;
    let outcome = &execution.outcome;

    let rejected_rows = outcome
        .rejected_rows
        .iter()
        .map(|rejected| {
            let position = usize::try_from(rejected.batch_index - 1).unwrap_or(usize::MAX);
            let message = match &rejected.reason {
                RejectReason::StorageError(detail) => Some(detail.clone()),
                RejectReason::DuplicateKey => None,
            };
            ImportRejectedRow {
                row: prepared
                    .source_rows
                    .get(position)
                    .copied()
                    .unwrap_or(rejected.batch_index),
                batch_index: rejected.batch_index,
                reason: rejected.reason.as_str().to_string(),
                message,
                purchase_type: rejected.transaction.purchase_type.as_str().to_string(),
                detail: rejected.transaction.detail.clone(),
                transaction_date: format_iso_date(&rejected.transaction.transaction_date),
                amount: rejected.transaction.amount,
            }
        })
        .collect::<Vec<ImportRejectedRow>>();

    let summary = ImportSummary {
        rows_read: prepared.rows_read,
        rows_dropped: prepared.dropped.len() as i64,
        rows_empty_detail: prepared.empty_detail.len() as i64,
        requested: outcome.requested_count,
        inserted: outcome.inserted_count,
        rejected: outcome.rejected_rows.len() as i64,
        duplicates: outcome.duplicate_count(),
    };

    ImportData {
        dry_run: execution.dry_run,
        path,
        bank_id: prepared.profile.id.to_string(),
        bank_name: prepared.profile.display_name.to_string(),
        table: prepared.profile.table.to_string(),
        import_id: execution.import_id.clone(),
        status: execution.status.as_str().to_string(),
        message: outcome_message(execution.dry_run, execution.status, &summary),
        drop_counts: DropCounts::from_rows(&prepared.dropped),
        dropped_rows: prepared.dropped.clone(),
        empty_detail_rows: prepared.empty_detail.clone(),
        rejected_rows,
        summary,
        db_path,
    }
}

fn outcome_message(dry_run: bool, status: ImportStatus, summary: &ImportSummary) -> String {
    if dry_run {
        return format!(
            "Dry run complete: {} of {} rows would be inserted. No rows were written.",
            summary.inserted, summary.requested
        );
    }

    match status {
        ImportStatus::Inserted => {
            format!("Import completed. All {} rows were inserted.", summary.inserted)
        }
        ImportStatus::Partial => format!(
            "Import completed with partial success: {} of {} rows inserted ({} duplicates, {} other rejections, {} empty details).",
            summary.inserted,
            summary.requested,
            summary.duplicates,
            summary.rejected - summary.duplicates,
            summary.rows_empty_detail
        ),
        ImportStatus::NothingInserted => format!(
            "No new rows were inserted ({} duplicates, {} other rejections, {} empty details).",
            summary.duplicates,
            summary.rejected - summary.duplicates,
            summary.rows_empty_detail
        ),
    }
}

pub fn list() -> ClientResult<SuccessEnvelope> {
    list_with_options(ImportListOptions {
        home_override: None,
    })
}

#[doc(hidden)]
pub fn list_with_options(options: ImportListOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = ensure_initialized_in(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;
    let mut statement = connection
        .prepare(
            "SELECT
                import_id,
                bank_id,
                source_name,
                created_at,
                rows_read,
                rows_dropped,
                rows_empty_detail,
                requested,
                inserted,
                rejected
             FROM internal_import_runs
             ORDER BY CAST(created_at AS INTEGER) DESC, import_id DESC",
        )
        .map_err(|error| map_sqlite_error(&db_path, &error))?;
    let rows_iter = statement
        .query_map([], |row| {
            Ok(ImportListItem {
                import_id: row.get(0)?,
                bank_id: row.get(1)?,
                source_name: row.get(2)?,
                created_at: row.get(3)?,
                rows_read: row.get(4)?,
                rows_dropped: row.get(5)?,
                rows_empty_detail: row.get(6)?,
                requested: row.get(7)?,
                inserted: row.get(8)?,
                rejected: row.get(9)?,
            })
        })
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let mut rows = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(&db_path, &error))?);
    }

    success("import list", ImportListData { rows })
}

#[cfg(test)]
mod tests {
    use super::{ImportSummary, outcome_message};
    use crate::statement::ImportStatus;

    fn summary(requested: i64, inserted: i64, duplicates: i64) -> ImportSummary {
        ImportSummary {
            rows_read: requested,
            rows_dropped: 0,
            rows_empty_detail: 0,
            requested,
            inserted,
            rejected: requested - inserted,
            duplicates,
        }
    }

    #[test]
    fn messages_distinguish_partial_from_nothing_inserted() {
        let partial = outcome_message(false, ImportStatus::Partial, &summary(5, 3, 2));
        assert!(partial.contains("partial success"));
        assert!(partial.contains("3 of 5"));

        let none = outcome_message(false, ImportStatus::NothingInserted, &summary(5, 0, 5));
        assert!(none.starts_with("No new rows were inserted"));

        let dry = outcome_message(true, ImportStatus::Inserted, &summary(2, 2, 0));
        assert!(dry.contains("No rows were written"));
    }
}
