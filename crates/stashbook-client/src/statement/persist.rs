use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, TransactionBehavior, params};
use serde::Serialize;
use tracing::{info, warn};
use ulid::Ulid;

use crate::ClientResult;
use crate::state::map_sqlite_error;
use crate::statement::Transaction;
use crate::statement::date::format_iso_date;
use crate::statement::profiles::BankProfile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum RejectReason {
    DuplicateKey,
    StorageError(String),
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateKey => "duplicate_key",
            Self::StorageError(_) => "storage_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    /// 1-based position within the submitted batch.
    pub batch_index: i64,
    pub transaction: Transaction,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    pub requested_count: i64,
    pub inserted_count: i64,
    pub rejected_rows: Vec<RejectedRow>,
}

impl InsertOutcome {
    pub fn duplicate_count(&self) -> i64 {
        self.rejected_rows
            .iter()
            .filter(|rejected| rejected.reason == RejectReason::DuplicateKey)
            .count() as i64
    }
}

/// Import run bookkeeping written alongside a committed batch.
#[derive(Debug, Clone)]
pub struct ImportRunRecord<'a> {
    pub source_name: Option<&'a str>,
    pub rows_read: i64,
    pub rows_dropped: i64,
    pub rows_empty_detail: i64,
}

#[derive(Debug, Clone)]
pub struct CommittedBatch {
    pub import_id: String,
    pub outcome: InsertOutcome,
}

/// Inserts every transaction into the profile's table, one statement per row.
///
/// A failing row (duplicate natural key or any other storage error) is
/// recorded in `rejected_rows` and the remaining rows are still attempted.
pub fn insert_batch(
    transaction: &rusqlite::Transaction<'_>,
    profile: &BankProfile,
    rows: &[Transaction],
) -> InsertOutcome {
    // SAFETY: `profile.table` comes from the static profile registry and never
    // originates from user input.
    let sql = format!(
        "INSERT INTO {} (purchase_type, detail, transaction_date, amount)
         VALUES (?1, ?2, ?3, ?4)",
        profile.table
    );

    let mut outcome = InsertOutcome {
        requested_count: rows.len() as i64,
        ..InsertOutcome::default()
    };

    for (index, row) in rows.iter().enumerate() {
        let result = transaction.execute(
            &sql,
            params![
                row.purchase_type.as_str(),
                &row.detail,
                format_iso_date(&row.transaction_date),
                row.amount.to_string()
            ],
        );

        match result {
            Ok(_) => outcome.inserted_count += 1,
            Err(error) => {
                let reason = reject_reason(&error);
                warn!(
                    table = profile.table,
                    batch_index = index + 1,
                    reason = reason.as_str(),
                    detail = %row.detail,
                    "rejected transaction insert"
                );
                outcome.rejected_rows.push(RejectedRow {
                    batch_index: (index as i64) + 1,
                    transaction: row.clone(),
                    reason,
                });
            }
        }
    }

    outcome
}

/// Runs `insert_batch` inside one immediate transaction and records the run.
pub fn commit_batch(
    connection: &mut Connection,
    db_path: &Path,
    profile: &BankProfile,
    rows: &[Transaction],
    record: ImportRunRecord<'_>,
) -> ClientResult<CommittedBatch> {
    let import_id = format!("imp_{}", Ulid::new());
    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let outcome = insert_batch(&transaction, profile, rows);

    transaction
        .execute(
            "INSERT INTO internal_import_runs (
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
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &import_id,
                profile.id,
                record.source_name,
                now_timestamp(),
                record.rows_read,
                record.rows_dropped,
                record.rows_empty_detail,
                outcome.requested_count,
                outcome.inserted_count,
                outcome.rejected_rows.len() as i64
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    transaction
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    info!(
        import_id = %import_id,
        table = profile.table,
        requested = outcome.requested_count,
        inserted = outcome.inserted_count,
        rejected = outcome.rejected_rows.len(),
        "committed statement batch"
    );

    Ok(CommittedBatch { import_id, outcome })
}

fn reject_reason(error: &rusqlite::Error) -> RejectReason {
    if let rusqlite::Error::SqliteFailure(failure, _) = error
        && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    {
        return RejectReason::DuplicateKey;
    }
    RejectReason::StorageError(error.to_string())
}

pub(crate) fn now_timestamp() -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH);
    match now {
        Ok(duration) => format!("{}", duration.as_secs()),
        Err(_) => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rusqlite::Connection;
    use rust_decimal_macros::dec;

    use super::{RejectReason, insert_batch};
    use crate::migrations::run_pending;
    use crate::statement::Transaction;
    use crate::statement::classify::PurchaseType;
    use crate::statement::profiles::by_id;

    fn ledger() -> Connection {
        let opened = Connection::open_in_memory();
        assert!(opened.is_ok());
        let Ok(mut connection) = opened else {
            panic!("in-memory sqlite unavailable");
        };
        assert!(run_pending(&mut connection).is_ok());
        connection
    }

    fn sample(detail: &str, amount: rust_decimal::Decimal) -> Transaction {
        Transaction {
            purchase_type: PurchaseType::Debit,
            detail: detail.to_string(),
            transaction_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap_or_default(),
            amount,
        }
    }

    #[test]
    fn duplicate_inside_one_batch_is_rejected_but_rest_continues() {
        let mut connection = ledger();
        let Ok(profile) = by_id("amex_green") else {
            panic!("amex profile missing");
        };
        let rows = [
            sample("coffee", dec!(4.50)),
            sample("coffee", dec!(4.50)),
            sample("bakery", dec!(3.00)),
        ];

        let Ok(tx) = connection.transaction() else {
            panic!("transaction should open");
        };
        let outcome = insert_batch(&tx, profile, &rows);
        assert!(tx.commit().is_ok());
        assert_eq!(outcome.requested_count, 3);
        assert_eq!(outcome.inserted_count, 2);
        assert_eq!(outcome.rejected_rows.len(), 1);
        assert_eq!(outcome.rejected_rows[0].batch_index, 2);
        assert_eq!(outcome.rejected_rows[0].reason, RejectReason::DuplicateKey);

        let stored = connection.query_row("SELECT COUNT(*) FROM amex_green", [], |row| {
            row.get::<_, i64>(0)
        });
        assert_eq!(stored.ok(), Some(2));
    }

    #[test]
    fn out_of_range_amount_is_a_storage_error() {
        let mut connection = ledger();
        let Ok(profile) = by_id("scotia_visa_credit") else {
            panic!("scotia credit profile missing");
        };
        let rows = [sample("car dealer", dec!(25000.00)), sample("gas", dec!(40.00))];

        let tx = connection.transaction();
        assert!(tx.is_ok());
        if let Ok(tx) = tx {
            let outcome = insert_batch(&tx, profile, &rows);
            assert_eq!(outcome.inserted_count, 1);
            assert_eq!(outcome.duplicate_count(), 0);
            assert!(matches!(
                outcome.rejected_rows[0].reason,
                RejectReason::StorageError(_)
            ));
        }
    }

    #[test]
    fn profile_tables_are_isolated() {
        let mut connection = ledger();
        let (Ok(amex), Ok(debit)) = (by_id("amex_green"), by_id("scotia_visa_debit")) else {
            panic!("profiles missing");
        };
        let rows = [sample("rent", dec!(1500.00))];

        let tx = connection.transaction();
        assert!(tx.is_ok());
        if let Ok(tx) = tx {
            assert_eq!(insert_batch(&tx, amex, &rows).inserted_count, 1);
            assert_eq!(insert_batch(&tx, debit, &rows).inserted_count, 1);
        }
    }
}
