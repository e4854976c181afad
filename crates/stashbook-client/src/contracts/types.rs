use rust_decimal::Decimal;
use serde::Serialize;

use crate::insights::aggregate::AggregateOutcome;
use crate::statement::EmptyDetailRow;
use crate::statement::parse::{DropCounts, DroppedRow};

#[derive(Debug, Clone, Serialize)]
pub struct BankItem {
    pub id: String,
    pub display_name: String,
    pub filename_prefix: String,
    pub table: String,
    pub raw_columns: Vec<String>,
    pub output_columns: Vec<String>,
    pub credit_is_negative: bool,
    pub has_long_detail: bool,
    /// Human wording of the sign convention, e.g. "negative amount = credit".
    pub sign_convention: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BanksData {
    pub banks: Vec<BankItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub rows_read: i64,
    pub rows_dropped: i64,
    pub rows_empty_detail: i64,
    pub requested: i64,
    pub inserted: i64,
    pub rejected: i64,
    pub duplicates: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportRejectedRow {
    /// Row number in the source file.
    pub row: i64,
    pub batch_index: i64,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub purchase_type: String,
    pub detail: String,
    pub transaction_date: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportData {
    pub dry_run: bool,
    pub path: String,
    pub bank_id: String,
    pub bank_name: String,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_id: Option<String>,
    pub status: String,
    pub message: String,
    pub summary: ImportSummary,
    pub drop_counts: DropCounts,
    pub dropped_rows: Vec<DroppedRow>,
    pub empty_detail_rows: Vec<EmptyDetailRow>,
    pub rejected_rows: Vec<ImportRejectedRow>,
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportListItem {
    pub import_id: String,
    pub bank_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    pub created_at: String,
    pub rows_read: i64,
    pub rows_dropped: i64,
    pub rows_empty_detail: i64,
    pub requested: i64,
    pub inserted: i64,
    pub rejected: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportListData {
    pub rows: Vec<ImportListItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightsData {
    pub bank_id: String,
    pub bank_name: String,
    pub from: String,
    pub to: String,
    pub outcome: AggregateOutcome,
}
