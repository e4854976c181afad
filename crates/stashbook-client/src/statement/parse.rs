use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::statement::date::parse_statement_date;
use crate::statement::profiles::{BankProfile, RawColumn};
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatementRow {
    /// 1-based position in the source file.
    pub row: i64,
    pub transaction_date: NaiveDate,
    pub detail: String,
    pub amount: Decimal,
    pub long_detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingField,
    UnparsableDate,
    UnparsableAmount,
}

impl DropReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::UnparsableDate => "unparsable_date",
            Self::UnparsableAmount => "unparsable_amount",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedRow {
    pub row: i64,
    pub reason: DropReason,
    pub field: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DropCounts {
    pub missing_field: i64,
    pub unparsable_date: i64,
    pub unparsable_amount: i64,
}

impl DropCounts {
    pub fn from_rows(rows: &[DroppedRow]) -> Self {
        let mut counts = Self::default();
        for dropped in rows {
            match dropped.reason {
                DropReason::MissingField => counts.missing_field += 1,
                DropReason::UnparsableDate => counts.unparsable_date += 1,
                DropReason::UnparsableAmount => counts.unparsable_amount += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> i64 {
        self.missing_field + self.unparsable_date + self.unparsable_amount
    }
}

#[derive(Debug, Clone)]
pub struct ParsedStatement {
    pub rows: Vec<RawStatementRow>,
    pub rows_read: i64,
    pub dropped: Vec<DroppedRow>,
}

/// Reads a headerless statement export positionally per `profile`.
///
/// Rows with a missing required field, an unparsable date, or an unparsable
/// amount are dropped and reported. A statement where every row is dropped
/// fails with `statement_empty`.
pub fn parse_statement(
    content: &str,
    source: &str,
    profile: &BankProfile,
) -> ClientResult<ParsedStatement> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    let mut dropped = Vec::new();
    let mut rows_read = 0_i64;

    for (index, result_row) in reader.records().enumerate() {
        let record = result_row.map_err(|error| {
            ClientError::statement_unreadable(source, &format!("malformed CSV: {error}"))
        })?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        rows_read += 1;
        let row = (index as i64) + 1;

        match read_row(&record, row, profile) {
            Ok(parsed) => rows.push(parsed),
            Err(drop) => {
                warn!(
                    row = drop.row,
                    field = drop.field,
                    reason = drop.reason.as_str(),
                    bank = profile.id,
                    "dropping statement row"
                );
                dropped.push(drop);
            }
        }
    }

    debug!(
        bank = profile.id,
        rows_read,
        kept = rows.len(),
        dropped = dropped.len(),
        "parsed statement"
    );

    if rows.is_empty() {
        return Err(ClientError::statement_empty(
            profile.id,
            rows_read,
            &DropCounts::from_rows(&dropped),
        ));
    }

    Ok(ParsedStatement {
        rows,
        rows_read,
        dropped,
    })
}

fn read_row(
    record: &csv::StringRecord,
    row: i64,
    profile: &BankProfile,
) -> Result<RawStatementRow, DroppedRow> {
    let raw_date = required_field(record, row, profile, RawColumn::TransactionDate)?;
    let detail = required_field(record, row, profile, RawColumn::Detail)?;
    let raw_amount = required_field(record, row, profile, RawColumn::Amount)?;
    let long_detail = profile
        .column_index(RawColumn::LongDetail)
        .and_then(|index| field_value(record, index));

    let transaction_date = parse_statement_date(&raw_date).ok_or(DroppedRow {
        row,
        reason: DropReason::UnparsableDate,
        field: RawColumn::TransactionDate.as_str(),
    })?;
    let amount = parse_amount(&raw_amount).ok_or(DroppedRow {
        row,
        reason: DropReason::UnparsableAmount,
        field: RawColumn::Amount.as_str(),
    })?;

    Ok(RawStatementRow {
        row,
        transaction_date,
        detail,
        amount,
        long_detail,
    })
}

fn required_field(
    record: &csv::StringRecord,
    row: i64,
    profile: &BankProfile,
    column: RawColumn,
) -> Result<String, DroppedRow> {
    profile
        .column_index(column)
        .and_then(|index| field_value(record, index))
        .ok_or(DroppedRow {
            row,
            reason: DropReason::MissingField,
            field: column.as_str(),
        })
}

fn field_value(record: &csv::StringRecord, index: usize) -> Option<String> {
    let value = record.get(index)?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

/// Parses a signed statement amount, tolerating currency symbols, thousands
/// separators, and accounting-style parentheses.
pub fn parse_amount(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    let (negated, body) = match trimmed
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned = body
        .chars()
        .filter(|character| !matches!(character, '$' | ',' | ' '))
        .collect::<String>();
    if cleaned.is_empty() {
        return None;
    }

    let amount = Decimal::from_str(&cleaned).ok()?;
    if negated {
        return Some(-amount.abs());
    }
    Some(amount)
}
