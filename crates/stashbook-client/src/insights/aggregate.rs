use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::ClientResult;
use crate::insights::query::load_transactions;
use crate::insights::range::DateRange;
use crate::statement::Transaction;
use crate::statement::classify::{PurchaseType, to_cents};
use crate::statement::date::format_iso_date;
use crate::statement::profiles::by_id;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayTotals {
    pub credit: Decimal,
    pub debit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub total_credit: Decimal,
    pub total_debit: Decimal,
    /// Summed amount per normalized detail, regardless of purchase type.
    pub by_category: BTreeMap<String, Decimal>,
    /// Keyed by ISO date.
    pub by_day: BTreeMap<String, DayTotals>,
    pub transaction_count: i64,
}

/// An empty window is its own outcome, never a zero-valued aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "aggregate", rename_all = "snake_case")]
pub enum AggregateOutcome {
    Data(AggregateResult),
    NoData,
}

pub fn summarize(transactions: &[Transaction]) -> AggregateOutcome {
    if transactions.is_empty() {
        return AggregateOutcome::NoData;
    }

    let mut total_credit = Decimal::ZERO;
    let mut total_debit = Decimal::ZERO;
    let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut by_day: BTreeMap<String, DayTotals> = BTreeMap::new();

    for transaction in transactions {
        let day = by_day
            .entry(format_iso_date(&transaction.transaction_date))
            .or_default();
        match transaction.purchase_type {
            PurchaseType::Credit => {
                total_credit += transaction.amount;
                day.credit += transaction.amount;
            }
            PurchaseType::Debit => {
                total_debit += transaction.amount;
                day.debit += transaction.amount;
            }
        }

        *by_category
            .entry(transaction.detail.clone())
            .or_insert(Decimal::ZERO) += transaction.amount;
    }

    for value in by_category.values_mut() {
        *value = to_cents(*value);
    }
    for totals in by_day.values_mut() {
        totals.credit = to_cents(totals.credit);
        totals.debit = to_cents(totals.debit);
    }

    AggregateOutcome::Data(AggregateResult {
        total_credit: to_cents(total_credit),
        total_debit: to_cents(total_debit),
        by_category,
        by_day,
        transaction_count: transactions.len() as i64,
    })
}

/// Aggregates one bank's persisted transactions over an already validated
/// range.
pub fn aggregate(
    db_path: &Path,
    bank_id: &str,
    range: &DateRange,
) -> ClientResult<AggregateOutcome> {
    let profile = by_id(bank_id)?;
    let transactions = load_transactions(db_path, profile, range)?;
    Ok(summarize(&transactions))
}
