use std::path::Path;
use std::str::FromStr;

use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use tracing::debug;

use crate::insights::range::DateRange;
use crate::state::{map_sqlite_error, open_connection};
use crate::statement::Transaction;
use crate::statement::classify::PurchaseType;
use crate::statement::date::{format_iso_date, parse_iso_date};
use crate::statement::profiles::BankProfile;
use crate::{ClientError, ClientResult};

/// Reads the profile's persisted transactions dated within `range`, both ends
/// inclusive, ordered by date then detail.
pub fn fetch_transactions(
    connection: &Connection,
    db_path: &Path,
    profile: &BankProfile,
    range: &DateRange,
) -> ClientResult<Vec<Transaction>> {
    // SAFETY: `profile.table` comes from the static profile registry and never
    // originates from user input.
    let sql = format!(
        "SELECT purchase_type, detail, transaction_date, amount
         FROM {}
         WHERE transaction_date BETWEEN ?1 AND ?2
         ORDER BY transaction_date ASC, detail ASC, purchase_type ASC, amount ASC",
        profile.table
    );
    let mut statement = connection
        .prepare(&sql)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map(
            params![format_iso_date(&range.start), format_iso_date(&range.end)],
            |row| {
                let purchase_type: String = row.get(0)?;
                let detail: String = row.get(1)?;
                let transaction_date: String = row.get(2)?;
                let amount: String = row.get(3)?;
                Ok((purchase_type, detail, transaction_date, amount))
            },
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut transactions = Vec::new();
    for row in rows_iter {
        let (purchase_type, detail, transaction_date, amount) =
            row.map_err(|error| map_sqlite_error(db_path, &error))?;

        let (Some(purchase_type), Some(transaction_date), Ok(amount)) = (
            PurchaseType::parse(&purchase_type),
            parse_iso_date(&transaction_date),
            Decimal::from_str(&amount),
        ) else {
            return Err(ClientError::ledger_corrupt(db_path));
        };

        transactions.push(Transaction {
            purchase_type,
            detail,
            transaction_date,
            amount,
        });
    }

    debug!(
        table = profile.table,
        rows = transactions.len(),
        "fetched transactions"
    );
    Ok(transactions)
}

pub fn load_transactions(
    db_path: &Path,
    profile: &BankProfile,
    range: &DateRange,
) -> ClientResult<Vec<Transaction>> {
    let connection = open_connection(db_path)?;
    fetch_transactions(&connection, db_path, profile, range)
}
