use std::path::Path;

use serde::Serialize;

use crate::{ClientError, ClientResult};

/// Positional column of a raw statement export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RawColumn {
    TransactionDate,
    Detail,
    Amount,
    LongDetail,
}

impl RawColumn {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TransactionDate => "transaction_date",
            Self::Detail => "detail",
            Self::Amount => "amount",
            Self::LongDetail => "long_detail",
        }
    }
}

/// Column order of every persisted statement table.
pub const OUTPUT_LAYOUT: [&str; 4] = ["purchase_type", "detail", "transaction_date", "amount"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BankProfile {
    pub id: &'static str,
    pub display_name: &'static str,
    /// Case-insensitive file name prefix that selects this profile.
    pub filename_prefix: &'static str,
    /// Ledger table the profile's transactions are persisted to.
    pub table: &'static str,
    pub raw_column_layout: &'static [RawColumn],
    pub credit_is_negative: bool,
    pub has_long_detail: bool,
    /// Literal substrings removed from every cleaned detail.
    pub artifact_tokens: &'static [&'static str],
    pub output_layout: &'static [&'static str],
}

impl BankProfile {
    /// Position of `column` in the raw export, if the profile carries it.
    pub fn column_index(&self, column: RawColumn) -> Option<usize> {
        self.raw_column_layout
            .iter()
            .position(|candidate| *candidate == column)
    }
}

const THREE_COLUMN_LAYOUT: [RawColumn; 3] = [
    RawColumn::TransactionDate,
    RawColumn::Detail,
    RawColumn::Amount,
];

const DEBIT_LAYOUT: [RawColumn; 4] = [
    RawColumn::TransactionDate,
    RawColumn::Amount,
    RawColumn::Detail,
    RawColumn::LongDetail,
];

// "apos" is the remains of an escaped apostrophe; "free" has the same origin in
// the exports seen so far. Kept per profile until sample data confirms which
// sources actually need it.
const EXPORT_ARTIFACT_TOKENS: [&str; 2] = ["apos", "free"];

pub static PROFILES: [BankProfile; 3] = [
    BankProfile {
        id: "amex_green",
        display_name: "American Express",
        filename_prefix: "amex_credit",
        table: "amex_green",
        raw_column_layout: &THREE_COLUMN_LAYOUT,
        credit_is_negative: true,
        has_long_detail: false,
        artifact_tokens: &EXPORT_ARTIFACT_TOKENS,
        output_layout: &OUTPUT_LAYOUT,
    },
    BankProfile {
        id: "scotia_visa_credit",
        display_name: "Scotia Bank Credit",
        filename_prefix: "scotia_credit",
        table: "scotia_visa_credit",
        raw_column_layout: &THREE_COLUMN_LAYOUT,
        credit_is_negative: false,
        has_long_detail: false,
        artifact_tokens: &EXPORT_ARTIFACT_TOKENS,
        output_layout: &OUTPUT_LAYOUT,
    },
    BankProfile {
        id: "scotia_visa_debit",
        display_name: "Scotia Bank Debit",
        filename_prefix: "scotia_debit",
        table: "scotia_visa_debit",
        raw_column_layout: &DEBIT_LAYOUT,
        credit_is_negative: false,
        has_long_detail: true,
        artifact_tokens: &EXPORT_ARTIFACT_TOKENS,
        output_layout: &OUTPUT_LAYOUT,
    },
];

pub fn accepted_prefixes() -> Vec<&'static str> {
    PROFILES
        .iter()
        .map(|profile| profile.filename_prefix)
        .collect()
}

pub fn known_ids() -> Vec<&'static str> {
    PROFILES.iter().map(|profile| profile.id).collect()
}

/// Resolves a source identifier (usually an upload's file name) by prefix.
///
/// Exactly one profile has to match; zero or several matches are both
/// reported as `unrecognized_source`.
pub fn resolve(identifier: &str) -> ClientResult<&'static BankProfile> {
    let lowered = identifier.trim().to_lowercase();
    let mut matches = PROFILES
        .iter()
        .filter(|profile| lowered.starts_with(profile.filename_prefix));

    match (matches.next(), matches.next()) {
        (Some(profile), None) => Ok(profile),
        _ => Err(ClientError::unrecognized_source(
            identifier,
            &accepted_prefixes(),
        )),
    }
}

pub fn by_id(bank_id: &str) -> ClientResult<&'static BankProfile> {
    let lowered = bank_id.trim().to_lowercase();
    PROFILES
        .iter()
        .find(|profile| profile.id == lowered)
        .ok_or_else(|| ClientError::unknown_bank(bank_id, &known_ids()))
}

/// Picks the profile for an upload: an explicit bank id wins over the file name.
pub fn resolve_for_source(
    source_path: &str,
    explicit_bank: Option<&str>,
) -> ClientResult<&'static BankProfile> {
    if let Some(bank_id) = explicit_bank {
        return by_id(bank_id);
    }

    let file_name = Path::new(source_path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(source_path);
    resolve(file_name)
}
