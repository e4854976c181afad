use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::statement::parse::RawStatementRow;
use crate::statement::profiles::BankProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PurchaseType {
    Credit,
    Debit,
}

impl PurchaseType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "Credit",
            Self::Debit => "Debit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Credit" => Some(Self::Credit),
            "Debit" => Some(Self::Debit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub purchase_type: PurchaseType,
    /// Unsigned magnitude at cent precision.
    pub amount: Decimal,
}

/// Derives the purchase type from the signed amount and the profile's sign
/// convention, then drops the sign.
///
/// Zero never counts as a credit: it lands on `Debit` under both conventions.
pub fn classify(row: &RawStatementRow, profile: &BankProfile) -> Classification {
    classify_amount(row.amount, profile)
}

pub fn classify_amount(amount: Decimal, profile: &BankProfile) -> Classification {
    let is_credit = if profile.credit_is_negative {
        amount < Decimal::ZERO
    } else {
        amount > Decimal::ZERO
    };

    let purchase_type = if is_credit {
        PurchaseType::Credit
    } else {
        PurchaseType::Debit
    };

    Classification {
        purchase_type,
        amount: to_cents(amount.abs()),
    }
}

pub(crate) fn to_cents(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}
