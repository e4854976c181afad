use crate::ClientResult;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{BankItem, BanksData};
use crate::statement::profiles::{BankProfile, PROFILES};

/// Lists the registered statement profiles. Never touches the ledger.
pub fn run() -> ClientResult<SuccessEnvelope> {
    let banks = PROFILES.iter().map(bank_item).collect::<Vec<BankItem>>();
    success("banks", BanksData { banks })
}

fn bank_item(profile: &BankProfile) -> BankItem {
    let sign_convention = if profile.credit_is_negative {
        "negative amount = credit"
    } else {
        "positive amount = credit"
    };

    BankItem {
        id: profile.id.to_string(),
        display_name: profile.display_name.to_string(),
        filename_prefix: profile.filename_prefix.to_string(),
        table: profile.table.to_string(),
        raw_columns: profile
            .raw_column_layout
            .iter()
            .map(|column| column.as_str().to_string())
            .collect(),
        output_columns: profile
            .output_layout
            .iter()
            .map(|column| (*column).to_string())
            .collect(),
        credit_is_negative: profile.credit_is_negative,
        has_long_detail: profile.has_long_detail,
        sign_convention: sign_convention.to_string(),
    }
}
