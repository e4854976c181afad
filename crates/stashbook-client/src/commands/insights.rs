use std::path::{Path, PathBuf};

use crate::ClientResult;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::InsightsData;
use crate::insights::aggregate::aggregate;
use crate::insights::range::build_range;
use crate::setup::ensure_initialized_in;
use crate::statement::date::format_iso_date;
use crate::statement::profiles::by_id;

#[derive(Debug, Default)]
pub struct InsightsRunOptions<'a> {
    pub bank: String,
    pub from: String,
    pub to: String,
    pub home_override: Option<&'a Path>,
}

pub fn run(bank: &str, from: &str, to: &str) -> ClientResult<SuccessEnvelope> {
    run_with_options(InsightsRunOptions {
        bank: bank.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        home_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: InsightsRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    // Range and bank are validated before the ledger is touched.
    let range = build_range(&options.from, &options.to, "insights")?;
    let profile = by_id(&options.bank)?;

    let setup = ensure_initialized_in(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let outcome = aggregate(&db_path, profile.id, &range)?;

    let data = InsightsData {
        bank_id: profile.id.to_string(),
        bank_name: profile.display_name.to_string(),
        from: format_iso_date(&range.start),
        to: format_iso_date(&range.end),
        outcome,
    };

    success("insights", data)
}
