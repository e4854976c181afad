use crate::statement::parse::RawStatementRow;
use crate::statement::profiles::BankProfile;

const INTERAC_LABEL: &str = "interac e-transfer";
const PAYROLL_LABEL: &str = "payroll deposit";
const INTERNAL_TRANSFER_LABEL: &str = "Internal Transfer";
const TRANSFER_ORIGIN_MARKER: &str = "FROM -";

/// Boilerplate category labels a debit export puts in the primary detail
/// column; the memo column carries the useful text for these.
const GENERIC_DEBIT_LABELS: [&str; 11] = [
    INTERAC_LABEL,
    "pos purchase",
    "bill payment",
    "miscellaneous payment",
    "rent",
    "loan",
    "loans",
    "investment",
    "deposit",
    "withdrawal",
    "transfer",
];

/// Produces the canonical detail label for a row, or `None` when nothing
/// survives cleanup.
pub fn normalize(row: &RawStatementRow, profile: &BankProfile) -> Option<String> {
    normalize_detail(&row.detail, row.long_detail.as_deref(), profile)
}

pub fn normalize_detail(
    detail: &str,
    long_detail: Option<&str>,
    profile: &BankProfile,
) -> Option<String> {
    let substituted = if profile.has_long_detail {
        substitute_with_memo(detail, long_detail)
    } else {
        substitute_transfer(detail)
    };

    final_cleanup(&substituted, profile.artifact_tokens)
}

fn substitute_with_memo(detail: &str, long_detail: Option<&str>) -> String {
    let memo = long_detail
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let mut primary = detail.trim().to_lowercase();

    if primary == "deposit" || primary == "withdrawal" {
        primary = INTERAC_LABEL.to_string();
    }

    if memo.is_none() && primary.contains(PAYROLL_LABEL) {
        return PAYROLL_LABEL.to_string();
    }

    if let Some(memo_text) = memo
        && GENERIC_DEBIT_LABELS.contains(&primary.as_str())
    {
        return memo_text.to_string();
    }

    primary
}

fn substitute_transfer(detail: &str) -> String {
    if detail.contains(TRANSFER_ORIGIN_MARKER) {
        return INTERNAL_TRANSFER_LABEL.to_string();
    }
    detail.to_string()
}

fn final_cleanup(detail: &str, artifact_tokens: &[&str]) -> Option<String> {
    let mut text = detail.to_string();
    for token in artifact_tokens {
        text = text.replace(token, "");
    }

    let head = match text.find("  ") {
        Some(index) => &text[..index],
        None => text.as_str(),
    };

    let cleaned = head
        .chars()
        .filter(|character| character.is_ascii_alphabetic() || character.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect::<String>();

    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
