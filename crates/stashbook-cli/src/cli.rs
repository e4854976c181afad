use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoDate(pub String);

impl IsoDate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn parse_iso_date(value: &str) -> Result<IsoDate, String> {
    if value.len() != 10 {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return Err("date must use YYYY-MM-DD format".to_string());
        }
    }

    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err("date must use valid calendar values".to_string());
    }

    Ok(IsoDate(value.to_string()))
}

/// Extended help shown after `stashbook import create --help`.
pub const IMPORT_CREATE_AFTER_HELP: &str = "\
How import works:
  Stashbook reads the CSV export your bank gives you, unchanged.
  The file name picks the bank profile by prefix:
    amex_credit*     American Express      (amex_green)
    scotia_credit*   Scotia Bank Credit    (scotia_visa_credit)
    scotia_debit*    Scotia Bank Debit     (scotia_visa_debit)
  Pass `--bank <id>` when the file name does not follow that pattern.

  Rows with a missing field, a date that cannot be read, or an amount
  that is not a number are dropped and reported by row number.
  Rows already in the ledger are reported as duplicates and skipped,
  so re-importing an overlapping statement is safe.

Next steps:
  1. Run `stashbook banks` to see the expected column layout per bank.
  2. Run `stashbook import create --dry-run <path>` and review the report.
  3. Run `stashbook import create <path>` to write the rows.
  4. Run `stashbook insights --bank <id> --from <date> --to <date>`.
";

#[derive(Debug, Parser)]
#[command(
    name = "stashbook",
    version,
    about = "bank statement ledger and spending insights",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Ledger home directory (defaults to $STASHBOOK_HOME, then ~/.stashbook)
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,
    /// Log pipeline details to stderr
    #[arg(long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List supported bank statement profiles
    Banks {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Import bank statements into your local ledger
    #[command(arg_required_else_help = true)]
    Import {
        #[command(subcommand)]
        command: ImportCommand,
    },
    /// Summarize one bank's transactions over a date range
    Insights {
        /// Bank profile id (see `stashbook banks`)
        #[arg(long)]
        bank: String,
        /// First day of the range (YYYY-MM-DD, inclusive)
        #[arg(long, value_parser = parse_iso_date)]
        from: IsoDate,
        /// Last day of the range (YYYY-MM-DD, inclusive)
        #[arg(long, value_parser = parse_iso_date)]
        to: IsoDate,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ImportCommand {
    /// Parse a bank CSV export and store its transactions
    #[command(after_long_help = IMPORT_CREATE_AFTER_HELP)]
    Create {
        /// Path to the bank's CSV export
        path: String,
        /// Bank profile id; overrides detection from the file name
        #[arg(long)]
        bank: Option<String>,
        /// Report what would be imported without writing to the ledger
        #[arg(long)]
        dry_run: bool,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// List past imports, newest first
    List {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}
