use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

const BOOTSTRAP_SQL: &str = include_str!("migrations/0001_bootstrap.sql");
const ADD_IMPORT_RUNS_SQL: &str = include_str!("migrations/0002_import_runs.sql");

pub const EXPECTED_USER_VERSION: i64 = 2;

pub const REQUIRED_META_KEYS: [(&str, &str); 1] = [("schema_version", "v1")];

/// Columns every per-bank statement table must expose.
pub const STATEMENT_TABLE_COLUMNS: [&str; 4] =
    ["purchase_type", "detail", "transaction_date", "amount"];

pub const IMPORT_RUNS_COLUMNS: [&str; 10] = [
    "import_id",
    "bank_id",
    "source_name",
    "created_at",
    "rows_read",
    "rows_dropped",
    "rows_empty_detail",
    "requested",
    "inserted",
    "rejected",
];

fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(BOOTSTRAP_SQL), M::up(ADD_IMPORT_RUNS_SQL)])
}

pub fn run_pending(conn: &mut Connection) -> rusqlite_migration::Result<()> {
    migrations().to_latest(conn)
}
