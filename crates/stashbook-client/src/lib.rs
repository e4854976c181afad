pub mod commands;
pub mod contracts;
pub mod error;
pub mod insights;
pub mod migrations;
pub mod setup;
pub mod state;
pub mod statement;

pub use contracts::envelope::{FailureEnvelope, SuccessEnvelope};
pub use error::{ClientError, ClientResult};
pub use insights::aggregate::{AggregateOutcome, AggregateResult};
pub use insights::query::fetch_transactions;
pub use statement::Transaction;
pub use statement::classify::PurchaseType;
pub use statement::persist::{InsertOutcome, RejectReason, insert_batch};
pub use statement::profiles::{BankProfile, PROFILES};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
