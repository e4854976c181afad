pub mod banks;
pub mod import;
pub mod insights;
