pub mod metadata;
pub mod triage;
pub mod utils;
