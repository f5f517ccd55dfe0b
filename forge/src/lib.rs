pub mod client;
pub mod errors;
pub mod session;
pub mod testutils;
pub mod types;
