pub mod commands;
pub mod config;
pub mod status;
pub mod transport;
pub mod utils;
pub mod workspace;

// Crate version exposed for runtime queries
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
