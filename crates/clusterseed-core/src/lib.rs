// clusterseed core - shared components for the clusterseed tools

pub mod config;
pub mod error;
pub mod filesystem;
pub mod logging;
pub mod validate;

// Re-export common types and helpers
pub use config::Settings;
pub use error::{ResultExt, SeedError, SeedResult};
pub use logging::{init_logging, log_debug, log_error, log_step, log_success, log_warning};
