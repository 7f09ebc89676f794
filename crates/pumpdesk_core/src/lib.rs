pub mod config;
pub mod error_handler;
pub mod logging;

pub use config::PumpdeskConfig;
pub use error_handler::{ErrorCategory, PumpdeskError};
pub use logging::{filter_directive, init_logging, init_logging_to_dir};
