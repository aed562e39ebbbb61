//! Headless driver for the vcpu simulator: configuration files, the
//! interactive run loop and end-of-run reports.

#[cfg(test)]
use tempfile as _;

/// `key: value` machine configuration files.
pub mod config_file;
/// Run loop, stdin input and log setup.
pub mod driver;
/// Driver error types and exit codes.
pub mod errors;
/// Text and JSON end-of-run reports.
pub mod report;

pub use config_file::{parse_config, DriverConfig};
pub use driver::{init_logging, load_config, load_program, run_to_completion, Verbosity};
pub use errors::{ConfigFileError, ConfigFileErrorKind, DriverError};
pub use report::RunReport;
