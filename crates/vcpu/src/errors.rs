//! Error types for the driver.
//!
//! Every failure the binary can report funnels into [`DriverError`], which
//! also decides the process exit status.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vcpu_core::{ConfigError, EngineState, ExecutionFault, InputError, ParseError};

/// One malformed line of a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ConfigFileError {
    /// 1-indexed line number.
    pub line: usize,
    /// What was wrong with it.
    pub kind: ConfigFileErrorKind,
}

/// Classification of configuration file errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigFileErrorKind {
    /// The line is not of the form `key: value`.
    #[error("expected `key: value`, found `{0}`")]
    Malformed(String),
    /// The key is not a recognised setting.
    #[error("unknown key `{0}`")]
    UnknownKey(String),
    /// The key appeared twice.
    #[error("duplicate key `{0}`")]
    DuplicateKey(String),
    /// The value is not a number in range for the key.
    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue {
        /// Key being set.
        key: String,
        /// Offending text.
        value: String,
    },
}

/// Errors surfaced by the `vcpu` binary.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The configuration file is malformed.
    #[error("{}: {source}", path.display())]
    ConfigFile {
        /// Configuration file path.
        path: PathBuf,
        /// First bad line.
        #[source]
        source: ConfigFileError,
    },
    /// The configuration describes an impossible machine.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The program failed to parse.
    #[error("{}: {source}", path.display())]
    Parse {
        /// Program path.
        path: PathBuf,
        /// First parse error.
        #[source]
        source: ParseError,
    },
    /// Reading standard input failed.
    #[error("failed to read input: {0}")]
    Stdin(#[source] io::Error),
    /// Standard input ended while the program was waiting for a key.
    #[error("input closed while the program was awaiting input at pc {pc}")]
    InputClosed {
        /// Suspended instruction.
        pc: usize,
    },
    /// Input was supplied in the wrong state.
    #[error(transparent)]
    Input(#[from] InputError),
    /// The program faulted.
    #[error("execution failed: {0}")]
    Fault(ExecutionFault),
    /// The engine stopped without a recorded fault.
    #[error("execution stopped: {state}")]
    Stopped {
        /// Final state.
        state: EngineState,
    },
    /// The run stopped before the program finished.
    #[error("step limit of {limit} reached (state: {state})")]
    StepLimit {
        /// Configured limit.
        limit: u64,
        /// State when the limit hit.
        state: EngineState,
    },
}

impl DriverError {
    /// Process exit status for this error: 2 for runtime outcomes, 1 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Fault(_)
            | Self::Stopped { .. }
            | Self::StepLimit { .. }
            | Self::InputClosed { .. } => 2,
            Self::Read { .. }
            | Self::ConfigFile { .. }
            | Self::Config(_)
            | Self::Parse { .. }
            | Self::Stdin(_)
            | Self::Input(_) => 1,
        }
    }
}
