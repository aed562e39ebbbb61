//! `key: value` machine configuration files.
//!
//! ```text
//! # 8 KiB of data, screen unchanged
//! data_memory_size: 8192
//! keyboard_buffer: 8191
//! ```
//!
//! Blank lines and `#` comments are ignored. Keys left out keep their
//! defaults; the assembled configuration is validated as a whole.

use std::str::FromStr;

use vcpu_core::{ConfigError, MachineConfig, ScreenGeometry};
use vcpu_core::peripherals::{DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH};

use crate::errors::{ConfigFileError, ConfigFileErrorKind};

/// Machine layout plus how the driver draws the video window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Memory layout handed to the core.
    pub machine: MachineConfig,
    /// Characters per screen row.
    pub screen_width: u16,
    /// Number of screen rows.
    pub screen_height: u16,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            machine: MachineConfig::default(),
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
        }
    }
}

impl DriverConfig {
    /// Screen layout described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidScreen`] when a dimension is zero.
    pub const fn screen(&self) -> Result<ScreenGeometry, ConfigError> {
        ScreenGeometry::new(self.screen_width, self.screen_height)
    }

    /// Checks the machine layout and the screen dimensions.
    ///
    /// # Errors
    ///
    /// Returns the first rule the configuration breaks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.machine.validate()?;
        self.screen().map(|_| ())
    }
}

const KEYS: [&str; 9] = [
    "instruction_memory_size",
    "data_memory_size",
    "keyboard_buffer",
    "video_memory_start",
    "video_memory_end",
    "stack_start",
    "stack_end",
    "screen_width",
    "screen_height",
];

/// Parses configuration text on top of the defaults.
///
/// Only syntax is checked here; call [`DriverConfig::validate`] for layout
/// rules.
///
/// # Errors
///
/// Returns the first malformed, unknown, duplicate or out-of-range line.
pub fn parse_config(text: &str) -> Result<DriverConfig, ConfigFileError> {
    let mut config = DriverConfig::default();
    let mut seen = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let fail = |kind| ConfigFileError { line, kind };

        let content = raw.split_once('#').map_or(raw, |(before, _)| before).trim();
        if content.is_empty() {
            continue;
        }

        let (key, value) = content
            .split_once(':')
            .map(|(key, value)| (key.trim(), value.trim()))
            .filter(|(key, value)| !key.is_empty() && !value.is_empty())
            .ok_or_else(|| fail(ConfigFileErrorKind::Malformed(content.to_owned())))?;

        if !KEYS.contains(&key) {
            return Err(fail(ConfigFileErrorKind::UnknownKey(key.to_owned())));
        }
        if seen.contains(&key) {
            return Err(fail(ConfigFileErrorKind::DuplicateKey(key.to_owned())));
        }
        seen.push(key);

        let machine = &mut config.machine;
        match key {
            "instruction_memory_size" => machine.instruction_memory_size = number(key, value, line)?,
            "data_memory_size" => machine.data_memory_size = number(key, value, line)?,
            "keyboard_buffer" => machine.keyboard_buffer = number(key, value, line)?,
            "video_memory_start" => machine.video_memory_start = number(key, value, line)?,
            "video_memory_end" => machine.video_memory_end = number(key, value, line)?,
            "stack_start" => machine.stack_start = number(key, value, line)?,
            "stack_end" => machine.stack_end = number(key, value, line)?,
            "screen_width" => config.screen_width = number(key, value, line)?,
            _ => config.screen_height = number(key, value, line)?,
        }
    }

    Ok(config)
}

fn number<T: FromStr>(key: &str, value: &str, line: usize) -> Result<T, ConfigFileError> {
    value.parse().map_err(|_| ConfigFileError {
        line,
        kind: ConfigFileErrorKind::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
        },
    })
}
