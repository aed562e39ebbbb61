//! Machine configuration and its validation rules.
//!
//! All sizes count 16-bit words for the data store and instructions for the
//! instruction store. Peripheral and stack windows are inclusive address
//! ranges inside the data store.

use std::ops::RangeInclusive;

use thiserror::Error;

/// Smallest accepted memory size.
pub const MIN_MEMORY_SIZE: usize = 1024;
/// Largest accepted memory size.
pub const MAX_MEMORY_SIZE: usize = 65536;
/// Memory sizes must be a whole number of these granules.
pub const MEMORY_SIZE_GRANULE: usize = 1024;

/// Default instruction store capacity.
pub const DEFAULT_INSTRUCTION_MEMORY_SIZE: usize = 8192;
/// Default data store size.
pub const DEFAULT_DATA_MEMORY_SIZE: usize = 4096;
/// Default keyboard-buffer address.
pub const DEFAULT_KEYBOARD_BUFFER: u16 = 4095;
/// Default first video address.
pub const DEFAULT_VIDEO_MEMORY_START: u16 = 0;
/// Default last video address (a 100x16 text screen).
pub const DEFAULT_VIDEO_MEMORY_END: u16 = 1599;
/// Default lowest stack address.
pub const DEFAULT_STACK_START: u16 = 3840;
/// Default highest stack address; `SP` starts here.
pub const DEFAULT_STACK_END: u16 = 4094;

/// Errors raised when a configuration violates the memory layout rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A memory size is outside `[MIN_MEMORY_SIZE, MAX_MEMORY_SIZE]` or not a
    /// multiple of `MEMORY_SIZE_GRANULE`.
    #[error(
        "invalid {store} memory size {size}: expected a multiple of {MEMORY_SIZE_GRANULE} \
         between {MIN_MEMORY_SIZE} and {MAX_MEMORY_SIZE}"
    )]
    InvalidSize {
        /// Which store was misconfigured.
        store: &'static str,
        /// Rejected size.
        size: usize,
    },
    /// An address lies outside the data store.
    #[error("{what} address {addr} is outside data memory of size {size}")]
    InvalidAddress {
        /// Which setting was misconfigured.
        what: &'static str,
        /// Rejected address.
        addr: u16,
        /// Configured data size.
        size: usize,
    },
    /// A window has its end before its start, or is too small.
    #[error("{what} window {start}..={end} is empty or too small")]
    InvalidWindow {
        /// Which window was misconfigured.
        what: &'static str,
        /// Window start.
        start: u16,
        /// Window end.
        end: u16,
    },
    /// Screen geometry with a zero dimension.
    #[error("invalid screen geometry {width}x{height}")]
    InvalidScreen {
        /// Characters per row.
        width: u16,
        /// Number of rows.
        height: u16,
    },
    /// Two special regions share an address.
    #[error("{first} overlaps {second}")]
    Overlap {
        /// First region name.
        first: &'static str,
        /// Second region name.
        second: &'static str,
    },
}

/// Top-level configuration for a machine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MachineConfig {
    /// Instruction store capacity, in instructions.
    pub instruction_memory_size: usize,
    /// Data store size, in words.
    pub data_memory_size: usize,
    /// Address of the keyboard-buffer cell.
    pub keyboard_buffer: u16,
    /// First address of the video window.
    pub video_memory_start: u16,
    /// Last address of the video window.
    pub video_memory_end: u16,
    /// Lowest address of the stack region.
    pub stack_start: u16,
    /// Highest address of the stack region.
    pub stack_end: u16,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            instruction_memory_size: DEFAULT_INSTRUCTION_MEMORY_SIZE,
            data_memory_size: DEFAULT_DATA_MEMORY_SIZE,
            keyboard_buffer: DEFAULT_KEYBOARD_BUFFER,
            video_memory_start: DEFAULT_VIDEO_MEMORY_START,
            video_memory_end: DEFAULT_VIDEO_MEMORY_END,
            stack_start: DEFAULT_STACK_START,
            stack_end: DEFAULT_STACK_END,
        }
    }
}

impl MachineConfig {
    /// Returns a copy with a different data store size, checking only the size rule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSize`] when `size` is out of range.
    pub fn with_data_memory_size(mut self, size: usize) -> Result<Self, ConfigError> {
        check_size("data", size)?;
        self.data_memory_size = size;
        Ok(self)
    }

    /// Video window as an inclusive address range.
    #[must_use]
    pub const fn video_window(&self) -> RangeInclusive<u16> {
        self.video_memory_start..=self.video_memory_end
    }

    /// Stack region as an inclusive address range.
    #[must_use]
    pub const fn stack_window(&self) -> RangeInclusive<u16> {
        self.stack_start..=self.stack_end
    }

    /// Number of cells in the video window.
    #[must_use]
    pub fn video_len(&self) -> usize {
        usize::from(self.video_memory_end.saturating_sub(self.video_memory_start)) + 1
    }

    /// Checks every layout rule.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_size("instruction", self.instruction_memory_size)?;
        check_size("data", self.data_memory_size)?;

        self.check_in_data("keyboard buffer", self.keyboard_buffer)?;

        if self.video_memory_start > self.video_memory_end {
            return Err(ConfigError::InvalidWindow {
                what: "video memory",
                start: self.video_memory_start,
                end: self.video_memory_end,
            });
        }
        self.check_in_data("video memory start", self.video_memory_start)?;
        self.check_in_data("video memory end", self.video_memory_end)?;

        // SP must stay inside the region, so one cell cannot hold anything.
        if self.stack_start >= self.stack_end {
            return Err(ConfigError::InvalidWindow {
                what: "stack",
                start: self.stack_start,
                end: self.stack_end,
            });
        }
        self.check_in_data("stack start", self.stack_start)?;
        self.check_in_data("stack end", self.stack_end)?;

        if self.video_window().contains(&self.keyboard_buffer) {
            return Err(ConfigError::Overlap {
                first: "keyboard buffer",
                second: "video memory",
            });
        }
        if self.stack_window().contains(&self.keyboard_buffer) {
            return Err(ConfigError::Overlap {
                first: "keyboard buffer",
                second: "stack",
            });
        }
        if self.stack_start <= self.video_memory_end && self.video_memory_start <= self.stack_end {
            return Err(ConfigError::Overlap {
                first: "video memory",
                second: "stack",
            });
        }

        Ok(())
    }

    fn check_in_data(&self, what: &'static str, addr: u16) -> Result<(), ConfigError> {
        if usize::from(addr) < self.data_memory_size {
            Ok(())
        } else {
            Err(ConfigError::InvalidAddress {
                what,
                addr,
                size: self.data_memory_size,
            })
        }
    }
}

const fn check_size(store: &'static str, size: usize) -> Result<(), ConfigError> {
    if size >= MIN_MEMORY_SIZE && size <= MAX_MEMORY_SIZE && size % MEMORY_SIZE_GRANULE == 0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidSize { store, size })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, MachineConfig, MAX_MEMORY_SIZE, MIN_MEMORY_SIZE};
    use rstest::rstest;

    #[test]
    fn default_config_is_valid() {
        let config = MachineConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.video_len(), 1600);
    }

    #[rstest]
    #[case(MIN_MEMORY_SIZE - 1)]
    #[case(0)]
    #[case(1000)]
    #[case(8191)]
    #[case(MAX_MEMORY_SIZE + MIN_MEMORY_SIZE)]
    fn data_size_outside_rules_is_rejected(#[case] size: usize) {
        assert_eq!(
            MachineConfig::default().with_data_memory_size(size),
            Err(ConfigError::InvalidSize {
                store: "data",
                size
            })
        );
    }

    #[rstest]
    #[case(MIN_MEMORY_SIZE)]
    #[case(4096)]
    #[case(MAX_MEMORY_SIZE)]
    fn data_size_inside_rules_is_accepted(#[case] size: usize) {
        let config = MachineConfig::default()
            .with_data_memory_size(size)
            .expect("size within rules");
        assert_eq!(config.data_memory_size, size);
    }

    #[test]
    fn instruction_size_is_validated() {
        let config = MachineConfig {
            instruction_memory_size: 70_000,
            ..MachineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSize {
                store: "instruction",
                ..
            })
        ));
    }

    #[test]
    fn keyboard_outside_data_is_rejected() {
        let config = MachineConfig {
            keyboard_buffer: 4096,
            ..MachineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidAddress {
                what: "keyboard buffer",
                addr: 4096,
                size: 4096
            })
        );
    }

    #[test]
    fn video_end_outside_data_is_rejected() {
        let config = MachineConfig {
            video_memory_end: 4096,
            ..MachineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAddress {
                what: "video memory end",
                ..
            })
        ));
    }

    #[test]
    fn inverted_video_window_is_rejected() {
        let config = MachineConfig {
            video_memory_start: 20,
            video_memory_end: 10,
            ..MachineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWindow {
                what: "video memory",
                ..
            })
        ));
    }

    #[test]
    fn single_cell_stack_is_rejected() {
        let config = MachineConfig {
            stack_start: 4000,
            stack_end: 4000,
            ..MachineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWindow { what: "stack", .. })
        ));
    }

    #[rstest]
    #[case::keyboard_in_video(MachineConfig { keyboard_buffer: 10, ..MachineConfig::default() }, "keyboard buffer", "video memory")]
    #[case::keyboard_in_stack(MachineConfig { keyboard_buffer: 4000, ..MachineConfig::default() }, "keyboard buffer", "stack")]
    #[case::video_in_stack(MachineConfig { video_memory_end: 3900, ..MachineConfig::default() }, "video memory", "stack")]
    fn overlapping_regions_are_rejected(
        #[case] config: MachineConfig,
        #[case] first: &'static str,
        #[case] second: &'static str,
    ) {
        assert_eq!(config.validate(), Err(ConfigError::Overlap { first, second }));
    }
}
