//! Data-store region map derived from a validated configuration.

use crate::config::MachineConfig;

/// Region classification for data addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemoryRegion {
    /// Plain read/write data.
    Data,
    /// Single input-only keyboard cell.
    Keyboard,
    /// Character cells shown on screen.
    Video,
    /// Words reserved for `PUSH`/`POP` and `CALL`/`RET`.
    Stack,
}

/// Inclusive address range of one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegionDescriptor {
    /// Region classification.
    pub region: MemoryRegion,
    /// Inclusive start address.
    pub start: u16,
    /// Inclusive end address.
    pub end: u16,
}

impl RegionDescriptor {
    /// Returns `true` when `addr` lies inside this range.
    #[must_use]
    pub const fn contains(&self, addr: u16) -> bool {
        addr >= self.start && addr <= self.end
    }

    /// Number of words covered.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    /// Always `false`; descriptors cover at least one word.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Layout of the data store: its size plus the special regions inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryMap {
    data_size: usize,
    keyboard: RegionDescriptor,
    video: RegionDescriptor,
    stack: RegionDescriptor,
}

impl MemoryMap {
    /// Builds the map for `config`. The config must already be validated.
    #[must_use]
    pub const fn from_config(config: &MachineConfig) -> Self {
        Self {
            data_size: config.data_memory_size,
            keyboard: RegionDescriptor {
                region: MemoryRegion::Keyboard,
                start: config.keyboard_buffer,
                end: config.keyboard_buffer,
            },
            video: RegionDescriptor {
                region: MemoryRegion::Video,
                start: config.video_memory_start,
                end: config.video_memory_end,
            },
            stack: RegionDescriptor {
                region: MemoryRegion::Stack,
                start: config.stack_start,
                end: config.stack_end,
            },
        }
    }

    /// Data store size in words.
    #[must_use]
    pub const fn data_size(&self) -> usize {
        self.data_size
    }

    /// Keyboard cell descriptor.
    #[must_use]
    pub const fn keyboard(&self) -> RegionDescriptor {
        self.keyboard
    }

    /// Video window descriptor.
    #[must_use]
    pub const fn video(&self) -> RegionDescriptor {
        self.video
    }

    /// Stack region descriptor.
    #[must_use]
    pub const fn stack(&self) -> RegionDescriptor {
        self.stack
    }

    /// Classifies an in-range address.
    #[must_use]
    pub const fn decode(&self, addr: u16) -> MemoryRegion {
        if self.keyboard.contains(addr) {
            MemoryRegion::Keyboard
        } else if self.video.contains(addr) {
            MemoryRegion::Video
        } else if self.stack.contains(addr) {
            MemoryRegion::Stack
        } else {
            MemoryRegion::Data
        }
    }
}
