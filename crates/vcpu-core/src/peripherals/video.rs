//! Byte-per-character video buffer mapped into the data store.
//!
//! Writes inside the video window land here instead of plain data memory.
//! Only the low byte of each word is kept, matching a character display.

use crate::config::ConfigError;

/// Default characters per screen row.
pub const DEFAULT_SCREEN_WIDTH: u16 = 100;
/// Default number of screen rows.
pub const DEFAULT_SCREEN_HEIGHT: u16 = 16;

/// Text layout of the video window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ScreenGeometry {
    width: u16,
    height: u16,
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self {
            width: DEFAULT_SCREEN_WIDTH,
            height: DEFAULT_SCREEN_HEIGHT,
        }
    }
}

impl ScreenGeometry {
    /// Creates a geometry with non-zero dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidScreen`] when either dimension is zero.
    pub const fn new(width: u16, height: u16) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidScreen { width, height });
        }
        Ok(Self { width, height })
    }

    /// Characters per row.
    #[must_use]
    pub const fn width(self) -> u16 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(self) -> u16 {
        self.height
    }

    /// Number of character cells on screen.
    #[must_use]
    pub fn cells(self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    /// Renders `cells` as at most `height` rows of `width` characters.
    ///
    /// Control characters and NUL render as spaces; other bytes are Latin-1.
    #[must_use]
    pub fn render_rows(self, cells: &[u16]) -> Vec<String> {
        cells
            .chunks(usize::from(self.width))
            .take(usize::from(self.height))
            .map(|row| row.iter().map(|&cell| display_char(cell)).collect())
            .collect()
    }
}

fn display_char(cell: u16) -> char {
    let byte = cell.to_le_bytes()[0];
    let ch = char::from(byte);
    if ch.is_control() {
        ' '
    } else {
        ch
    }
}

/// Display-visible copy of the video window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoBuffer {
    cells: Vec<u16>,
}

impl VideoBuffer {
    /// Creates a blank buffer of `len` cells.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            cells: vec![0; len],
        }
    }

    /// Stores the low byte of `value` at `offset`; returns the stored byte.
    ///
    /// Offsets past the end are ignored and return `None`.
    pub fn write(&mut self, offset: usize, value: u16) -> Option<u16> {
        let cell = self.cells.get_mut(offset)?;
        *cell = value & 0x00FF;
        Some(*cell)
    }

    /// Reads the byte stored at `offset`.
    #[must_use]
    pub fn read(&self, offset: usize) -> Option<u16> {
        self.cells.get(offset).copied()
    }

    /// Every cell, in address order.
    #[must_use]
    pub fn cells(&self) -> &[u16] {
        &self.cells
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` for a zero-length window.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Blanks every cell.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }
}
