//! Address space: instruction store, data store and peripheral windows.

/// Access policy helpers.
pub mod access;
/// Data-store region map.
pub mod map;
/// Instruction store and label table.
pub mod program;

pub use access::{validate_data_address, validate_instruction_index, validate_write_access};
pub use map::{MemoryMap, MemoryRegion, RegionDescriptor};
pub use program::ProgramStore;

use tracing::trace;

use crate::config::{ConfigError, MachineConfig};
use crate::instruction::Instruction;
use crate::peripherals::{KeyboardBuffer, VideoBuffer};
use crate::FaultCode;

/// Result of reading a data address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRead {
    /// Plain value from data, stack or video memory.
    Word(u16),
    /// The keyboard cell was read; carries the front of the input queue.
    Keyboard(Option<u16>),
}

/// Side effect of a data write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEffect {
    /// Value stored in plain memory.
    Stored,
    /// Value landed in the video window.
    Video {
        /// Offset from the start of the video window.
        offset: usize,
        /// Byte kept by the video buffer.
        value: u16,
    },
}

/// Bounds-checked memory shared by the parser and the engine.
///
/// The program and data store are replaced on every load; the keyboard
/// queue and video buffer live as long as the address space.
#[derive(Debug, Clone)]
pub struct AddressSpace {
    config: MachineConfig,
    map: MemoryMap,
    program: ProgramStore,
    data: Vec<u16>,
    keyboard: KeyboardBuffer,
    video: VideoBuffer,
}

impl AddressSpace {
    /// Builds an empty address space for `config`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] reported by [`MachineConfig::validate`].
    pub fn new(config: MachineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let map = MemoryMap::from_config(&config);
        Ok(Self {
            program: ProgramStore::with_capacity(config.instruction_memory_size),
            data: vec![0; config.data_memory_size],
            keyboard: KeyboardBuffer::new(),
            video: VideoBuffer::new(map.video().len()),
            map,
            config,
        })
    }

    /// Configuration this space was built from.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Region map of the data store.
    #[must_use]
    pub const fn map(&self) -> &MemoryMap {
        &self.map
    }

    /// Empty program store sized for this space, for the parser to fill.
    #[must_use]
    pub fn new_program_store(&self) -> ProgramStore {
        ProgramStore::with_capacity(self.config.instruction_memory_size)
    }

    /// Replaces the loaded program and clears the data store.
    pub fn install_program(&mut self, program: ProgramStore) {
        self.program = program;
        self.reset_data();
    }

    /// Loaded program.
    #[must_use]
    pub const fn program(&self) -> &ProgramStore {
        &self.program
    }

    /// Appends to the loaded program.
    ///
    /// # Errors
    ///
    /// See [`ProgramStore::append_instruction`].
    pub fn append_instruction(
        &mut self,
        instruction: Instruction,
        label: Option<&str>,
    ) -> Result<usize, FaultCode> {
        self.program.append_instruction(instruction, label)
    }

    /// Fetches from the loaded program.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::InvalidAddress`] when `index` is out of range.
    pub fn instruction_at(&self, index: usize) -> Result<&Instruction, FaultCode> {
        self.program.instruction_at(index)
    }

    /// Resolves a label of the loaded program.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnknownLabel`] when `name` is not bound.
    pub fn resolve_label(&self, name: &str) -> Result<usize, FaultCode> {
        self.program.resolve_label(name)
    }

    /// Data store size in words.
    #[must_use]
    pub const fn data_size(&self) -> usize {
        self.map.data_size()
    }

    /// Reads a data address without consuming keyboard input.
    ///
    /// A keyboard read reports the pending entry; the caller decides whether
    /// to consume it with [`AddressSpace::consume_key`].
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::InvalidAddress`] when `addr` is out of range.
    pub fn read_data(&self, addr: u32) -> Result<MemoryRead, FaultCode> {
        let addr = validate_data_address(addr, self.data_size())?;
        Ok(match self.map.decode(addr) {
            MemoryRegion::Keyboard => MemoryRead::Keyboard(self.keyboard.peek()),
            MemoryRegion::Video => MemoryRead::Word(self.video_cell(addr)),
            MemoryRegion::Data | MemoryRegion::Stack => MemoryRead::Word(self.data[usize::from(addr)]),
        })
    }

    /// Reads a data address with no peripheral side effects.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::InvalidAddress`] when `addr` is out of range.
    pub fn peek_data(&self, addr: u32) -> Result<u16, FaultCode> {
        self.read_data(addr).map(MemoryRead::value)
    }

    /// Checks that `addr` may be written, returning it as a data address.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::InvalidAddress`] when `addr` is out of range or is
    /// the keyboard cell.
    pub fn check_write(&self, addr: u32) -> Result<u16, FaultCode> {
        let addr = validate_data_address(addr, self.data_size())?;
        validate_write_access(self.map.decode(addr))?;
        Ok(addr)
    }

    /// Writes a data address.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::InvalidAddress`] when `addr` is out of range or is
    /// the keyboard cell. Nothing is written on error.
    pub fn write_data(&mut self, addr: u32, value: u16) -> Result<WriteEffect, FaultCode> {
        let addr = self.check_write(addr)?;
        if self.map.decode(addr) == MemoryRegion::Video {
            let offset = usize::from(addr - self.map.video().start);
            let stored = self
                .video
                .write(offset, value)
                .ok_or(FaultCode::InvalidAddress)?;
            trace!(addr, value = stored, "video write");
            return Ok(WriteEffect::Video {
                offset,
                value: stored,
            });
        }
        self.data[usize::from(addr)] = value;
        Ok(WriteEffect::Stored)
    }

    /// Consumes the front of the keyboard queue.
    pub fn consume_key(&mut self) -> Option<u16> {
        self.keyboard.pop()
    }

    /// Keyboard queue.
    #[must_use]
    pub const fn keyboard(&self) -> &KeyboardBuffer {
        &self.keyboard
    }

    /// Mutable keyboard queue, for drivers queueing input.
    pub fn keyboard_mut(&mut self) -> &mut KeyboardBuffer {
        &mut self.keyboard
    }

    /// Current contents of the video window, in address order.
    #[must_use]
    pub fn read_video_window(&self) -> &[u16] {
        self.video.cells()
    }

    /// Zeroes the data store. Peripherals are untouched.
    pub fn reset_data(&mut self) {
        self.data.fill(0);
    }

    fn video_cell(&self, addr: u16) -> u16 {
        self.video
            .read(usize::from(addr - self.map.video().start))
            .unwrap_or_default()
    }
}
