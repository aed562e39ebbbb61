//! Host-facing machine API.
//!
//! [`Machine`] owns one address space and one execution engine and exposes
//! the operations a driver needs: load a program, step or run it, feed
//! keyboard input and inspect registers, flags and the video window.

use tracing::debug;

use crate::config::{ConfigError, MachineConfig};
use crate::engine::{ExecutionEngine, InputError};
use crate::memory::AddressSpace;
use crate::parser::{parse_program, ParseError};
use crate::state::{FlagsSnapshot, GENERAL_REGISTER_COUNT};
use crate::{EngineState, ExecutionFault};

/// Point-in-time copy of the host-visible processor state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineSnapshot {
    /// Lifecycle state.
    pub state: EngineState,
    /// Program counter.
    pub pc: usize,
    /// Stack pointer.
    pub sp: u16,
    /// Instructions retired in the current run.
    pub retired: u64,
    /// `R0`..`R7`.
    pub registers: [u16; GENERAL_REGISTER_COUNT],
    /// Condition flags.
    pub flags: FlagsSnapshot,
    /// Fault recorded by the last failure, if any.
    pub fault: Option<ExecutionFault>,
}

/// A configured simulator instance.
#[derive(Debug, Clone)]
pub struct Machine {
    space: AddressSpace,
    engine: ExecutionEngine,
}

impl Machine {
    /// Creates a machine with nothing loaded.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `config` violates the layout rules.
    pub fn new(config: MachineConfig) -> Result<Self, ConfigError> {
        let space = AddressSpace::new(config)?;
        let engine = ExecutionEngine::new(space.map().stack().end);
        Ok(Self { space, engine })
    }

    /// Parses and installs a program, then resets the engine to
    /// [`EngineState::Ready`].
    ///
    /// Peripheral state survives the reload.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParseError`]; the previously loaded program stays
    /// in place untouched.
    pub fn load(&mut self, text: &str) -> Result<(), ParseError> {
        let program = parse_program(text, self.space.new_program_store())?;
        debug!(
            instructions = program.len(),
            labels = program.labels().len(),
            "program loaded"
        );
        self.space.install_program(program);
        self.engine.restart(&mut self.space);
        Ok(())
    }

    /// Executes one instruction.
    pub fn step(&mut self) -> EngineState {
        self.engine.step(&mut self.space)
    }

    /// Runs until halted, failed, awaiting input, or `max_steps` is reached.
    pub fn run(&mut self, max_steps: Option<u64>) -> EngineState {
        self.engine.run(&mut self.space, max_steps)
    }

    /// Resets the processor and data store for a fresh run of the loaded program.
    pub fn restart(&mut self) {
        self.engine.restart(&mut self.space);
    }

    /// Completes a suspended keyboard read.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::NotAwaitingInput`] unless the engine is
    /// [`EngineState::AwaitingInput`].
    pub fn supply_input(&mut self, line: &str) -> Result<EngineState, InputError> {
        self.engine.supply_input(&mut self.space, line)
    }

    /// Queues a key code for later keyboard reads.
    pub fn push_key(&mut self, code: u16) {
        self.space.keyboard_mut().push_key(code);
    }

    /// Queues every character of `text` for later keyboard reads.
    pub fn push_text(&mut self, text: &str) {
        self.space.keyboard_mut().push_text(text);
    }

    /// Current contents of the video window.
    #[must_use]
    pub fn read_video_window(&self) -> &[u16] {
        self.space.read_video_window()
    }

    /// Copy of `R0`..`R7`.
    #[must_use]
    pub const fn snapshot_registers(&self) -> [u16; GENERAL_REGISTER_COUNT] {
        self.engine.arch().gprs()
    }

    /// Copy of the condition flags.
    #[must_use]
    pub const fn snapshot_flags(&self) -> FlagsSnapshot {
        self.engine.arch().flags()
    }

    /// Copy of everything a host usually reports.
    #[must_use]
    pub const fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            state: self.engine.state(),
            pc: self.pc(),
            sp: self.sp(),
            retired: self.engine.retired(),
            registers: self.snapshot_registers(),
            flags: self.snapshot_flags(),
            fault: self.engine.last_fault(),
        }
    }

    /// Program counter.
    #[must_use]
    pub const fn pc(&self) -> usize {
        self.engine.arch().pc()
    }

    /// Stack pointer.
    #[must_use]
    pub const fn sp(&self) -> u16 {
        self.engine.arch().sp()
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.engine.state()
    }

    /// Fault recorded by the last failure.
    #[must_use]
    pub const fn last_fault(&self) -> Option<ExecutionFault> {
        self.engine.last_fault()
    }

    /// Instructions retired in the current run.
    #[must_use]
    pub const fn retired(&self) -> u64 {
        self.engine.retired()
    }

    /// Address space, for inspection.
    #[must_use]
    pub const fn memory(&self) -> &AddressSpace {
        &self.space
    }

    /// Configuration the machine was built with.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        self.space.config()
    }
}
