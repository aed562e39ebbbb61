//! Core simulator crate for the vcpu 16-bit text-assembly machine.

/// Machine configuration and layout validation.
pub mod config;
pub use config::{
    ConfigError, MachineConfig, DEFAULT_DATA_MEMORY_SIZE, DEFAULT_INSTRUCTION_MEMORY_SIZE,
    DEFAULT_KEYBOARD_BUFFER, DEFAULT_STACK_END, DEFAULT_STACK_START, DEFAULT_VIDEO_MEMORY_END,
    DEFAULT_VIDEO_MEMORY_START, MAX_MEMORY_SIZE, MEMORY_SIZE_GRANULE, MIN_MEMORY_SIZE,
};

/// Fault taxonomy shared by memory, parser and engine.
pub mod fault;
pub use fault::{ExecutionFault, FaultCode};

/// Processor state model primitives.
pub mod state;
pub use state::{ArchitecturalState, EngineState, FlagsSnapshot, GeneralRegister, GENERAL_REGISTER_COUNT};

/// Decoded instruction model.
pub mod instruction;
pub use instruction::{Instruction, Mnemonic, Operand};

/// Memory-mapped peripherals.
pub mod peripherals;
pub use peripherals::{KeyboardBuffer, ScreenGeometry, VideoBuffer};

/// Address space: instruction store, data store and peripheral windows.
pub mod memory;
pub use memory::{AddressSpace, MemoryMap, MemoryRead, MemoryRegion, ProgramStore, WriteEffect};

/// Program text parser.
pub mod parser;
pub use parser::{parse_program, ParseError, ParseErrorKind};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    commit_execution, execute_instruction, execute_instruction_with_input, ExecuteOutcome,
    ExecuteState, Location,
};

/// Fetch-execute loop and engine lifecycle.
pub mod engine;
pub use engine::{input_value, ExecutionEngine, InputError};

/// Host-facing machine API.
pub mod api;
pub use api::{Machine, MachineSnapshot};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
