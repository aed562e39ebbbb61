//! Processor state model primitives.

/// Register file, flags and special registers.
pub mod registers;
/// Engine lifecycle states.
pub mod run_state;

pub use registers::{ArchitecturalState, FlagsSnapshot, GeneralRegister, GENERAL_REGISTER_COUNT};
pub use run_state::EngineState;
