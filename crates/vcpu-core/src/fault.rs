use thiserror::Error;

use crate::instruction::Mnemonic;

/// Fault taxonomy shared by the address space, parser and engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultCode {
    /// Instruction or data address outside its store, or not accessible.
    #[error("invalid memory address")]
    InvalidAddress,
    /// Register index outside `R0..R7`.
    #[error("invalid register")]
    InvalidRegister,
    /// Operand kind is not valid in this position (e.g. an immediate destination).
    #[error("invalid operand")]
    InvalidOperand,
    /// Instruction store capacity exceeded while loading.
    #[error("instruction memory overflow")]
    InstructionOverflow,
    /// Push would leave the reserved stack region.
    #[error("stack overflow")]
    StackOverflow,
    /// Pop from an empty stack.
    #[error("stack underflow")]
    StackUnderflow,
    /// Jump or call target not present in the label table.
    #[error("unknown label")]
    UnknownLabel,
    /// Division with a zero-valued divisor.
    #[error("division by zero")]
    DivisionByZero,
    /// Label defined more than once.
    #[error("duplicate label")]
    DuplicateLabel,
}

/// A fault raised while executing an instruction, with the instruction context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[error("{cause} at pc {pc} ({mnemonic})")]
pub struct ExecutionFault {
    /// Index of the faulting instruction.
    pub pc: usize,
    /// Mnemonic of the faulting instruction.
    pub mnemonic: Mnemonic,
    /// Fault raised by the instruction.
    pub cause: FaultCode,
}
