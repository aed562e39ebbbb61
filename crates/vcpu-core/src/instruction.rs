//! Decoded instruction model.
//!
//! A loaded program is a sequence of [`Instruction`] values. Each variant maps
//! to exactly one mnemonic, so the engine dispatches with one exhaustive match.

use std::fmt;

use crate::state::GeneralRegister;

/// Instruction mnemonic, independent of operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Mnemonic {
    Mov,
    Add,
    Sub,
    Mul,
    Div,
    Cmp,
    Jmp,
    Je,
    Jne,
    Jg,
    Jl,
    Jge,
    Jle,
    Push,
    Pop,
    Call,
    Ret,
    Not,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl Mnemonic {
    /// Every mnemonic, in documentation order.
    pub const ALL: [Self; 23] = [
        Self::Mov,
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Cmp,
        Self::Jmp,
        Self::Je,
        Self::Jne,
        Self::Jg,
        Self::Jl,
        Self::Jge,
        Self::Jle,
        Self::Push,
        Self::Pop,
        Self::Call,
        Self::Ret,
        Self::Not,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Shl,
        Self::Shr,
    ];

    /// Canonical upper-case spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mov => "MOV",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Cmp => "CMP",
            Self::Jmp => "JMP",
            Self::Je => "JE",
            Self::Jne => "JNE",
            Self::Jg => "JG",
            Self::Jl => "JL",
            Self::Jge => "JGE",
            Self::Jle => "JLE",
            Self::Push => "PUSH",
            Self::Pop => "POP",
            Self::Call => "CALL",
            Self::Ret => "RET",
            Self::Not => "NOT",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Shl => "SHL",
            Self::Shr => "SHR",
        }
    }

    /// Looks up a mnemonic, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mnemonic| mnemonic.as_str().eq_ignore_ascii_case(name))
    }

    /// Number of operands the mnemonic takes.
    #[must_use]
    pub const fn operand_count(self) -> usize {
        match self {
            Self::Ret => 0,
            Self::Jmp
            | Self::Je
            | Self::Jne
            | Self::Jg
            | Self::Jl
            | Self::Jge
            | Self::Jle
            | Self::Push
            | Self::Pop
            | Self::Call
            | Self::Not => 1,
            Self::Mov
            | Self::Add
            | Self::Sub
            | Self::Mul
            | Self::Div
            | Self::Cmp
            | Self::And
            | Self::Or
            | Self::Xor
            | Self::Shl
            | Self::Shr => 2,
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value-producing or value-receiving operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operand {
    /// `R0`..`R7`.
    Register(GeneralRegister),
    /// `#value`, already truncated to 16 bits.
    Immediate(u16),
    /// `M<addr>`; range checked when executed.
    Direct(u32),
    /// `M<reg>`; the register holds the address.
    Indirect(GeneralRegister),
}

impl Operand {
    /// Returns `true` for operands that name a storage location.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::Immediate(_))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(reg) => write!(f, "{reg}"),
            Self::Immediate(value) => write!(f, "#{value}"),
            Self::Direct(addr) => write!(f, "M{addr}"),
            Self::Indirect(reg) => write!(f, "M{reg}"),
        }
    }
}

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Instruction {
    Mov { dst: Operand, src: Operand },
    Add { dst: Operand, src: Operand },
    Sub { dst: Operand, src: Operand },
    Mul { dst: Operand, src: Operand },
    Div { dst: Operand, src: Operand },
    Cmp { lhs: Operand, rhs: Operand },
    Jmp { target: String },
    Je { target: String },
    Jne { target: String },
    Jg { target: String },
    Jl { target: String },
    Jge { target: String },
    Jle { target: String },
    Push { src: Operand },
    Pop { dst: Operand },
    Call { target: String },
    Ret,
    Not { dst: Operand },
    And { dst: Operand, src: Operand },
    Or { dst: Operand, src: Operand },
    Xor { dst: Operand, src: Operand },
    Shl { dst: Operand, src: Operand },
    Shr { dst: Operand, src: Operand },
}

impl Instruction {
    /// Mnemonic of this instruction.
    #[must_use]
    pub const fn mnemonic(&self) -> Mnemonic {
        match self {
            Self::Mov { .. } => Mnemonic::Mov,
            Self::Add { .. } => Mnemonic::Add,
            Self::Sub { .. } => Mnemonic::Sub,
            Self::Mul { .. } => Mnemonic::Mul,
            Self::Div { .. } => Mnemonic::Div,
            Self::Cmp { .. } => Mnemonic::Cmp,
            Self::Jmp { .. } => Mnemonic::Jmp,
            Self::Je { .. } => Mnemonic::Je,
            Self::Jne { .. } => Mnemonic::Jne,
            Self::Jg { .. } => Mnemonic::Jg,
            Self::Jl { .. } => Mnemonic::Jl,
            Self::Jge { .. } => Mnemonic::Jge,
            Self::Jle { .. } => Mnemonic::Jle,
            Self::Push { .. } => Mnemonic::Push,
            Self::Pop { .. } => Mnemonic::Pop,
            Self::Call { .. } => Mnemonic::Call,
            Self::Ret => Mnemonic::Ret,
            Self::Not { .. } => Mnemonic::Not,
            Self::And { .. } => Mnemonic::And,
            Self::Or { .. } => Mnemonic::Or,
            Self::Xor { .. } => Mnemonic::Xor,
            Self::Shl { .. } => Mnemonic::Shl,
            Self::Shr { .. } => Mnemonic::Shr,
        }
    }

    /// Label referenced by a jump or call, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Jmp { target }
            | Self::Je { target }
            | Self::Jne { target }
            | Self::Jg { target }
            | Self::Jl { target }
            | Self::Jge { target }
            | Self::Jle { target }
            | Self::Call { target } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.mnemonic();
        match self {
            Self::Mov { dst, src }
            | Self::Add { dst, src }
            | Self::Sub { dst, src }
            | Self::Mul { dst, src }
            | Self::Div { dst, src }
            | Self::And { dst, src }
            | Self::Or { dst, src }
            | Self::Xor { dst, src }
            | Self::Shl { dst, src }
            | Self::Shr { dst, src } => write!(f, "{mnemonic} {dst}, {src}"),
            Self::Cmp { lhs, rhs } => write!(f, "{mnemonic} {lhs}, {rhs}"),
            Self::Jmp { target }
            | Self::Je { target }
            | Self::Jne { target }
            | Self::Jg { target }
            | Self::Jl { target }
            | Self::Jge { target }
            | Self::Jle { target }
            | Self::Call { target } => write!(f, "{mnemonic} {target}"),
            Self::Push { src: operand } | Self::Pop { dst: operand } | Self::Not { dst: operand } => {
                write!(f, "{mnemonic} {operand}")
            }
            Self::Ret => write!(f, "{mnemonic}"),
        }
    }
}
