//! Program text parser.
//!
//! Turns source text into a [`ProgramStore`]: one [`Instruction`] per
//! non-blank line plus the label table. Parsing stops at the first malformed
//! line and returns a [`ParseError`] carrying its line number and text.
//!
//! ```text
//! ; comment
//! start:  MOV R0, #10        ; immediate
//!         MOV M100, R0       ; direct memory
//! loop:   SUB MR1, #1        ; indirect memory through R1
//!         JNE loop
//! ```

use thiserror::Error;

use crate::instruction::{Instruction, Mnemonic, Operand};
use crate::memory::ProgramStore;
use crate::state::GeneralRegister;
use crate::FaultCode;

/// Classification of parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Unknown mnemonic.
    #[error("unknown mnemonic `{0}`")]
    UnknownMnemonic(String),
    /// Operand count does not match the mnemonic.
    #[error("{mnemonic} expects {expected} operand(s), found {found}")]
    OperandCount {
        /// Parsed mnemonic.
        mnemonic: Mnemonic,
        /// Operands the mnemonic takes.
        expected: usize,
        /// Operands present on the line.
        found: usize,
    },
    /// Malformed operand, or an operand kind not allowed in its position.
    #[error("invalid operand `{0}`")]
    InvalidOperand(String),
    /// Register name outside `R0`..`R7`.
    #[error("invalid register `{0}`")]
    InvalidRegister(String),
    /// Immediate that is not a 32-bit decimal.
    #[error("invalid immediate `{0}`")]
    InvalidImmediate(String),
    /// Label that is not an identifier.
    #[error("invalid label `{0}`")]
    InvalidLabel(String),
    /// Label defined twice.
    #[error("duplicate label `{0}`")]
    DuplicateLabel(String),
    /// More instructions than the instruction store holds.
    #[error("program exceeds instruction memory of {capacity} instructions")]
    ProgramTooLarge {
        /// Instruction store capacity.
        capacity: usize,
    },
}

/// Parse failure with source context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}: `{text}`")]
pub struct ParseError {
    /// 1-indexed line number.
    pub line: usize,
    /// Raw text of the offending line, trimmed.
    pub text: String,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

/// Parses `text` into `program`, returning the filled store.
///
/// Labels bind to the index of the next instruction, so a label on the last
/// line names the end of the program.
///
/// # Errors
///
/// Returns the first [`ParseError`] found. The partially filled store is
/// dropped.
pub fn parse_program(text: &str, mut program: ProgramStore) -> Result<ProgramStore, ParseError> {
    let capacity = program.capacity();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let error = |kind| ParseError {
            line,
            text: raw.trim().to_owned(),
            kind,
        };

        let mut rest = strip_comment(raw).trim();
        while let Some((label, after)) = split_label(rest) {
            if !is_valid_label(label) {
                return Err(error(ParseErrorKind::InvalidLabel(label.to_owned())));
            }
            let next_index = program.len();
            program.bind_label(label, next_index).map_err(|_| {
                error(ParseErrorKind::DuplicateLabel(label.to_owned()))
            })?;
            rest = after.trim();
        }

        if rest.is_empty() {
            continue;
        }

        let instruction = parse_instruction(rest).map_err(error)?;
        program
            .append_instruction(instruction, None)
            .map_err(|fault| match fault {
                FaultCode::InstructionOverflow => {
                    error(ParseErrorKind::ProgramTooLarge { capacity })
                }
                _ => error(ParseErrorKind::InvalidOperand(rest.to_owned())),
            })?;
    }

    Ok(program)
}

fn strip_comment(line: &str) -> &str {
    line.find(';').map_or(line, |pos| &line[..pos])
}

fn split_label(text: &str) -> Option<(&str, &str)> {
    let colon_pos = text.find(':')?;
    Some((text[..colon_pos].trim(), &text[colon_pos + 1..]))
}

fn is_valid_label(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_instruction(text: &str) -> Result<Instruction, ParseErrorKind> {
    let (name, operand_text) = text
        .split_once(char::is_whitespace)
        .map_or((text, ""), |(name, rest)| (name, rest.trim()));
    let mnemonic = Mnemonic::from_name(name)
        .ok_or_else(|| ParseErrorKind::UnknownMnemonic(name.to_owned()))?;

    let operands = split_operands(operand_text)?;
    if operands.len() != mnemonic.operand_count() {
        return Err(ParseErrorKind::OperandCount {
            mnemonic,
            expected: mnemonic.operand_count(),
            found: operands.len(),
        });
    }

    let target = || parse_target(operands[0]);
    let dst = || parse_destination(operands[0]);
    let src = |position: usize| parse_operand(operands[position]);

    Ok(match mnemonic {
        Mnemonic::Mov => Instruction::Mov {
            dst: dst()?,
            src: src(1)?,
        },
        Mnemonic::Add => Instruction::Add {
            dst: dst()?,
            src: src(1)?,
        },
        Mnemonic::Sub => Instruction::Sub {
            dst: dst()?,
            src: src(1)?,
        },
        Mnemonic::Mul => Instruction::Mul {
            dst: dst()?,
            src: src(1)?,
        },
        Mnemonic::Div => Instruction::Div {
            dst: dst()?,
            src: src(1)?,
        },
        Mnemonic::Cmp => Instruction::Cmp {
            lhs: src(0)?,
            rhs: src(1)?,
        },
        Mnemonic::Jmp => Instruction::Jmp { target: target()? },
        Mnemonic::Je => Instruction::Je { target: target()? },
        Mnemonic::Jne => Instruction::Jne { target: target()? },
        Mnemonic::Jg => Instruction::Jg { target: target()? },
        Mnemonic::Jl => Instruction::Jl { target: target()? },
        Mnemonic::Jge => Instruction::Jge { target: target()? },
        Mnemonic::Jle => Instruction::Jle { target: target()? },
        Mnemonic::Push => Instruction::Push { src: src(0)? },
        Mnemonic::Pop => Instruction::Pop { dst: dst()? },
        Mnemonic::Call => Instruction::Call { target: target()? },
        Mnemonic::Ret => Instruction::Ret,
        Mnemonic::Not => Instruction::Not { dst: dst()? },
        Mnemonic::And => Instruction::And {
            dst: dst()?,
            src: src(1)?,
        },
        Mnemonic::Or => Instruction::Or {
            dst: dst()?,
            src: src(1)?,
        },
        Mnemonic::Xor => Instruction::Xor {
            dst: dst()?,
            src: src(1)?,
        },
        Mnemonic::Shl => Instruction::Shl {
            dst: dst()?,
            src: src(1)?,
        },
        Mnemonic::Shr => Instruction::Shr {
            dst: dst()?,
            src: src(1)?,
        },
    })
}

fn split_operands(text: &str) -> Result<Vec<&str>, ParseErrorKind> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(str::trim)
        .map(|token| {
            if token.is_empty() || token.contains(char::is_whitespace) {
                Err(ParseErrorKind::InvalidOperand(token.to_owned()))
            } else {
                Ok(token)
            }
        })
        .collect()
}

fn parse_target(s: &str) -> Result<String, ParseErrorKind> {
    if is_valid_label(s) {
        Ok(s.to_owned())
    } else {
        Err(ParseErrorKind::InvalidLabel(s.to_owned()))
    }
}

fn parse_destination(s: &str) -> Result<Operand, ParseErrorKind> {
    let operand = parse_operand(s)?;
    if operand.is_writable() {
        Ok(operand)
    } else {
        Err(ParseErrorKind::InvalidOperand(s.to_owned()))
    }
}

fn parse_operand(s: &str) -> Result<Operand, ParseErrorKind> {
    if let Some(value) = s.strip_prefix('#') {
        return parse_immediate(value).map(Operand::Immediate);
    }

    if let Some(addr) = s.strip_prefix(['M', 'm']) {
        if addr.starts_with(['R', 'r']) {
            return parse_register(addr).map(Operand::Indirect);
        }
        if !addr.is_empty() && addr.bytes().all(|b| b.is_ascii_digit()) {
            return addr
                .parse::<u32>()
                .map(Operand::Direct)
                .map_err(|_| ParseErrorKind::InvalidOperand(s.to_owned()));
        }
        return Err(ParseErrorKind::InvalidOperand(s.to_owned()));
    }

    if s.starts_with(['R', 'r']) {
        return parse_register(s).map(Operand::Register);
    }

    Err(ParseErrorKind::InvalidOperand(s.to_owned()))
}

fn parse_register(s: &str) -> Result<GeneralRegister, ParseErrorKind> {
    let invalid = || ParseErrorKind::InvalidRegister(s.to_owned());
    let digits = s.get(1..).ok_or_else(invalid)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let index = digits.parse::<u8>().map_err(|_| invalid())?;
    GeneralRegister::from_index(index).map_err(|_| invalid())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_immediate(s: &str) -> Result<u16, ParseErrorKind> {
    let invalid = || ParseErrorKind::InvalidImmediate(s.to_owned());
    let value = s.parse::<i64>().map_err(|_| invalid())?;
    if value < i64::from(i32::MIN) || value > i64::from(u32::MAX) {
        return Err(invalid());
    }
    Ok((value & 0xFFFF) as u16)
}
