//! Arithmetic results and their condition flags.
//!
//! Every operation works on a widened intermediate and truncates to 16 bits;
//! ZF, SF and PF always describe the truncated result.

use crate::state::FlagsSnapshot;
use crate::FaultCode;

/// Describes how FLAGS should be updated after an instruction executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagsUpdate {
    /// No change to FLAGS.
    #[default]
    None,
    /// Replace all five flags.
    Set(FlagsSnapshot),
}

/// Truncated result plus the flags it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluOutput {
    /// 16-bit result.
    pub value: u16,
    /// Flags after the operation.
    pub flags: FlagsSnapshot,
}

impl AluOutput {
    const fn new(value: u16, carry: bool, overflow: bool) -> Self {
        Self {
            value,
            flags: result_flags(value, carry, overflow),
        }
    }
}

/// Flags for a truncated `result` with explicit carry and overflow.
#[must_use]
pub const fn result_flags(result: u16, carry: bool, overflow: bool) -> FlagsSnapshot {
    FlagsSnapshot {
        cf: carry,
        pf: (result & 0x00FF).count_ones() % 2 == 0,
        zf: result == 0,
        sf: result & 0x8000 != 0,
        of: overflow,
    }
}

/// `a + b`; CF on unsigned carry out of bit 15, OF on signed overflow.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn add(a: u16, b: u16) -> AluOutput {
    let wide = a as u32 + b as u32;
    let value = wide as u16;
    let overflow = (a ^ value) & (b ^ value) & 0x8000 != 0;
    AluOutput::new(value, wide > 0xFFFF, overflow)
}

/// `a - b`; CF on unsigned borrow, OF on signed overflow.
#[must_use]
pub const fn sub(a: u16, b: u16) -> AluOutput {
    let value = a.wrapping_sub(b);
    let overflow = (a ^ b) & (a ^ value) & 0x8000 != 0;
    AluOutput::new(value, a < b, overflow)
}

/// Low 16 bits of `a * b`; CF and OF cleared.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn mul(a: u16, b: u16) -> AluOutput {
    let wide = a as u32 * b as u32;
    AluOutput::new(wide as u16, false, false)
}

/// Unsigned `a / b`; CF and OF cleared.
///
/// # Errors
///
/// Returns [`FaultCode::DivisionByZero`] when `b == 0`.
pub const fn div(a: u16, b: u16) -> Result<AluOutput, FaultCode> {
    if b == 0 {
        return Err(FaultCode::DivisionByZero);
    }
    Ok(AluOutput::new(a / b, false, false))
}

/// Bitwise result with CF and OF cleared.
#[must_use]
pub const fn logic(value: u16) -> AluOutput {
    AluOutput::new(value, false, false)
}

/// Logical left shift by `count & 0x1F`; CF is the last bit shifted out.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn shl(a: u16, count: u16) -> AluOutput {
    let shift = count & 0x1F;
    let wide = (a as u64) << shift;
    AluOutput::new(wide as u16, (wide >> 16) & 1 != 0, false)
}

/// Logical right shift by `count & 0x1F`; CF is the last bit shifted out.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn shr(a: u16, count: u16) -> AluOutput {
    let shift = count & 0x1F;
    if shift == 0 {
        return AluOutput::new(a, false, false);
    }
    let wide = a as u32;
    let carry = (wide >> (shift - 1)) & 1 != 0;
    AluOutput::new((wide >> shift) as u16, carry, false)
}
