//! Operand resolution against the register file and the address space.

use crate::instruction::Operand;
use crate::memory::{AddressSpace, MemoryRead};
use crate::state::{ArchitecturalState, GeneralRegister};
use crate::FaultCode;

/// A resolved storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Location {
    /// A general-purpose register.
    Register(GeneralRegister),
    /// A validated data address.
    Data(u16),
}

/// Resolves a destination operand to a writable location.
///
/// # Errors
///
/// Returns [`FaultCode::InvalidOperand`] for immediates and
/// [`FaultCode::InvalidAddress`] for out-of-range or read-only addresses.
pub fn resolve_destination(
    operand: Operand,
    state: &ArchitecturalState,
    space: &AddressSpace,
) -> Result<Location, FaultCode> {
    match operand {
        Operand::Register(reg) => Ok(Location::Register(reg)),
        Operand::Immediate(_) => Err(FaultCode::InvalidOperand),
        Operand::Direct(addr) => space.check_write(addr).map(Location::Data),
        Operand::Indirect(reg) => space
            .check_write(u32::from(state.gpr(reg)))
            .map(Location::Data),
    }
}

/// Reads a source operand.
///
/// Keyboard reads come back as [`MemoryRead::Keyboard`] so the caller can
/// decide whether to consume the front key or suspend.
///
/// # Errors
///
/// Returns [`FaultCode::InvalidAddress`] for out-of-range addresses.
pub fn read_operand(
    operand: Operand,
    state: &ArchitecturalState,
    space: &AddressSpace,
) -> Result<MemoryRead, FaultCode> {
    match operand {
        Operand::Register(reg) => Ok(MemoryRead::Word(state.gpr(reg))),
        Operand::Immediate(value) => Ok(MemoryRead::Word(value)),
        Operand::Direct(addr) => space.read_data(addr),
        Operand::Indirect(reg) => space.read_data(u32::from(state.gpr(reg))),
    }
}

/// Reads the current value at a location.
///
/// # Errors
///
/// Returns [`FaultCode::InvalidAddress`] for out-of-range addresses.
pub fn read_location(
    location: Location,
    state: &ArchitecturalState,
    space: &AddressSpace,
) -> Result<u16, FaultCode> {
    match location {
        Location::Register(reg) => Ok(state.gpr(reg)),
        Location::Data(addr) => space.peek_data(u32::from(addr)),
    }
}

/// Reads a stack word.
///
/// # Errors
///
/// Returns [`FaultCode::InvalidAddress`] when `addr` is out of range.
pub fn read_stack(space: &AddressSpace, addr: u16) -> Result<u16, FaultCode> {
    space.peek_data(u32::from(addr))
}
