//! Access policy helpers for instruction and data addresses.

use crate::{FaultCode, MemoryRegion};

/// Validates a data address against the data store size.
///
/// Direct operands carry 32-bit addresses, so anything past `data_size` or
/// past the 16-bit address space is rejected here.
///
/// # Errors
///
/// Returns [`FaultCode::InvalidAddress`] when `addr >= data_size`.
pub fn validate_data_address(addr: u32, data_size: usize) -> Result<u16, FaultCode> {
    let addr = u16::try_from(addr).map_err(|_| FaultCode::InvalidAddress)?;
    if usize::from(addr) < data_size {
        Ok(addr)
    } else {
        Err(FaultCode::InvalidAddress)
    }
}

/// Validates write legality for a decoded region.
///
/// The keyboard cell is input-only; every other region accepts writes.
///
/// # Errors
///
/// Returns [`FaultCode::InvalidAddress`] for the keyboard cell.
pub const fn validate_write_access(region: MemoryRegion) -> Result<(), FaultCode> {
    match region {
        MemoryRegion::Keyboard => Err(FaultCode::InvalidAddress),
        MemoryRegion::Data | MemoryRegion::Video | MemoryRegion::Stack => Ok(()),
    }
}

/// Validates an instruction index against the number of loaded instructions.
///
/// # Errors
///
/// Returns [`FaultCode::InvalidAddress`] when `index >= count`.
pub const fn validate_instruction_index(index: usize, count: usize) -> Result<usize, FaultCode> {
    if index < count {
        Ok(index)
    } else {
        Err(FaultCode::InvalidAddress)
    }
}
