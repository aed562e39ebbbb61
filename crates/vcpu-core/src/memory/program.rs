//! Instruction store and label table.

use std::collections::BTreeMap;

use crate::instruction::Instruction;
use crate::memory::access::validate_instruction_index;
use crate::FaultCode;

/// Fixed-capacity instruction sequence plus its label table.
///
/// Filled while parsing, read-only while executing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramStore {
    capacity: usize,
    instructions: Vec<Instruction>,
    labels: BTreeMap<String, usize>,
}

impl ProgramStore {
    /// Creates an empty store holding at most `capacity` instructions.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            instructions: Vec::new(),
            labels: BTreeMap::new(),
        }
    }

    /// Appends an instruction, optionally binding `label` to its index.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::InstructionOverflow`] when the store is full and
    /// [`FaultCode::DuplicateLabel`] when `label` is already bound. Nothing is
    /// appended on error.
    pub fn append_instruction(
        &mut self,
        instruction: Instruction,
        label: Option<&str>,
    ) -> Result<usize, FaultCode> {
        if self.instructions.len() >= self.capacity {
            return Err(FaultCode::InstructionOverflow);
        }
        let index = self.instructions.len();
        if let Some(name) = label {
            self.bind_label(name, index)?;
        }
        self.instructions.push(instruction);
        Ok(index)
    }

    /// Binds `name` to `index`. `index` may equal the current length, which
    /// names the position just past the last instruction.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::DuplicateLabel`] when `name` is already bound and
    /// [`FaultCode::InvalidAddress`] when `index` is past the end.
    pub fn bind_label(&mut self, name: &str, index: usize) -> Result<(), FaultCode> {
        if index > self.instructions.len() {
            return Err(FaultCode::InvalidAddress);
        }
        if self.labels.contains_key(name) {
            return Err(FaultCode::DuplicateLabel);
        }
        self.labels.insert(name.to_owned(), index);
        Ok(())
    }

    /// Fetches the instruction at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::InvalidAddress`] when `index` is out of range.
    pub fn instruction_at(&self, index: usize) -> Result<&Instruction, FaultCode> {
        let index = validate_instruction_index(index, self.instructions.len())?;
        Ok(&self.instructions[index])
    }

    /// Looks up a label.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::UnknownLabel`] when `name` is not bound.
    pub fn resolve_label(&self, name: &str) -> Result<usize, FaultCode> {
        self.labels
            .get(name)
            .copied()
            .ok_or(FaultCode::UnknownLabel)
    }

    /// Number of stored instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` when no instruction is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Maximum number of instructions.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored instructions in order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Label table, sorted by name.
    #[must_use]
    pub const fn labels(&self) -> &BTreeMap<String, usize> {
        &self.labels
    }
}
