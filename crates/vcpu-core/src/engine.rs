//! Fetch-execute loop and engine lifecycle.

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::execute::{commit_execution, execute_instruction_with_input, ExecuteOutcome};
use crate::memory::AddressSpace;
use crate::state::ArchitecturalState;
use crate::{EngineState, ExecutionFault};

/// Errors raised when supplying keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    /// The engine is not parked on a keyboard read.
    #[error("engine is not awaiting input (state: {state})")]
    NotAwaitingInput {
        /// State at the time of the call.
        state: EngineState,
    },
}

/// Register file, flags, PC and SP plus the run-state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionEngine {
    arch: ArchitecturalState,
    state: EngineState,
    last_fault: Option<ExecutionFault>,
    retired: u64,
}

impl ExecutionEngine {
    /// Creates an engine in [`EngineState::Ready`] with `SP` at `stack_top`.
    #[must_use]
    pub const fn new(stack_top: u16) -> Self {
        Self {
            arch: ArchitecturalState::with_stack_top(stack_top),
            state: EngineState::Ready,
            last_fault: None,
            retired: 0,
        }
    }

    /// Register file, flags, PC and SP.
    #[must_use]
    pub const fn arch(&self) -> &ArchitecturalState {
        &self.arch
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// Fault that moved the engine to [`EngineState::Failed`], if any.
    #[must_use]
    pub const fn last_fault(&self) -> Option<ExecutionFault> {
        self.last_fault
    }

    /// Instructions retired since the start of the current run.
    #[must_use]
    pub const fn retired(&self) -> u64 {
        self.retired
    }

    /// Resets registers, flags, PC and SP and clears the data store.
    ///
    /// The loaded program and the peripherals are kept.
    pub fn restart(&mut self, space: &mut AddressSpace) {
        *self = Self::new(space.map().stack().end);
        space.reset_data();
        debug!("engine restarted");
    }

    /// Executes one instruction.
    ///
    /// Does nothing unless the engine is [`EngineState::Ready`] or
    /// [`EngineState::Running`].
    pub fn step(&mut self, space: &mut AddressSpace) -> EngineState {
        if !self.state.can_step() {
            return self.state;
        }

        let pc = self.arch.pc();
        if pc == space.program().len() {
            info!(retired = self.retired, "program halted");
            self.transition(EngineState::Halted);
            return self.state;
        }

        self.execute_at(space, pc, None);
        self.state
    }

    fn execute_at(&mut self, space: &mut AddressSpace, pc: usize, input: Option<u16>) {
        let (mnemonic, outcome, exec) = match space.instruction_at(pc) {
            Ok(instr) => {
                trace!(pc, instruction = %instr, "execute");
                let (outcome, exec) =
                    execute_instruction_with_input(instr, pc, &self.arch, space, input);
                (instr.mnemonic(), outcome, exec)
            }
            Err(cause) => {
                warn!(pc, %cause, "instruction fetch failed");
                self.transition(EngineState::Failed(cause));
                return;
            }
        };

        let outcome = match outcome {
            ExecuteOutcome::Retired => match commit_execution(&mut self.arch, space, &exec) {
                Ok(()) => ExecuteOutcome::Retired,
                Err(cause) => ExecuteOutcome::Fault(cause),
            },
            other => other,
        };

        match outcome {
            ExecuteOutcome::Retired => {
                self.retired += 1;
                self.transition(EngineState::Running);
            }
            ExecuteOutcome::AwaitInput => {
                debug!(pc, "waiting for keyboard input");
                self.transition(EngineState::AwaitingInput);
            }
            ExecuteOutcome::Fault(cause) => {
                let fault = ExecutionFault {
                    pc,
                    mnemonic,
                    cause,
                };
                warn!(%fault, "instruction faulted");
                self.last_fault = Some(fault);
                self.transition(EngineState::Failed(cause));
            }
        }
    }

    /// Steps until the engine leaves [`EngineState::Running`] or `max_steps`
    /// instructions have been attempted.
    ///
    /// A halted engine is restarted first, so repeated calls rerun the program.
    pub fn run(&mut self, space: &mut AddressSpace, max_steps: Option<u64>) -> EngineState {
        if self.state == EngineState::Halted {
            self.restart(space);
        }

        let mut steps = 0_u64;
        while self.state.can_step() {
            if max_steps.is_some_and(|limit| steps >= limit) {
                debug!(steps, "step limit reached");
                break;
            }
            self.step(space);
            steps += 1;
        }
        self.state
    }

    /// Finishes the instruction parked on an empty keyboard with one line of
    /// input.
    ///
    /// The converted line stands in for every keyboard operand of that
    /// instruction, which then retires or faults as it would with a queued key.
    /// A decimal integer is taken modulo 2^16; any other text gives the code of
    /// its first character, and an empty line gives 0.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::NotAwaitingInput`] unless the engine is
    /// [`EngineState::AwaitingInput`].
    pub fn supply_input(
        &mut self,
        space: &mut AddressSpace,
        line: &str,
    ) -> Result<EngineState, InputError> {
        if self.state != EngineState::AwaitingInput {
            return Err(InputError::NotAwaitingInput { state: self.state });
        }

        let value = input_value(line);
        let pc = self.arch.pc();
        debug!(pc, value, "input supplied");
        self.execute_at(space, pc, Some(value));
        Ok(self.state)
    }

    fn transition(&mut self, next: EngineState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "engine state");
            self.state = next;
        }
    }
}

/// Converts one line of input into the word answering a suspended read.
///
/// Decimal digits with an optional sign fold modulo 2^16 at any length.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn input_value(line: &str) -> u16 {
    let line = line.trim_end_matches(['\r', '\n']);
    let text = line.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    if !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit()) {
        let magnitude = digits.bytes().fold(0_u16, |acc, byte| {
            acc.wrapping_mul(10).wrapping_add(u16::from(byte - b'0'))
        });
        return if negative {
            magnitude.wrapping_neg()
        } else {
            magnitude
        };
    }

    line.chars()
        .next()
        .map_or(0, |ch| (u32::from(ch) & 0xFFFF) as u16)
}
