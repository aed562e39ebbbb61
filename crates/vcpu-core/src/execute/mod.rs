//! Instruction execution pipeline.
//!
//! Every instruction runs in two phases:
//! 1. Read operands and compute all effects into an [`ExecuteState`]
//! 2. Commit the effects: data write, register write, FLAGS, SP, keyboard, PC
//!
//! Faults are raised only in phase 1, so a faulting instruction leaves no
//! partial side effects.

#![allow(clippy::similar_names, clippy::too_many_lines)]

mod flags;
mod helpers;

pub use flags::{add, div, logic, mul, result_flags, shl, shr, sub, AluOutput, FlagsUpdate};
pub use helpers::{read_location, read_operand, read_stack, resolve_destination, Location};

use crate::instruction::{Instruction, Operand};
use crate::memory::{AddressSpace, MemoryRead};
use crate::state::{ArchitecturalState, FlagsSnapshot};
use crate::FaultCode;

/// Outcome of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// Instruction completed; commit the execute state.
    Retired,
    /// An operand read the keyboard while nothing was queued; nothing may be
    /// committed until input is supplied.
    AwaitInput,
    /// Fault raised; nothing may be committed.
    Fault(FaultCode),
}

/// Side effects accumulated while executing one instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteState {
    /// Destination and value to store.
    pub dest: Option<(Location, u16)>,
    /// FLAGS update to apply.
    pub flags_update: FlagsUpdate,
    /// New stack pointer.
    pub next_sp: Option<u16>,
    /// Whether the front keyboard entry was read and must be consumed.
    pub consume_key: bool,
    /// New PC value to set after commit.
    pub next_pc: Option<usize>,
    /// Value answering a keyboard read that found nothing queued.
    pub supplied_key: Option<u16>,
}

impl ExecuteState {
    /// Creates a state that advances PC to `next_pc`.
    #[must_use]
    pub fn new(next_pc: usize) -> Self {
        Self {
            next_pc: Some(next_pc),
            ..Self::default()
        }
    }
}

enum Stop {
    Fault(FaultCode),
    AwaitInput,
}

impl From<FaultCode> for Stop {
    fn from(cause: FaultCode) -> Self {
        Self::Fault(cause)
    }
}

#[derive(Clone, Copy)]
enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl AluOp {
    fn apply(self, a: u16, b: u16) -> Result<AluOutput, FaultCode> {
        Ok(match self {
            Self::Add => add(a, b),
            Self::Sub => sub(a, b),
            Self::Mul => mul(a, b),
            Self::Div => div(a, b)?,
            Self::And => logic(a & b),
            Self::Or => logic(a | b),
            Self::Xor => logic(a ^ b),
            Self::Shl => shl(a, b),
            Self::Shr => shr(a, b),
        })
    }
}

#[derive(Clone, Copy)]
enum Condition {
    Always,
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
}

impl Condition {
    const fn holds(self, flags: FlagsSnapshot) -> bool {
        match self {
            Self::Always => true,
            Self::Equal => flags.zf,
            Self::NotEqual => !flags.zf,
            Self::Greater => !flags.zf && flags.sf == flags.of,
            Self::Less => flags.sf != flags.of,
            Self::GreaterEqual => flags.sf == flags.of,
            Self::LessEqual => flags.zf || flags.sf != flags.of,
        }
    }
}

/// Executes the instruction at `pc` without modifying the machine.
///
/// On [`ExecuteOutcome::Retired`] the caller applies the returned state with
/// [`commit_execution`]. On a fault or a keyboard suspension the state must be
/// discarded.
pub fn execute_instruction(
    instr: &Instruction,
    pc: usize,
    state: &ArchitecturalState,
    space: &AddressSpace,
) -> (ExecuteOutcome, ExecuteState) {
    execute_instruction_with_input(instr, pc, state, space, None)
}

/// Executes the instruction at `pc`, answering keyboard reads with `input`.
///
/// With `Some(value)` every keyboard operand reads `value` and the queue is
/// left untouched, so a suspended instruction can be finished with the word
/// the host supplied.
pub fn execute_instruction_with_input(
    instr: &Instruction,
    pc: usize,
    state: &ArchitecturalState,
    space: &AddressSpace,
    input: Option<u16>,
) -> (ExecuteOutcome, ExecuteState) {
    let mut exec = ExecuteState::new(pc + 1);
    exec.supplied_key = input;
    let flags = state.flags();

    let result = match instr {
        Instruction::Mov { dst, src } => execute_mov(*dst, *src, state, space, &mut exec),
        Instruction::Add { dst, src } => {
            execute_alu(AluOp::Add, *dst, *src, state, space, &mut exec)
        }
        Instruction::Sub { dst, src } => {
            execute_alu(AluOp::Sub, *dst, *src, state, space, &mut exec)
        }
        Instruction::Mul { dst, src } => {
            execute_alu(AluOp::Mul, *dst, *src, state, space, &mut exec)
        }
        Instruction::Div { dst, src } => {
            execute_alu(AluOp::Div, *dst, *src, state, space, &mut exec)
        }
        Instruction::And { dst, src } => {
            execute_alu(AluOp::And, *dst, *src, state, space, &mut exec)
        }
        Instruction::Or { dst, src } => execute_alu(AluOp::Or, *dst, *src, state, space, &mut exec),
        Instruction::Xor { dst, src } => {
            execute_alu(AluOp::Xor, *dst, *src, state, space, &mut exec)
        }
        Instruction::Shl { dst, src } => {
            execute_alu(AluOp::Shl, *dst, *src, state, space, &mut exec)
        }
        Instruction::Shr { dst, src } => {
            execute_alu(AluOp::Shr, *dst, *src, state, space, &mut exec)
        }
        Instruction::Cmp { lhs, rhs } => execute_cmp(*lhs, *rhs, state, space, &mut exec),
        Instruction::Not { dst } => execute_not(*dst, state, space, &mut exec),
        Instruction::Jmp { target } => execute_jump(target, Condition::Always, flags, space, &mut exec),
        Instruction::Je { target } => execute_jump(target, Condition::Equal, flags, space, &mut exec),
        Instruction::Jne { target } => {
            execute_jump(target, Condition::NotEqual, flags, space, &mut exec)
        }
        Instruction::Jg { target } => {
            execute_jump(target, Condition::Greater, flags, space, &mut exec)
        }
        Instruction::Jl { target } => execute_jump(target, Condition::Less, flags, space, &mut exec),
        Instruction::Jge { target } => {
            execute_jump(target, Condition::GreaterEqual, flags, space, &mut exec)
        }
        Instruction::Jle { target } => {
            execute_jump(target, Condition::LessEqual, flags, space, &mut exec)
        }
        Instruction::Push { src } => execute_push(*src, state, space, &mut exec),
        Instruction::Pop { dst } => execute_pop(*dst, state, space, &mut exec),
        Instruction::Call { target } => execute_call(target, pc, state, space, &mut exec),
        Instruction::Ret => execute_ret(state, space, &mut exec),
    };

    match result {
        Ok(()) => (ExecuteOutcome::Retired, exec),
        Err(Stop::AwaitInput) => (ExecuteOutcome::AwaitInput, exec),
        Err(Stop::Fault(cause)) => (ExecuteOutcome::Fault(cause), exec),
    }
}

/// Applies the side effects of a retired instruction.
///
/// The data write goes first; it is the only fallible step and was already
/// validated during execution.
///
/// # Errors
///
/// Returns [`FaultCode::InvalidAddress`] if the data write is rejected, in
/// which case nothing else is applied.
pub fn commit_execution(
    state: &mut ArchitecturalState,
    space: &mut AddressSpace,
    exec: &ExecuteState,
) -> Result<(), FaultCode> {
    match exec.dest {
        Some((Location::Data(addr), value)) => {
            space.write_data(u32::from(addr), value)?;
        }
        Some((Location::Register(reg), value)) => state.set_gpr(reg, value),
        None => {}
    }

    match exec.flags_update {
        FlagsUpdate::None => {}
        FlagsUpdate::Set(flags) => state.set_flags(flags),
    }

    if let Some(sp) = exec.next_sp {
        state.set_sp(sp);
    }

    if exec.consume_key {
        space.consume_key();
    }

    if let Some(pc) = exec.next_pc {
        state.set_pc(pc);
    }

    Ok(())
}

fn take_value(read: MemoryRead, exec: &mut ExecuteState) -> Result<u16, Stop> {
    match (read, exec.supplied_key) {
        (MemoryRead::Word(value), _) | (MemoryRead::Keyboard(_), Some(value)) => Ok(value),
        (MemoryRead::Keyboard(Some(value)), None) => {
            exec.consume_key = true;
            Ok(value)
        }
        (MemoryRead::Keyboard(None), None) => Err(Stop::AwaitInput),
    }
}

fn execute_mov(
    dst: Operand,
    src: Operand,
    state: &ArchitecturalState,
    space: &AddressSpace,
    exec: &mut ExecuteState,
) -> Result<(), Stop> {
    let location = resolve_destination(dst, state, space)?;
    let value = take_value(read_operand(src, state, space)?, exec)?;

    exec.dest = Some((location, value));
    Ok(())
}

fn execute_alu(
    op: AluOp,
    dst: Operand,
    src: Operand,
    state: &ArchitecturalState,
    space: &AddressSpace,
    exec: &mut ExecuteState,
) -> Result<(), Stop> {
    let location = resolve_destination(dst, state, space)?;
    let a = read_location(location, state, space)?;
    let b = take_value(read_operand(src, state, space)?, exec)?;
    let out = op.apply(a, b)?;

    exec.dest = Some((location, out.value));
    exec.flags_update = FlagsUpdate::Set(out.flags);
    Ok(())
}

fn execute_cmp(
    lhs: Operand,
    rhs: Operand,
    state: &ArchitecturalState,
    space: &AddressSpace,
    exec: &mut ExecuteState,
) -> Result<(), Stop> {
    let a = take_value(read_operand(lhs, state, space)?, exec)?;
    let b = take_value(read_operand(rhs, state, space)?, exec)?;
    exec.flags_update = FlagsUpdate::Set(sub(a, b).flags);
    Ok(())
}

fn execute_not(
    dst: Operand,
    state: &ArchitecturalState,
    space: &AddressSpace,
    exec: &mut ExecuteState,
) -> Result<(), Stop> {
    let location = resolve_destination(dst, state, space)?;
    let out = logic(!read_location(location, state, space)?);

    exec.dest = Some((location, out.value));
    exec.flags_update = FlagsUpdate::Set(out.flags);
    Ok(())
}

fn execute_jump(
    target: &str,
    condition: Condition,
    flags: FlagsSnapshot,
    space: &AddressSpace,
    exec: &mut ExecuteState,
) -> Result<(), Stop> {
    let index = space.resolve_label(target)?;
    if condition.holds(flags) {
        exec.next_pc = Some(index);
    }
    Ok(())
}

fn push_slot(state: &ArchitecturalState, space: &AddressSpace) -> Result<u16, FaultCode> {
    let sp = state.sp();
    if sp <= space.map().stack().start {
        return Err(FaultCode::StackOverflow);
    }
    Ok(sp)
}

fn pop_slot(state: &ArchitecturalState, space: &AddressSpace) -> Result<u16, FaultCode> {
    let sp = state.sp();
    if sp >= space.map().stack().end {
        return Err(FaultCode::StackUnderflow);
    }
    Ok(sp + 1)
}

fn execute_push(
    src: Operand,
    state: &ArchitecturalState,
    space: &AddressSpace,
    exec: &mut ExecuteState,
) -> Result<(), Stop> {
    let value = take_value(read_operand(src, state, space)?, exec)?;
    let sp = push_slot(state, space)?;

    exec.dest = Some((Location::Data(sp), value));
    exec.next_sp = Some(sp - 1);
    Ok(())
}

fn execute_pop(
    dst: Operand,
    state: &ArchitecturalState,
    space: &AddressSpace,
    exec: &mut ExecuteState,
) -> Result<(), Stop> {
    let sp = pop_slot(state, space)?;
    let value = read_stack(space, sp)?;
    let location = resolve_destination(dst, state, space)?;

    exec.dest = Some((location, value));
    exec.next_sp = Some(sp);
    Ok(())
}

fn execute_call(
    target: &str,
    pc: usize,
    state: &ArchitecturalState,
    space: &AddressSpace,
    exec: &mut ExecuteState,
) -> Result<(), Stop> {
    let index = space.resolve_label(target)?;
    let return_addr = u16::try_from(pc + 1).map_err(|_| FaultCode::InvalidAddress)?;
    let sp = push_slot(state, space)?;

    exec.dest = Some((Location::Data(sp), return_addr));
    exec.next_sp = Some(sp - 1);
    exec.next_pc = Some(index);
    Ok(())
}

fn execute_ret(
    state: &ArchitecturalState,
    space: &AddressSpace,
    exec: &mut ExecuteState,
) -> Result<(), Stop> {
    let sp = pop_slot(state, space)?;
    let target = usize::from(read_stack(space, sp)?);
    if target > space.program().len() {
        return Err(FaultCode::InvalidAddress.into());
    }

    exec.next_sp = Some(sp);
    exec.next_pc = Some(target);
    Ok(())
}
