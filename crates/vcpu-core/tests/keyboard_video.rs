//! Keyboard and video peripherals as seen by running programs.

use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

use rstest::rstest;
use vcpu_core::{
    EngineState, FaultCode, InputError, Machine, MachineConfig, ScreenGeometry, DEFAULT_KEYBOARD_BUFFER,
};

fn loaded(program: &str) -> Machine {
    let mut machine = Machine::new(MachineConfig::default()).expect("default config is valid");
    machine.load(program).expect("program parses");
    machine
}

#[test]
fn empty_keyboard_suspends_mov_until_input_arrives() {
    let mut machine = loaded("MOV R0, M4095\nADD R0, #1");

    assert_eq!(machine.run(None), EngineState::AwaitingInput);
    assert_eq!(machine.pc(), 0);
    assert_eq!(machine.retired(), 0);

    assert_eq!(machine.supply_input("42"), Ok(EngineState::Running));
    assert_eq!(machine.pc(), 1);
    assert_eq!(machine.run(None), EngineState::Halted);
    assert_eq!(machine.snapshot_registers()[0], 43);
}

#[test]
fn suspended_read_into_memory_stores_character_code() {
    let mut machine = loaded("MOV M2000, M4095\nMOV R1, M2000");
    assert_eq!(machine.run(None), EngineState::AwaitingInput);
    machine.supply_input("hello\n").expect("awaiting input");
    assert_eq!(machine.run(None), EngineState::Halted);
    assert_eq!(machine.snapshot_registers()[1], u16::from(b'h'));
}

#[test]
fn input_is_rejected_when_not_suspended() {
    let mut machine = loaded("MOV R0, #1");
    assert_eq!(
        machine.supply_input("1"),
        Err(InputError::NotAwaitingInput {
            state: EngineState::Ready
        })
    );
}

#[rstest]
#[case::add("MOV R0, #5\nADD R0, M4095\nMOV R1, #1", "7", 12)]
#[case::cmp("CMP M4095, #65\nJE hit\nMOV R0, #1\nhit: MOV R1, #1", "A", 0)]
#[case::push("PUSH M4095\nPOP R0\nMOV R1, #1", "300", 300)]
fn every_keyboard_reader_waits_for_input(
    #[case] program: &str,
    #[case] line: &str,
    #[case] r0: u16,
) {
    let mut machine = loaded(program);
    let first_read = usize::from(program.starts_with("MOV"));

    assert_eq!(machine.run(None), EngineState::AwaitingInput);
    assert_eq!(machine.pc(), first_read);
    assert_eq!(machine.retired(), u64::try_from(first_read).expect("small"));

    assert_eq!(machine.supply_input(line), Ok(EngineState::Running));
    assert_eq!(machine.run(None), EngineState::Halted);
    assert_eq!(machine.snapshot_registers()[0], r0);
    assert_eq!(machine.snapshot_registers()[1], 1);
}

#[test]
fn keyboard_reads_replace_the_whole_destination_word() {
    let mut machine = loaded("MOV R0, #65280\nMOV R0, M4095\nMOV R1, #65280\nMOV R1, M4095");
    machine.push_key(u16::from(b'B'));

    assert_eq!(machine.run(None), EngineState::AwaitingInput);
    assert_eq!(machine.snapshot_registers()[0], u16::from(b'B'));

    machine.supply_input("4660").expect("awaiting input");
    assert_eq!(machine.run(None), EngineState::Halted);
    assert_eq!(machine.snapshot_registers()[1], 4660);
}

#[test]
fn queued_keys_are_consumed_in_order() {
    let mut machine = loaded("MOV R0, M4095\nMOV R1, M4095\nMOV R2, M4095");
    machine.push_text("ab");
    machine.push_key(7);
    assert_eq!(machine.run(None), EngineState::Halted);
    assert_eq!(machine.snapshot_registers()[..3], [97, 98, 7]);
    assert!(machine.memory().keyboard().is_empty());
}

#[test]
fn writing_the_keyboard_cell_faults() {
    let mut machine = loaded(&format!("MOV M{DEFAULT_KEYBOARD_BUFFER}, #1"));
    assert_eq!(
        machine.run(None),
        EngineState::Failed(FaultCode::InvalidAddress)
    );
}

#[rstest]
#[case(1234, 210)]
#[case(72, 72)]
#[case(0x1FF, 0xFF)]
fn video_keeps_low_byte(#[case] written: u16, #[case] stored: u16) {
    let mut machine = loaded(&format!("MOV M10, #{written}\nMOV R0, M10"));
    assert_eq!(machine.run(None), EngineState::Halted);
    assert_eq!(machine.read_video_window()[10], stored);
    assert_eq!(machine.snapshot_registers()[0], stored);
}

#[test]
fn video_renders_as_text_rows() {
    let mut machine = loaded("MOV M0, #72\nMOV M1, #105\nMOV M100, #33");
    assert_eq!(machine.run(None), EngineState::Halted);

    let rows = ScreenGeometry::default().render_rows(machine.read_video_window());
    assert_eq!(rows.len(), 16);
    assert!(rows[0].starts_with("Hi "));
    assert!(rows[1].starts_with('!'));
    assert_eq!(rows[0].chars().count(), 100);
}

#[test]
fn video_survives_restart_but_data_does_not() {
    let mut machine = loaded("MOV M5, #65\nMOV M2000, #9");
    assert_eq!(machine.run(None), EngineState::Halted);
    machine.restart();

    assert_eq!(machine.read_video_window()[5], 65);
    assert_eq!(machine.memory().peek_data(2000), Ok(0));
}
