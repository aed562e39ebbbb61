//! Headless run loop and log setup.

use std::fs;
use std::io::BufRead;
use std::path::Path;

use tracing::{debug, Level};
use vcpu_core::{EngineState, Machine};

use crate::config_file::{parse_config, DriverConfig};
use crate::errors::DriverError;

/// How much of the core's event stream reaches stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Warnings only.
    #[default]
    Quiet,
    /// Program loads and state changes.
    Debug,
    /// Every instruction and video write.
    Trace,
}

impl Verbosity {
    const fn level(self) -> Level {
        match self {
            Self::Quiet => Level::WARN,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Installs a stderr subscriber for `verbosity`.
///
/// A subscriber installed earlier in the process is left in place.
pub fn init_logging(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(verbosity.level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Reads and validates a configuration file, or returns the defaults.
///
/// # Errors
///
/// Returns [`DriverError::Read`], [`DriverError::ConfigFile`] or
/// [`DriverError::Config`].
pub fn load_config(path: Option<&Path>) -> Result<DriverConfig, DriverError> {
    let config = match path {
        Some(path) => {
            let text = read_file(path)?;
            parse_config(&text).map_err(|source| DriverError::ConfigFile {
                path: path.to_path_buf(),
                source,
            })?
        }
        None => DriverConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Builds a machine for `config` and loads the program at `path`.
///
/// # Errors
///
/// Returns [`DriverError::Read`], [`DriverError::Config`] or
/// [`DriverError::Parse`].
pub fn load_program(config: &DriverConfig, path: &Path) -> Result<Machine, DriverError> {
    let text = read_file(path)?;
    let mut machine = Machine::new(config.machine.clone())?;
    machine.load(&text).map_err(|source| DriverError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(machine)
}

fn read_file(path: &Path) -> Result<String, DriverError> {
    fs::read_to_string(path).map_err(|source| DriverError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs the loaded program to completion, answering keyboard suspensions
/// with lines read from `input`.
///
/// # Errors
///
/// - [`DriverError::InputClosed`] when `input` ends while a read is pending.
/// - [`DriverError::Stdin`] when reading `input` fails.
/// - [`DriverError::Fault`] when the program faults.
/// - [`DriverError::StepLimit`] when `max_steps` instructions ran without the
///   program finishing.
pub fn run_to_completion(
    machine: &mut Machine,
    max_steps: Option<u64>,
    input: &mut impl BufRead,
) -> Result<(), DriverError> {
    let mut budget = max_steps;
    loop {
        let before = machine.retired();
        let state = machine.run(budget);
        if let Some(remaining) = budget.as_mut() {
            *remaining = remaining.saturating_sub(machine.retired() - before);
        }

        match state {
            EngineState::Halted => {
                debug!(retired = machine.retired(), "run finished");
                return Ok(());
            }
            EngineState::AwaitingInput => {
                if budget == Some(0) {
                    return Err(DriverError::StepLimit {
                        limit: max_steps.unwrap_or_default(),
                        state,
                    });
                }
                let line = read_line(input)?.ok_or(DriverError::InputClosed { pc: machine.pc() })?;
                debug!(pc = machine.pc(), "input line read");
                machine.supply_input(&line)?;
                if let Some(remaining) = budget.as_mut() {
                    *remaining = remaining.saturating_sub(1);
                }
            }
            EngineState::Failed(_) => {
                return Err(machine
                    .last_fault()
                    .map_or(DriverError::Stopped { state }, DriverError::Fault));
            }
            EngineState::Ready | EngineState::Running => {
                return Err(DriverError::StepLimit {
                    limit: max_steps.unwrap_or_default(),
                    state,
                });
            }
        }
    }
}

fn read_line(input: &mut impl BufRead) -> Result<Option<String>, DriverError> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(line)),
        Err(error) => Err(DriverError::Stdin(error)),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{load_config, load_program, run_to_completion};
    use crate::errors::DriverError;
    use vcpu_core::{FaultCode, Machine, MachineConfig};

    fn machine(program: &str) -> Machine {
        let mut machine = Machine::new(MachineConfig::default()).expect("valid config");
        machine.load(program).expect("valid program");
        machine
    }

    #[test]
    fn input_lines_answer_each_suspension() {
        let mut machine = machine("MOV R0, M4095\nMOV R1, M4095\nADD R0, R1");
        let mut input: &[u8] = b"40\n2\n";

        run_to_completion(&mut machine, None, &mut input).expect("program halts");
        assert_eq!(machine.snapshot_registers()[0], 42);
    }

    #[test]
    fn input_lines_answer_comparisons_and_pushes() {
        let mut machine = machine("CMP M4095, #65\nJNE skip\nMOV R0, #1\nskip: PUSH M4095\nPOP R1");
        let mut input: &[u8] = b"A\n99999999999999999999\n";

        run_to_completion(&mut machine, None, &mut input).expect("program halts");
        assert_eq!(machine.snapshot_registers()[0], 1);
        assert_eq!(machine.snapshot_registers()[1], 0xFFFF);
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut machine = machine("MOV R0, M4095");
        let mut input: &[u8] = b"";

        let error = run_to_completion(&mut machine, None, &mut input).expect_err("no input");
        assert!(matches!(error, DriverError::InputClosed { pc: 0 }));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn faults_are_reported_with_context() {
        let mut machine = machine("MOV R0, #1\nRET");
        let mut input: &[u8] = b"";

        let error = run_to_completion(&mut machine, None, &mut input).expect_err("faults");
        match error {
            DriverError::Fault(fault) => {
                assert_eq!(fault.cause, FaultCode::StackUnderflow);
                assert_eq!(fault.pc, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn step_limit_counts_across_suspensions() {
        let mut machine = machine("MOV R0, M4095\nloop: JMP loop");
        let mut input: &[u8] = b"7\n";

        let error = run_to_completion(&mut machine, Some(5), &mut input).expect_err("loops");
        assert!(matches!(error, DriverError::StepLimit { limit: 5, .. }));
        assert_eq!(machine.retired(), 5);
        assert_eq!(machine.snapshot_registers()[0], 7);
    }

    #[test]
    fn loaders_read_files_and_report_paths() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config_path = dir.path().join("machine.cfg");
        let program_path = dir.path().join("bad.asm");
        fs::write(&config_path, "screen_width: 50\n").expect("write config");
        fs::write(&program_path, "MOV R0, #1\nFLY R0\n").expect("write program");

        let config = load_config(Some(&config_path)).expect("valid config");
        assert_eq!(config.screen_width, 50);

        let error = load_program(&config, &program_path).expect_err("bad mnemonic");
        assert!(error.to_string().contains("bad.asm: line 2"));
        assert_eq!(error.exit_code(), 1);

        let missing = load_config(Some(&dir.path().join("absent.cfg"))).expect_err("missing");
        assert!(matches!(missing, DriverError::Read { .. }));
    }
}
