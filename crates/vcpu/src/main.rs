//! CLI entry point for the vcpu simulator.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process;

use serde as _;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;
use tracing as _;
use tracing_subscriber as _;
use vcpu::{
    init_logging, load_config, load_program, run_to_completion, DriverError, RunReport, Verbosity,
};
use vcpu_core as _;

const USAGE_TEXT: &str = "\
Usage: vcpu <command> [options]

Commands:
  run   <program>  Load and run a program, reading keyboard input from stdin
  check <program>  Parse a program and report its size

Options:
  -c, --config <file>    Machine configuration (key: value lines)
  -n, --max-steps <n>    Stop after n instructions (run only)
      --json             Print the final report as JSON (run only)
  -v, --verbose          Log program loads and state changes to stderr
      --trace            Log every instruction to stderr
  -h, --help             Show this help message

Exit status: 0 on halt, 1 on usage, config or parse errors, 2 on runtime errors.

Examples:
  vcpu run hello.asm
  vcpu run game.asm --config big.cfg --max-steps 100000
  vcpu check hello.asm
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run(RunArgs),
    Check(CheckArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    program: PathBuf,
    config: Option<PathBuf>,
    max_steps: Option<u64>,
    json: bool,
    verbosity: Verbosity,
}

#[derive(Debug, PartialEq, Eq)]
struct CheckArgs {
    program: PathBuf,
    config: Option<PathBuf>,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "run" => parse_run_args(args)
            .map(Command::Run)
            .map(ParseResult::Command),
        "check" => parse_check_args(args)
            .map(Command::Check)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut program: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut max_steps: Option<u64> = None;
    let mut json = false;
    let mut verbosity = Verbosity::Quiet;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--json" {
            json = true;
            continue;
        }

        if arg == "--verbose" || arg == "-v" {
            if verbosity == Verbosity::Quiet {
                verbosity = Verbosity::Debug;
            }
            continue;
        }

        if arg == "--trace" {
            verbosity = Verbosity::Trace;
            continue;
        }

        if arg == "-c" || arg == "--config" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --config".to_string())?;
            config = Some(PathBuf::from(value));
            continue;
        }

        if arg == "-n" || arg == "--max-steps" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --max-steps".to_string())?;
            let text = value.to_string_lossy();
            let steps = text
                .parse::<u64>()
                .map_err(|_| format!("invalid step count: {text}"))?;
            max_steps = Some(steps);
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if program.is_some() {
            return Err("multiple program paths provided".to_string());
        }
        program = Some(PathBuf::from(arg));
    }

    let program = program.ok_or_else(|| "missing program path".to_string())?;
    Ok(RunArgs {
        program,
        config,
        max_steps,
        json,
        verbosity,
    })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_check_args(mut args: impl Iterator<Item = OsString>) -> Result<CheckArgs, String> {
    let mut program: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "-c" || arg == "--config" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --config".to_string())?;
            config = Some(PathBuf::from(value));
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if program.is_some() {
            return Err("multiple program paths provided".to_string());
        }
        program = Some(PathBuf::from(arg));
    }

    let program = program.ok_or_else(|| "missing program path".to_string())?;
    Ok(CheckArgs { program, config })
}

fn run_program(args: &RunArgs) -> Result<(), DriverError> {
    init_logging(args.verbosity);

    let config = load_config(args.config.as_deref())?;
    let screen = config.screen()?;
    let mut machine = load_program(&config, &args.program)?;

    let outcome = run_to_completion(&mut machine, args.max_steps, &mut io::stdin().lock());

    let report = RunReport::capture(&machine, screen);
    if args.json {
        match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(error) => eprintln!("error: failed to encode report: {error}"),
        }
    } else {
        print!("{}", report.to_text());
    }

    outcome
}

fn check_program(args: &CheckArgs) -> Result<(), DriverError> {
    init_logging(Verbosity::Quiet);

    let config = load_config(args.config.as_deref())?;
    let machine = load_program(&config, &args.program)?;
    let program = machine.memory().program();

    println!(
        "{}: {} instructions, {} labels",
        args.program.display(),
        program.len(),
        program.labels().len()
    );
    Ok(())
}

fn report_outcome(result: Result<(), DriverError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error}");
            error.exit_code()
        }
    }
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(Command::Run(args))) => report_outcome(run_program(&args)),
        Ok(ParseResult::Command(Command::Check(args))) => report_outcome(check_program(&args)),
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn os_args(args: &[&str]) -> impl Iterator<Item = OsString> {
        args.iter().map(|arg| OsString::from(*arg)).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_run_command() {
        let result = parse_run_args(os_args(&[
            "game.asm",
            "--config",
            "big.cfg",
            "-n",
            "500",
            "--json",
            "-v",
        ]))
        .expect("valid run args should parse");

        assert_eq!(
            result,
            RunArgs {
                program: PathBuf::from("game.asm"),
                config: Some(PathBuf::from("big.cfg")),
                max_steps: Some(500),
                json: true,
                verbosity: Verbosity::Debug,
            }
        );
    }

    #[test]
    fn trace_wins_over_verbose() {
        let result = parse_run_args(os_args(&["p.asm", "--trace", "-v"]))
            .expect("flags should parse");
        assert_eq!(result.verbosity, Verbosity::Trace);
    }

    #[test]
    fn parses_check_command() {
        let result = parse_check_args(os_args(&["hello.asm"])).expect("valid check args");
        assert_eq!(
            result,
            CheckArgs {
                program: PathBuf::from("hello.asm"),
                config: None,
            }
        );
    }

    #[test]
    fn parses_help_flag() {
        let result = parse_args(os_args(&["--help"])).expect("help should parse without error");
        assert!(matches!(result, ParseResult::Help));
    }

    #[test]
    fn rejects_unknown_command() {
        let error = parse_args(os_args(&["build"])).expect_err("unknown command should fail");
        assert!(error.contains("unknown command"));
    }

    #[test]
    fn rejects_bad_step_count() {
        let error = parse_run_args(os_args(&["p.asm", "--max-steps", "lots"]))
            .expect_err("non-numeric limit");
        assert!(error.contains("invalid step count"));
    }

    #[test]
    fn run_requires_program() {
        let error = parse_run_args(std::iter::empty()).expect_err("missing program");
        assert!(error.contains("missing program"));
    }

    #[test]
    fn check_rejects_run_options() {
        let error = parse_check_args(os_args(&["p.asm", "--json"])).expect_err("run-only flag");
        assert!(error.contains("unknown option"));
    }
}
