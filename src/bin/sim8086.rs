//! C6: the CLI driver — argument parsing, file I/O, the decode/format/
//! execute run loop, and the memory dump writer. Everything here is an
//! "external collaborator" around the library's decoder/formatter/
//! executor core; none of this module's logic is reusable as a library.

use core::fmt;
use std::fmt::Display;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ErrorKind, Parser};
use log::{error, info, warn};

use sim8086::cpu::Cpu;
use sim8086::decode::decode;
use sim8086::exec::execute;
use sim8086::formatter::{format_instruction, PROLOGUE};
use sim8086::sink::{Sink, WriteSink};

/// Argument-parsing and file-I/O failures — the collaborators the
/// decoder/executor core is explicitly specified not to handle itself.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CliError {
    /// The binary path positional argument was not supplied.
    MissingPath,
    /// clap rejected the argument list for any other reason (unknown
    /// flag, stray positional, ...); its own message is preserved.
    UnknownFlag(String),
    /// The input path could not be opened.
    FileNotFound(PathBuf),
}

impl Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::MissingPath | CliError::UnknownFlag(_) => {
                write!(
                    f,
                    "Error: Bad arguments.\nProgram usage: sim8086 [-exec] [-dump] [-clocks] <binary-path>"
                )
            }
            CliError::FileNotFound(path) => write!(f, "Error: file not found: {}", path.display()),
        }
    }
}

impl std::error::Error for CliError {}

/// Classifies a failed parse per the taxonomy in §7: a missing
/// positional is `MissingPath`, everything else (unknown flags, bad
/// values, stray arguments) collapses to `UnknownFlag` carrying clap's
/// own diagnostic.
fn cli_error_from_clap(err: &clap::Error) -> CliError {
    match err.kind() {
        ErrorKind::MissingRequiredArgument => CliError::MissingPath,
        _ => CliError::UnknownFlag(err.to_string()),
    }
}

/// 8086 instruction decoder, NASM-style disassembler, and simulator.
#[derive(Parser, Debug)]
#[clap(name = "sim8086", about = "8086 instruction decoder, NASM-style disassembler and simulator")]
struct Cli {
    /// Execute each decoded instruction and emit state-delta traces plus
    /// a final register/flags dump.
    #[clap(long)]
    exec: bool,

    /// After the run, write the full 1 MiB memory image to
    /// `sim8086_dump.data`.
    #[clap(long)]
    dump: bool,

    /// Reserved: accepted but has no prescribed behavior.
    #[clap(long)]
    clocks: bool,

    /// Path to the flat 8086 binary to disassemble (and optionally run).
    path: PathBuf,
}

/// The CLI's flags are specified with a single leading dash (`-exec`, not
/// `--exec`), matching the reference tool's argv convention. clap's
/// derive API only recognizes `--long` flags, so a multi-character
/// single-dash token is rewritten to its double-dash form before
/// `Cli::try_parse_from` sees it; short, single-character flags (and the
/// positional path) pass through untouched.
fn normalize_single_dash_long_flags(args: impl Iterator<Item = String>) -> Vec<String> {
    args.map(|arg| {
        if arg.starts_with('-') && !arg.starts_with("--") && arg.len() > 2 {
            format!("-{arg}")
        } else {
            arg
        }
    })
    .collect()
}

fn main() -> ExitCode {
    env_logger::init();

    let args = normalize_single_dash_long_flags(std::env::args());
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let cli_err = cli_error_from_clap(&err);
            eprintln!("{cli_err}");
            warn!("argument parsing failed: {cli_err:?}");
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut sink = WriteSink(io::BufWriter::new(stdout.lock()));
    run(&cli, &mut sink)
}

/// The decode/format/(optionally execute) run loop and memory dump
/// writer. Takes `sink` as an abstract collaborator (§4.6) rather than
/// writing to stdout directly, so the unit tests below can drive it
/// against an in-memory buffer.
fn run(cli: &Cli, sink: &mut impl Sink) -> ExitCode {
    let code = match std::fs::read(&cli.path) {
        Ok(bytes) => bytes,
        Err(read_err) => {
            let cli_err = CliError::FileNotFound(cli.path.clone());
            error!("failed to read {}: {read_err}", cli.path.display());
            eprintln!("{cli_err}");
            return ExitCode::FAILURE;
        }
    };
    info!("loaded {} bytes from {}", code.len(), cli.path.display());

    let mut cpu = Cpu::new();
    cpu.load(&code);

    sink.emit(PROLOGUE).expect("writing to sink");

    let mut ip: usize = 0;
    while ip < code.len() {
        let inst = match decode(&code[ip..]) {
            Ok(inst) => inst,
            Err(err) => {
                error!("{err}");
                sink.emit(&format!("{err}\n")).expect("writing to sink");
                return ExitCode::FAILURE;
            }
        };

        let mut line = format_instruction(inst);
        if cli.exec {
            cpu.ip = ip as u16;
            match execute(&mut cpu, inst) {
                Ok(trace) => line.push_str(&format!(" ; {trace}")),
                Err(err) => {
                    warn!("{err}");
                    line.push_str(&format!(" ; {err}"));
                }
            }
            ip = cpu.ip as usize;
        } else {
            ip += inst.size_bytes as usize;
        }
        sink.emit(&format!("{line}\n")).expect("writing to sink");
    }

    if cli.exec {
        sink.emit("\n").expect("writing to sink");
        sink.emit(&cpu.dump_registers()).expect("writing to sink");
    }

    if cli.dump {
        if let Err(err) = std::fs::write("sim8086_dump.data", &cpu.memory) {
            error!("failed to write memory dump: {err}");
            return ExitCode::FAILURE;
        }
        info!("wrote 1 MiB memory image to sim8086_dump.data");
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_maps_to_missing_path_error() {
        let err = Cli::try_parse_from(["sim8086", "--exec"]).unwrap_err();
        assert_eq!(cli_error_from_clap(&err), CliError::MissingPath);
    }

    #[test]
    fn unknown_flag_maps_to_unknown_flag_error() {
        let err = Cli::try_parse_from(["sim8086", "--bogus", "prog.bin"]).unwrap_err();
        assert!(matches!(cli_error_from_clap(&err), CliError::UnknownFlag(_)));
    }

    #[test]
    fn file_not_found_renders_its_path() {
        let err = CliError::FileNotFound(PathBuf::from("missing.bin"));
        assert_eq!(err.to_string(), "Error: file not found: missing.bin");
    }

    #[test]
    fn run_writes_prologue_and_one_line_per_instruction() {
        let mut path = std::env::temp_dir();
        path.push("sim8086_test_run_writes_prologue.bin");
        std::fs::write(&path, [0x89, 0xD9, 0xB8, 0x01, 0x00]).unwrap(); // mov cx,bx; mov ax,1
        let cli = Cli {
            exec: false,
            dump: false,
            clocks: false,
            path: path.clone(),
        };
        let mut sink = WriteSink(Vec::new());
        let code = run(&cli, &mut sink);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::SUCCESS));
        let output = String::from_utf8(sink.0).unwrap();
        assert!(output.starts_with(PROLOGUE));
        assert!(output.contains("mov cx, bx\n"));
        assert!(output.contains("mov ax, 1\n"));
    }

    #[test]
    fn run_reports_missing_input_file() {
        let cli = Cli {
            exec: false,
            dump: false,
            clocks: false,
            path: PathBuf::from("/nonexistent/sim8086_test_path.bin"),
        };
        let mut sink = WriteSink(Vec::new());
        let code = run(&cli, &mut sink);
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::FAILURE));
    }

    #[test]
    fn normalizes_single_dash_long_flags_to_double_dash() {
        let normalized = normalize_single_dash_long_flags(
            ["sim8086", "-exec", "-dump", "prog.bin"]
                .into_iter()
                .map(String::from),
        );
        assert_eq!(normalized, vec!["sim8086", "--exec", "--dump", "prog.bin"]);
    }

    #[test]
    fn leaves_short_flags_and_positionals_alone() {
        let normalized = normalize_single_dash_long_flags(
            ["sim8086", "prog.bin"].into_iter().map(String::from),
        );
        assert_eq!(normalized, vec!["sim8086", "prog.bin"]);
    }

    #[test]
    fn cli_parses_flags_in_any_order() {
        let args = normalize_single_dash_long_flags(
            ["sim8086", "-dump", "prog.bin", "-exec"]
                .into_iter()
                .map(String::from),
        );
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.exec);
        assert!(cli.dump);
        assert!(!cli.clocks);
        assert_eq!(cli.path, PathBuf::from("prog.bin"));
    }

    #[test]
    fn missing_path_is_an_error() {
        let args = normalize_single_dash_long_flags(
            ["sim8086", "-exec"].into_iter().map(String::from),
        );
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn unknown_flag_is_an_error() {
        let args = normalize_single_dash_long_flags(
            ["sim8086", "-bogus", "prog.bin"].into_iter().map(String::from),
        );
        assert!(Cli::try_parse_from(args).is_err());
    }
}
