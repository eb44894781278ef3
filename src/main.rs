//! IPPcode23 interpreter entry point.
//!
//! ```text
//! interpret --source=<path>   # path to XML program; else stdin
//!           --input=<path>    # path to program input; else stdin
//! ```
//!
//! At least one of `--source`/`--input` must be given, since both reading
//! from stdin at once is ambiguous. Unknown flags are a usage error,
//! reported distinctly from VM faults (exit code 1 rather than the 31-58
//! fault taxonomy).

use std::env;
use std::fs;
use std::io::{self, Read};

use ippcode23_runtime::error::{CliError, Fault};
use ippcode23_runtime::io::{open_input, stderr_writer, stdout_writer};
use ippcode23_runtime::program::load_program;
use ippcode23_runtime::vm::{run, Vm};

const VERSION: &str = "0.1.0";

fn usage() -> String {
    format!(
        r#"IPPcode23 Interpreter v{0}

Usage:
    interpret --source=<path> --input=<path>

Arguments:
    --source=<path>
        Path to an IPPcode23 XML program. Reads from standard input if
        omitted.
    --input=<path>
        Path to the program's input data. Reads from standard input if
        omitted.

At least one of --source/--input must be given; both silently reading
stdin is ambiguous and rejected.

Options:
    -h, --help
        Show this help message and exit."#,
        VERSION
    )
}

struct Cli {
    source: Option<String>,
    input: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Cli, CliError> {
    let mut source = None;
    let mut input = None;
    for arg in args {
        if let Some(path) = arg.strip_prefix("--source=") {
            source = Some(path.to_string());
        } else if let Some(path) = arg.strip_prefix("--input=") {
            input = Some(path.to_string());
        } else {
            return Err(CliError::UnknownFlag(arg.clone()));
        }
    }
    if source.is_none() && input.is_none() {
        return Err(CliError::AmbiguousStdin);
    }
    Ok(Cli { source, input })
}

fn read_source(path: Option<&str>) -> io::Result<String> {
    match path {
        Some(p) => fs::read_to_string(p),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", usage());
        return;
    }

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    };

    let xml = match read_source(cli.source.as_deref()) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("failed to read source: {}", e);
            std::process::exit(Fault::InvalidXml(e.to_string()).exit_code());
        }
    };

    let program = match load_program(&xml) {
        Ok(program) => program,
        Err(fault) => {
            eprintln!("{}", fault);
            std::process::exit(fault.exit_code());
        }
    };

    let mut input = match open_input(cli.input.as_deref()) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("failed to open input: {}", e);
            std::process::exit(1);
        }
    };
    let mut stdout = stdout_writer();
    let mut stderr = stderr_writer();
    let mut vm = Vm::new(input.as_mut(), &mut stdout, &mut stderr);

    match run(&program, &mut vm) {
        Ok(code) => std::process::exit(code),
        Err(fault) => {
            eprintln!("{}", fault);
            std::process::exit(fault.exit_code());
        }
    }
}
