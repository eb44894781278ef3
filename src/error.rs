//! # Error Handling for the IPPcode23 VM
//!
//! This module defines the **fault taxonomy** used throughout the loader
//! and dispatcher.
//!
//! ## Design
//! - [`Fault`] is a flat enum: every variant corresponds to exactly one
//!   numeric exit code from the interpreter's taxonomy (see
//!   [`Fault::exit_code`]). There is no generic "other error" catch-all —
//!   the taxonomy is closed and every fault site picks the variant that
//!   matches its bucket.
//! - Faults are fatal and non-recoverable: the dispatcher and loader never
//!   retry or downgrade a fault, they propagate it to `main`, which prints
//!   a diagnostic and exits with the matching code.
//! - [`CliError`] is a separate, small type for command-line usage
//!   mistakes (unknown flag, missing required source). It is kept distinct
//!   from `Fault` so a usage error can never be confused with a VM fault at
//!   the type level, even though both eventually become a process exit
//!   code.
//!
//! ## Display
//! - Implements [`fmt::Display`] for `Fault`, providing a short
//!   human-readable diagnostic written to standard error on exit.
//! - Implements [`std::error::Error`] so `Fault` integrates with Rust's
//!   standard error handling.

use std::fmt;

/// Faults that can occur while loading or executing an IPPcode23 program.
///
/// Each variant is tagged with the exit code it maps to; see
/// [`Fault::exit_code`] for the authoritative mapping.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Fault {
    /// Malformed XML (not well-formed, wrong root, bad encoding). Exit 31.
    InvalidXml(String),
    /// Well-formed XML that violates the IPPcode23 program structure:
    /// missing/duplicate `order`, unknown opcode, wrong argument shape.
    /// Exit 32.
    MalformedProgram(String),
    /// Other semantic error: undefined label, duplicate variable
    /// definition. Exit 52.
    SemanticError(String),
    /// Operand has the wrong type for the operation. Exit 53.
    WrongType(String),
    /// Access to an undefined variable (name not present in its frame).
    /// Exit 54.
    UndefinedVariable(String),
    /// Access to an unallocated frame (LF with an empty frame stack, or TF
    /// before `CREATEFRAME`). Exit 55.
    UnallocatedFrame(String),
    /// Missing value: read of an `Unset` variable, pop of an empty operand
    /// stack, or `RETURN` with an empty call stack. Exit 56.
    MissingValue(String),
    /// Wrong operand value: division by zero, out-of-range `EXIT` code.
    /// Exit 57.
    WrongValue(String),
    /// Illegal string operation: out-of-range index, invalid code point.
    /// Exit 58.
    StringOperation(String),
}

impl Fault {
    /// The numeric process exit code this fault maps to (see spec §6.4).
    pub fn exit_code(&self) -> i32 {
        match self {
            Fault::InvalidXml(_) => 31,
            Fault::MalformedProgram(_) => 32,
            Fault::SemanticError(_) => 52,
            Fault::WrongType(_) => 53,
            Fault::UndefinedVariable(_) => 54,
            Fault::UnallocatedFrame(_) => 55,
            Fault::MissingValue(_) => 56,
            Fault::WrongValue(_) => 57,
            Fault::StringOperation(_) => 58,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::InvalidXml(msg) => write!(f, "InvalidXml: {}", msg),
            Fault::MalformedProgram(msg) => write!(f, "MalformedProgram: {}", msg),
            Fault::SemanticError(msg) => write!(f, "SemanticError: {}", msg),
            Fault::WrongType(msg) => write!(f, "WrongType: {}", msg),
            Fault::UndefinedVariable(msg) => write!(f, "UndefinedVariable: {}", msg),
            Fault::UnallocatedFrame(msg) => write!(f, "UnallocatedFrame: {}", msg),
            Fault::MissingValue(msg) => write!(f, "MissingValue: {}", msg),
            Fault::WrongValue(msg) => write!(f, "WrongValue: {}", msg),
            Fault::StringOperation(msg) => write!(f, "StringOperation: {}", msg),
        }
    }
}

impl std::error::Error for Fault {}

/// Command-line usage errors, kept distinct from [`Fault`] per spec §6.1:
/// "Unknown flags → argument error (non-zero exit, distinct from VM
/// faults)".
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum CliError {
    /// An unrecognized flag was passed.
    UnknownFlag(String),
    /// Both `--source` and `--input` would otherwise read from stdin.
    AmbiguousStdin,
}

impl CliError {
    /// Fixed exit code for any CLI usage error; deliberately outside the
    /// VM fault taxonomy (0, 1-49, 31, 32, 52-58).
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::UnknownFlag(flag) => write!(f, "unknown argument: {}", flag),
            CliError::AmbiguousStdin => write!(
                f,
                "both --source and --input would read from stdin; provide at least one path"
            ),
        }
    }
}

impl std::error::Error for CliError {}
