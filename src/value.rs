//! # Value Representation for the IPPcode23 VM
//!
//! This module defines [`Value`], the universal runtime type held by
//! variables, the operand stack, and literal arguments.
//!
//! ## Supported types
//! - `Int(i64)` – 64-bit signed integer
//! - `Bool(bool)` – boolean truth value
//! - `Str(String)` – Unicode text (sequence of scalar values)
//! - `Nil` – the unique nil constant
//! - `Unset` – the sentinel of a defined-but-unassigned variable
//!
//! ## Design
//! Unlike a dynamically-typed scripting value, `Value` performs **no**
//! implicit coercion between tags: every opcode that needs a specific type
//! checks the tag explicitly and raises [`crate::error::Fault::WrongType`]
//! on mismatch. `Unset` is a distinct tag (not folded into `Nil`) because
//! reading it is a different fault (missing value, not a legitimate nil
//! read) everywhere except `TYPE`, which must not fault on it.

use crate::error::Fault;

/// Value type for IPPcode23 variables, literals, and the operand stack.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),
    /// Boolean truth value.
    Bool(bool),
    /// Unicode text, indexed by scalar value (not byte).
    Str(String),
    /// The unique nil constant.
    Nil,
    /// Sentinel of a defined-but-never-assigned variable.
    Unset,
}

impl Value {
    /// The type-name string used by `TYPE` and in diagnostics: one of
    /// `"int"`, `"bool"`, `"string"`, `"nil"`. `Unset` has no type name
    /// here — callers that need the `TYPE` carve-out (`""` on `Unset`)
    /// must check for `Unset` themselves before calling this.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Nil => "nil",
            Value::Unset => "",
        }
    }

    /// Format this value for `WRITE`/`DPRINT` per spec §6.3.
    ///
    /// `Unset` has no defined textual form: every read path that could
    /// observe it raises [`Fault::MissingValue`] before formatting is ever
    /// attempted, so this falls back to an empty string only as a last
    /// resort and should be unreachable in practice.
    pub fn format(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Bool(b) => {
                if *b {
                    "true".to_string()
                } else {
                    "false".to_string()
                }
            }
            Value::Str(s) => s.clone(),
            Value::Nil => String::new(),
            Value::Unset => String::new(),
        }
    }

    /// Require this value to be an `Int`, else a `WrongType` fault.
    pub fn as_int(&self) -> Result<i64, Fault> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(Fault::WrongType(format!(
                "expected int, found {}",
                other.type_name()
            ))),
        }
    }

    /// Require this value to be a `Bool`, else a `WrongType` fault.
    pub fn as_bool(&self) -> Result<bool, Fault> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(Fault::WrongType(format!(
                "expected bool, found {}",
                other.type_name()
            ))),
        }
    }

    /// Require this value to be a `Str`, else a `WrongType` fault.
    pub fn as_str(&self) -> Result<&str, Fault> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(Fault::WrongType(format!(
                "expected string, found {}",
                other.type_name()
            ))),
        }
    }
}
