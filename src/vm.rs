//! # Dispatcher for the IPPcode23 VM
//!
//! This module implements the fetch-decode-execute loop over a linear
//! [`Instruction`] sequence produced by the loader.
//!
//! ## High-level model
//! - **Frame store (`frames`)**: GF/LF/TF, see [`crate::frame`].
//! - **Operand stack (`operand_stack`)**: `PUSHS`/`POPS`.
//! - **Call stack (`call_stack`)**: return ordinals for `CALL`/`RETURN`.
//! - **Label index**: built once in a pre-pass over the program, maps
//!   label name → instruction ordinal.
//! - **Program counter (`pc`)**: the next instruction to fetch.
//!
//! The dispatcher reads `code[pc]`, **increments `pc` immediately** (so a
//! `CALL`'s return address is already "the instruction after this one"),
//! then executes the opcode. Jumps and `RETURN` overwrite `pc` themselves;
//! the loop does not re-advance it when that happens.
//!
//! Faults are fatal: any `Err(Fault)` returned by a handler propagates
//! straight out of `run`, matching spec §7 ("all faults are fatal and
//! non-recoverable").

use std::collections::HashMap;

use crate::error::Fault;
use crate::frame::{FrameStore, FrameTag};
use crate::io::{LineReader, LineWriter};
use crate::program::{Arg, Instruction, OpCode};
use crate::value::Value;

mod ops_arith;
mod ops_control;
mod ops_frame;
mod ops_io;
mod ops_string;

/// All mutable VM state threaded through the dispatch loop, plus the I/O
/// adapter the op handlers read and write through.
pub struct Vm<'io> {
    pub(crate) frames: FrameStore,
    pub(crate) operand_stack: Vec<Value>,
    pub(crate) call_stack: Vec<usize>,
    pub(crate) input: &'io mut dyn LineReader,
    pub(crate) stdout: &'io mut dyn LineWriter,
    pub(crate) stderr: &'io mut dyn LineWriter,
}

impl<'io> Vm<'io> {
    pub fn new(
        input: &'io mut dyn LineReader,
        stdout: &'io mut dyn LineWriter,
        stderr: &'io mut dyn LineWriter,
    ) -> Self {
        Vm {
            frames: FrameStore::new(),
            operand_stack: Vec::new(),
            call_stack: Vec::new(),
            input,
            stdout,
            stderr,
        }
    }
}

/// Resolve a symbol argument (literal or variable reference) to a `Value`.
/// Reading a variable that currently holds `Unset` is a missing-value
/// fault (spec §4.1).
pub(crate) fn resolve_symbol(arg: &Arg, frames: &FrameStore) -> Result<Value, Fault> {
    match arg {
        Arg::Const(v) => Ok(v.clone()),
        Arg::Var(tag, name) => frames.load(*tag, name),
        Arg::Label(_) | Arg::Type(_) => Err(Fault::WrongType(
            "expected a symbol argument".to_string(),
        )),
    }
}

/// Require an argument to be a variable reference (a destination operand).
pub(crate) fn var_ref(arg: &Arg) -> Result<(FrameTag, &str), Fault> {
    match arg {
        Arg::Var(tag, name) => Ok((*tag, name.as_str())),
        _ => Err(Fault::WrongType("expected a variable argument".to_string())),
    }
}

/// Require an argument to be a label name.
pub(crate) fn label_ref(arg: &Arg) -> Result<&str, Fault> {
    match arg {
        Arg::Label(name) => Ok(name.as_str()),
        _ => Err(Fault::WrongType("expected a label argument".to_string())),
    }
}

/// Require an argument to be a type-name literal (`READ`'s second arg).
pub(crate) fn type_name_ref(arg: &Arg) -> Result<&str, Fault> {
    match arg {
        Arg::Type(name) => Ok(name.as_str()),
        _ => Err(Fault::WrongType("expected a type argument".to_string())),
    }
}

/// Pop one value off the operand stack, or a missing-value fault if empty.
pub(crate) fn pop_operand(stack: &mut Vec<Value>) -> Result<Value, Fault> {
    stack
        .pop()
        .ok_or_else(|| Fault::MissingValue("operand stack is empty".to_string()))
}

/// Pre-pass (spec §4.4): walk the program once, recording `LABEL`
/// ordinals. Duplicate label names are a semantic fault (52).
fn build_label_index(code: &[Instruction]) -> Result<HashMap<String, usize>, Fault> {
    let mut labels = HashMap::new();
    for (ordinal, instr) in code.iter().enumerate() {
        if instr.opcode == OpCode::Label {
            let name = label_ref(&instr.args[0])?;
            if labels.insert(name.to_string(), ordinal).is_some() {
                return Err(Fault::SemanticError(format!(
                    "duplicate label '{}'",
                    name
                )));
            }
        }
    }
    Ok(labels)
}

/// Run `code` to completion. Returns the process exit code on a clean
/// halt (`EXIT` or PC past the end of the program), or the first fault
/// encountered along the taken control-flow path (spec §7: "the exit code
/// must match the first error encountered along the program's control-flow
/// path").
pub fn run(code: &[Instruction], vm: &mut Vm) -> Result<i32, Fault> {
    let labels = build_label_index(code)?;
    let mut pc: usize = 0;

    loop {
        if pc >= code.len() {
            return Ok(0);
        }
        let instr = &code[pc];
        // Advance immediately: by the time a handler runs, `pc` already
        // names "the next instruction", which is what CALL must save as
        // its return address.
        pc += 1;

        match instr.opcode {
            OpCode::DefVar => ops_frame::defvar(vm, &instr.args)?,
            OpCode::Move => ops_frame::mov(vm, &instr.args)?,
            OpCode::CreateFrame => ops_frame::create_frame(vm),
            OpCode::PushFrame => ops_frame::push_frame(vm)?,
            OpCode::PopFrame => ops_frame::pop_frame(vm)?,
            OpCode::Pushs => ops_frame::pushs(vm, &instr.args)?,
            OpCode::Pops => ops_frame::pops(vm, &instr.args)?,

            OpCode::Add => ops_arith::add(vm, &instr.args)?,
            OpCode::Sub => ops_arith::sub(vm, &instr.args)?,
            OpCode::Mul => ops_arith::mul(vm, &instr.args)?,
            OpCode::IDiv => ops_arith::idiv(vm, &instr.args)?,
            OpCode::Lt => ops_arith::lt(vm, &instr.args)?,
            OpCode::Gt => ops_arith::gt(vm, &instr.args)?,
            OpCode::Eq => ops_arith::eq(vm, &instr.args)?,
            OpCode::And => ops_arith::and(vm, &instr.args)?,
            OpCode::Or => ops_arith::or(vm, &instr.args)?,
            OpCode::Not => ops_arith::not(vm, &instr.args)?,
            OpCode::Int2Char => ops_arith::int2char(vm, &instr.args)?,
            OpCode::Stri2Int => ops_arith::stri2int(vm, &instr.args)?,

            OpCode::Concat => ops_string::concat(vm, &instr.args)?,
            OpCode::StrLen => ops_string::strlen(vm, &instr.args)?,
            OpCode::GetChar => ops_string::getchar(vm, &instr.args)?,
            OpCode::SetChar => ops_string::setchar(vm, &instr.args)?,

            OpCode::Read => ops_io::read(vm, &instr.args)?,
            OpCode::Write => ops_io::write(vm, &instr.args)?,
            OpCode::Type => ops_io::type_of(vm, &instr.args)?,
            OpCode::DPrint => ops_io::dprint(vm, &instr.args)?,
            OpCode::Break => ops_io::brk(vm, pc),

            OpCode::Label => {}
            OpCode::Jump => ops_control::jump(&instr.args, &labels, &mut pc)?,
            OpCode::JumpIfEq => ops_control::jump_if_eq(vm, &instr.args, &labels, &mut pc, true)?,
            OpCode::JumpIfNeq => {
                ops_control::jump_if_eq(vm, &instr.args, &labels, &mut pc, false)?
            }
            OpCode::Call => ops_control::call(&instr.args, &labels, &mut pc, &mut vm.call_stack)?,
            OpCode::Return => ops_control::ret(&mut pc, &mut vm.call_stack)?,
            OpCode::Exit => {
                if let Some(code) = ops_control::exit(vm, &instr.args)? {
                    return Ok(code);
                }
            }
        }
    }
}
