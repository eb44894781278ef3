//! I/O and diagnostic opcodes: `READ`, `WRITE`, `TYPE`, `DPRINT`, `BREAK`.

use crate::error::Fault;
use crate::program::Arg;
use crate::value::Value;

use super::{resolve_symbol, type_name_ref, var_ref, Vm};

/// Parse one input line according to the requested type. A missing line
/// (end of input) or a line that doesn't parse as the requested type both
/// yield `Nil` (spec §6.3: "malformed or absent input reads as nil"),
/// rather than faulting — `READ` is the one opcode that turns bad input
/// into data instead of a fault.
fn parse_read(line: Option<String>, type_name: &str) -> Value {
    let line = match line {
        Some(l) => l,
        None => return Value::Nil,
    };
    match type_name {
        "int" => line
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or(Value::Nil),
        "bool" => Value::Bool(line.trim().eq_ignore_ascii_case("true")),
        "string" => Value::Str(line),
        _ => Value::Nil,
    }
}

pub(super) fn read(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let type_name = type_name_ref(&args[1])?;
    let line = vm.input.read_line();
    let value = parse_read(line, type_name);
    vm.frames.store(tag, name, value)
}

pub(super) fn write(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let value = resolve_symbol(&args[0], &vm.frames)?;
    vm.stdout.write_str(&value.format());
    Ok(())
}

/// `TYPE`'s carve-out: a variable currently holding `Unset` yields `""`
/// instead of faulting, which is why this reads via `peek` rather than
/// going through the normal symbol-resolution path.
pub(super) fn type_of(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let type_str = match &args[1] {
        Arg::Var(src_tag, src_name) => match vm.frames.peek(*src_tag, src_name)? {
            Value::Unset => String::new(),
            v => v.type_name().to_string(),
        },
        Arg::Const(v) => v.type_name().to_string(),
        _ => {
            return Err(Fault::WrongType(
                "TYPE's second argument must be a symbol".to_string(),
            ))
        }
    };
    vm.frames.store(tag, name, Value::Str(type_str))
}

pub(super) fn dprint(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let value = resolve_symbol(&args[0], &vm.frames)?;
    vm.stderr.write_str(&value.format());
    Ok(())
}

/// `BREAK`: emits a one-line diagnostic snapshot of the interpreter state
/// to standard error. Never faults.
pub(super) fn brk(vm: &mut Vm, pc: usize) {
    vm.stderr.write_str(&format!(
        "BREAK: pc={} call_stack_depth={} operand_stack_depth={}\n",
        pc,
        vm.call_stack.len(),
        vm.operand_stack.len()
    ));
}
