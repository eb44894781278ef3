//! Control-flow opcodes: `JUMP`, `JUMPIFEQ`/`JUMPIFNEQ`, `CALL`/`RETURN`,
//! `EXIT`. `LABEL` is handled directly by the dispatcher as a no-op (its
//! only effect is in the label pre-pass).

use std::collections::HashMap;

use crate::error::Fault;
use crate::program::Arg;

use super::{label_ref, ops_arith::values_equal, resolve_symbol, Vm};

fn resolve_label(name: &str, labels: &HashMap<String, usize>) -> Result<usize, Fault> {
    labels
        .get(name)
        .copied()
        .ok_or_else(|| Fault::SemanticError(format!("undefined label '{}'", name)))
}

pub(super) fn jump(
    args: &[Arg],
    labels: &HashMap<String, usize>,
    pc: &mut usize,
) -> Result<(), Fault> {
    let name = label_ref(&args[0])?;
    *pc = resolve_label(name, labels)?;
    Ok(())
}

pub(super) fn jump_if_eq(
    vm: &mut Vm,
    args: &[Arg],
    labels: &HashMap<String, usize>,
    pc: &mut usize,
    want_equal: bool,
) -> Result<(), Fault> {
    let name = label_ref(&args[0])?;
    let a = resolve_symbol(&args[1], &vm.frames)?;
    let b = resolve_symbol(&args[2], &vm.frames)?;
    let equal = values_equal(&a, &b)?;
    if equal == want_equal {
        *pc = resolve_label(name, labels)?;
    }
    Ok(())
}

pub(super) fn call(
    args: &[Arg],
    labels: &HashMap<String, usize>,
    pc: &mut usize,
    call_stack: &mut Vec<usize>,
) -> Result<(), Fault> {
    let name = label_ref(&args[0])?;
    let target = resolve_label(name, labels)?;
    call_stack.push(*pc);
    *pc = target;
    Ok(())
}

pub(super) fn ret(pc: &mut usize, call_stack: &mut Vec<usize>) -> Result<(), Fault> {
    *pc = call_stack
        .pop()
        .ok_or_else(|| Fault::MissingValue("RETURN with an empty call stack".to_string()))?;
    Ok(())
}

/// Returns `Some(code)` to signal the dispatcher should halt with that
/// process exit code; never returns `None` (kept as a `Result<Option<_>>`
/// so the dispatch table stays uniform with the other handlers).
pub(super) fn exit(vm: &mut Vm, args: &[Arg]) -> Result<Option<i32>, Fault> {
    let n = resolve_symbol(&args[0], &vm.frames)?.as_int()?;
    if !(0..=49).contains(&n) {
        return Err(Fault::WrongValue(format!(
            "EXIT code {} is outside the valid range 0-49",
            n
        )));
    }
    Ok(Some(n as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameTag;
    use crate::io::test_support::{BufferWriter, VecLineReader};
    use crate::value::Value;

    fn labels() -> HashMap<String, usize> {
        let mut m = HashMap::new();
        m.insert("loop".to_string(), 3);
        m
    }

    #[test]
    fn jump_sets_pc_to_label_target() {
        let mut pc = 0;
        jump(&[Arg::Label("loop".to_string())], &labels(), &mut pc).unwrap();
        assert_eq!(pc, 3);
    }

    #[test]
    fn jump_undefined_label_is_semantic_error() {
        let mut pc = 0;
        assert!(matches!(
            jump(&[Arg::Label("nope".to_string())], &labels(), &mut pc),
            Err(Fault::SemanticError(_))
        ));
    }

    #[test]
    fn call_then_return_round_trips_pc() {
        let mut pc = 5;
        let mut call_stack = Vec::new();
        call(
            &[Arg::Label("loop".to_string())],
            &labels(),
            &mut pc,
            &mut call_stack,
        )
        .unwrap();
        assert_eq!(pc, 3);
        ret(&mut pc, &mut call_stack).unwrap();
        assert_eq!(pc, 5);
    }

    #[test]
    fn return_without_call_is_missing_value() {
        let mut pc = 0;
        let mut call_stack = Vec::new();
        assert!(matches!(
            ret(&mut pc, &mut call_stack),
            Err(Fault::MissingValue(_))
        ));
    }

    #[test]
    fn exit_rejects_out_of_range_code() {
        let mut input = VecLineReader::new(vec![]);
        let mut out = BufferWriter::default();
        let mut err = BufferWriter::default();
        let mut vm = Vm::new(&mut input, &mut out, &mut err);
        vm.frames.define(FrameTag::Global, "c").unwrap();
        vm.frames
            .store(FrameTag::Global, "c", Value::Int(50))
            .unwrap();
        let args = vec![Arg::Var(FrameTag::Global, "c".to_string())];
        assert!(matches!(exit(&mut vm, &args), Err(Fault::WrongValue(_))));
    }

    #[test]
    fn exit_accepts_boundary_codes() {
        let mut input = VecLineReader::new(vec![]);
        let mut out = BufferWriter::default();
        let mut err = BufferWriter::default();
        let mut vm = Vm::new(&mut input, &mut out, &mut err);
        assert_eq!(
            exit(&mut vm, &[Arg::Const(Value::Int(0))]),
            Ok(Some(0))
        );
        assert_eq!(
            exit(&mut vm, &[Arg::Const(Value::Int(49))]),
            Ok(Some(49))
        );
    }
}
