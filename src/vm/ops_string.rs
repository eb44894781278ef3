//! String opcodes: `CONCAT`, `STRLEN`, `GETCHAR`, `SETCHAR`.

use crate::error::Fault;
use crate::program::Arg;
use crate::value::Value;

use super::ops_arith::char_at;
use super::{resolve_symbol, var_ref, Vm};

pub(super) fn concat(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let a = resolve_symbol(&args[1], &vm.frames)?;
    let b = resolve_symbol(&args[2], &vm.frames)?;
    let mut out = a.as_str()?.to_string();
    out.push_str(b.as_str()?);
    vm.frames.store(tag, name, Value::Str(out))
}

pub(super) fn strlen(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let s = resolve_symbol(&args[1], &vm.frames)?;
    let len = s.as_str()?.chars().count();
    vm.frames.store(tag, name, Value::Int(len as i64))
}

pub(super) fn getchar(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let s = resolve_symbol(&args[1], &vm.frames)?;
    let i = resolve_symbol(&args[2], &vm.frames)?.as_int()?;
    let ch = char_at(s.as_str()?, i)?;
    vm.frames.store(tag, name, Value::Str(ch.to_string()))
}

/// `SETCHAR <var> <index> <string>`: replace the character of `<var>`'s
/// current string value at `<index>` with the first character of
/// `<string>`. Both indices and the replacement must be in range: an
/// empty replacement string or an out-of-bounds index fault.
pub(super) fn setchar(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let current = vm.frames.load(tag, name)?;
    let current = current.as_str()?;
    let i = resolve_symbol(&args[1], &vm.frames)?.as_int()?;
    let replacement = resolve_symbol(&args[2], &vm.frames)?;
    let replacement = replacement.as_str()?;

    let replacement_ch = replacement
        .chars()
        .next()
        .ok_or_else(|| Fault::StringOperation("SETCHAR replacement string is empty".to_string()))?;

    if i < 0 {
        return Err(Fault::StringOperation(format!(
            "index {} is out of range",
            i
        )));
    }
    let mut chars: Vec<char> = current.chars().collect();
    let idx = i as usize;
    if idx >= chars.len() {
        return Err(Fault::StringOperation(format!(
            "index {} is out of range",
            i
        )));
    }
    chars[idx] = replacement_ch;
    let updated: String = chars.into_iter().collect();
    vm.frames.store(tag, name, Value::Str(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameTag;
    use crate::io::test_support::{BufferWriter, VecLineReader};

    fn new_vm<'a>(
        input: &'a mut VecLineReader,
        out: &'a mut BufferWriter,
        err: &'a mut BufferWriter,
    ) -> Vm<'a> {
        Vm::new(input, out, err)
    }

    #[test]
    fn concat_joins_two_strings() {
        let mut input = VecLineReader::new(vec![]);
        let mut out = BufferWriter::default();
        let mut err = BufferWriter::default();
        let mut vm = new_vm(&mut input, &mut out, &mut err);
        vm.frames.define(FrameTag::Global, "r").unwrap();
        let args = vec![
            Arg::Var(FrameTag::Global, "r".to_string()),
            Arg::Const(Value::Str("foo".to_string())),
            Arg::Const(Value::Str("bar".to_string())),
        ];
        concat(&mut vm, &args).unwrap();
        assert_eq!(
            vm.frames.load(FrameTag::Global, "r"),
            Ok(Value::Str("foobar".to_string()))
        );
    }

    #[test]
    fn setchar_replaces_one_character() {
        let mut input = VecLineReader::new(vec![]);
        let mut out = BufferWriter::default();
        let mut err = BufferWriter::default();
        let mut vm = new_vm(&mut input, &mut out, &mut err);
        vm.frames.define(FrameTag::Global, "s").unwrap();
        vm.frames
            .store(FrameTag::Global, "s", Value::Str("cat".to_string()))
            .unwrap();
        let args = vec![
            Arg::Var(FrameTag::Global, "s".to_string()),
            Arg::Const(Value::Int(0)),
            Arg::Const(Value::Str("b".to_string())),
        ];
        setchar(&mut vm, &args).unwrap();
        assert_eq!(
            vm.frames.load(FrameTag::Global, "s"),
            Ok(Value::Str("bat".to_string()))
        );
    }

    #[test]
    fn setchar_rejects_empty_replacement() {
        let mut input = VecLineReader::new(vec![]);
        let mut out = BufferWriter::default();
        let mut err = BufferWriter::default();
        let mut vm = new_vm(&mut input, &mut out, &mut err);
        vm.frames.define(FrameTag::Global, "s").unwrap();
        vm.frames
            .store(FrameTag::Global, "s", Value::Str("cat".to_string()))
            .unwrap();
        let args = vec![
            Arg::Var(FrameTag::Global, "s".to_string()),
            Arg::Const(Value::Int(0)),
            Arg::Const(Value::Str(String::new())),
        ];
        assert!(matches!(
            setchar(&mut vm, &args),
            Err(Fault::StringOperation(_))
        ));
    }

    #[test]
    fn setchar_rejects_out_of_range_index() {
        let mut input = VecLineReader::new(vec![]);
        let mut out = BufferWriter::default();
        let mut err = BufferWriter::default();
        let mut vm = new_vm(&mut input, &mut out, &mut err);
        vm.frames.define(FrameTag::Global, "s").unwrap();
        vm.frames
            .store(FrameTag::Global, "s", Value::Str("cat".to_string()))
            .unwrap();
        let args = vec![
            Arg::Var(FrameTag::Global, "s".to_string()),
            Arg::Const(Value::Int(3)),
            Arg::Const(Value::Str("x".to_string())),
        ];
        assert!(matches!(
            setchar(&mut vm, &args),
            Err(Fault::StringOperation(_))
        ));
    }
}
