//! Arithmetic, relational, logical, and character-conversion opcodes:
//! `ADD`/`SUB`/`MUL`/`IDIV`, `LT`/`GT`/`EQ`, `AND`/`OR`/`NOT`, `INT2CHAR`,
//! `STRI2INT`.

use std::cmp::Ordering;

use crate::error::Fault;
use crate::program::Arg;
use crate::value::Value;

use super::{resolve_symbol, var_ref, Vm};

fn binary_int(
    vm: &mut Vm,
    args: &[Arg],
    f: impl FnOnce(i64, i64) -> Result<i64, Fault>,
) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let a = resolve_symbol(&args[1], &vm.frames)?.as_int()?;
    let b = resolve_symbol(&args[2], &vm.frames)?.as_int()?;
    let result = f(a, b)?;
    vm.frames.store(tag, name, Value::Int(result))
}

pub(super) fn add(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    binary_int(vm, args, |a, b| Ok(a.wrapping_add(b)))
}

pub(super) fn sub(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    binary_int(vm, args, |a, b| Ok(a.wrapping_sub(b)))
}

pub(super) fn mul(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    binary_int(vm, args, |a, b| Ok(a.wrapping_mul(b)))
}

/// Floor division: rounds the quotient toward negative infinity, unlike
/// Rust's `/` which truncates toward zero (`-7 IDIV 2` is `-4`, not `-3`).
fn floor_div(a: i64, b: i64) -> Result<i64, Fault> {
    if b == 0 {
        return Err(Fault::WrongValue("IDIV by zero".to_string()));
    }
    // `a == i64::MIN, b == -1` overflows plain `/`/`%`; wrapping_div already
    // wraps to i64::MIN there and wrapping_rem is 0, so no extra branch is
    // needed to keep that case from panicking.
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

pub(super) fn idiv(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    binary_int(vm, args, floor_div)
}

/// Compare two same-tagged, non-nil values. `Bool` orders `false < true`.
fn compare(a: &Value, b: &Value) -> Result<Ordering, Fault> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        _ => Err(Fault::WrongType(
            "LT/GT require two operands of the same comparable type".to_string(),
        )),
    }
}

fn relational(
    vm: &mut Vm,
    args: &[Arg],
    ordering: Ordering,
) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let a = resolve_symbol(&args[1], &vm.frames)?;
    let b = resolve_symbol(&args[2], &vm.frames)?;
    let result = compare(&a, &b)? == ordering;
    vm.frames.store(tag, name, Value::Bool(result))
}

pub(super) fn lt(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    relational(vm, args, Ordering::Less)
}

pub(super) fn gt(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    relational(vm, args, Ordering::Greater)
}

/// `Nil` is only ever equal to `Nil`; otherwise both operands must share a
/// tag and that tag's value must match. Used by `EQ` and by
/// `JUMPIFEQ`/`JUMPIFNEQ`.
pub(super) fn values_equal(a: &Value, b: &Value) -> Result<bool, Fault> {
    match (a, b) {
        (Value::Nil, Value::Nil) => Ok(true),
        (Value::Nil, _) | (_, Value::Nil) => Ok(false),
        (Value::Int(_), Value::Int(_))
        | (Value::Bool(_), Value::Bool(_))
        | (Value::Str(_), Value::Str(_)) => Ok(a == b),
        _ => Err(Fault::WrongType(
            "EQ requires two operands of the same type (or nil)".to_string(),
        )),
    }
}

pub(super) fn eq(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let a = resolve_symbol(&args[1], &vm.frames)?;
    let b = resolve_symbol(&args[2], &vm.frames)?;
    let result = values_equal(&a, &b)?;
    vm.frames.store(tag, name, Value::Bool(result))
}

fn binary_bool(
    vm: &mut Vm,
    args: &[Arg],
    f: impl FnOnce(bool, bool) -> bool,
) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let a = resolve_symbol(&args[1], &vm.frames)?.as_bool()?;
    let b = resolve_symbol(&args[2], &vm.frames)?.as_bool()?;
    vm.frames.store(tag, name, Value::Bool(f(a, b)))
}

pub(super) fn and(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    binary_bool(vm, args, |a, b| a && b)
}

pub(super) fn or(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    binary_bool(vm, args, |a, b| a || b)
}

pub(super) fn not(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let a = resolve_symbol(&args[1], &vm.frames)?.as_bool()?;
    vm.frames.store(tag, name, Value::Bool(!a))
}

pub(super) fn int2char(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let n = resolve_symbol(&args[1], &vm.frames)?.as_int()?;
    let code = u32::try_from(n).map_err(|_| {
        Fault::StringOperation(format!("{} is not a valid Unicode code point", n))
    })?;
    let ch = char::from_u32(code).ok_or_else(|| {
        Fault::StringOperation(format!("{} is not a valid Unicode scalar value", n))
    })?;
    vm.frames.store(tag, name, Value::Str(ch.to_string()))
}

pub(super) fn stri2int(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let s = resolve_symbol(&args[1], &vm.frames)?;
    let s = s.as_str()?;
    let i = resolve_symbol(&args[2], &vm.frames)?.as_int()?;
    let ch = char_at(s, i)?;
    vm.frames.store(tag, name, Value::Int(ch as i64))
}

/// Fetch the scalar-value character at index `i`, or a string-operation
/// fault if `i` is outside `[0, chars().count())`.
pub(super) fn char_at(s: &str, i: i64) -> Result<char, Fault> {
    if i < 0 {
        return Err(Fault::StringOperation(format!(
            "index {} is out of range",
            i
        )));
    }
    s.chars()
        .nth(i as usize)
        .ok_or_else(|| Fault::StringOperation(format!("index {} is out of range", i)))
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
    fn idiv_floors_toward_negative_infinity() {
        assert_eq!(floor_div(-7, 2), Ok(-4));
        assert_eq!(floor_div(7, 2), Ok(3));
        assert_eq!(floor_div(-7, -2), Ok(3));
    }

    #[test]
    fn idiv_by_zero_is_wrong_value() {
        assert!(matches!(floor_div(1, 0), Err(Fault::WrongValue(_))));
    }

    #[test]
    fn idiv_min_by_neg_one_does_not_panic() {
        assert_eq!(floor_div(i64::MIN, -1), Ok(i64::MIN));
    }

    #[test]
    fn bool_lt_orders_false_before_true() {
        assert_eq!(
            compare(&Value::Bool(false), &Value::Bool(true)),
            Ok(Ordering::Less)
        );
    }

    #[test]
    fn eq_nil_only_matches_nil() {
        assert_eq!(values_equal(&Value::Nil, &Value::Nil), Ok(true));
        assert_eq!(values_equal(&Value::Nil, &Value::Int(0)), Ok(false));
        assert!(values_equal(&Value::Int(1), &Value::Bool(true)).is_err());
    }

    #[test]
    fn int2char_rejects_surrogate_range() {
        let mut input = VecLineReader::new(vec![]);
        let mut out = BufferWriter::default();
        let mut err = BufferWriter::default();
        let mut vm = new_vm(&mut input, &mut out, &mut err);
        vm.frames.define(FrameTag::Global, "c").unwrap();
        let args = vec![
            Arg::Var(FrameTag::Global, "c".to_string()),
            Arg::Const(Value::Int(0xD800)),
        ];
        assert!(matches!(
            int2char(&mut vm, &args),
            Err(Fault::StringOperation(_))
        ));
    }

    #[test]
    fn stri2int_in_range() {
        assert_eq!(char_at("abc", 1), Ok('b'));
        assert!(char_at("abc", 3).is_err());
        assert!(char_at("abc", -1).is_err());
    }
}
