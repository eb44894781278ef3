//! Frame and stack manipulation opcodes: `DEFVAR`, `MOVE`, `CREATEFRAME`,
//! `PUSHFRAME`, `POPFRAME`, `PUSHS`, `POPS`.

use crate::error::Fault;
use crate::program::Arg;

use super::{pop_operand, resolve_symbol, var_ref, Vm};

pub(super) fn defvar(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    vm.frames.define(tag, name)
}

pub(super) fn mov(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let value = resolve_symbol(&args[1], &vm.frames)?;
    vm.frames.store(tag, name, value)
}

pub(super) fn create_frame(vm: &mut Vm) {
    vm.frames.create_temporary();
}

pub(super) fn push_frame(vm: &mut Vm) -> Result<(), Fault> {
    vm.frames.push_frame()
}

pub(super) fn pop_frame(vm: &mut Vm) -> Result<(), Fault> {
    vm.frames.pop_frame()
}

pub(super) fn pushs(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let value = resolve_symbol(&args[0], &vm.frames)?;
    vm.operand_stack.push(value);
    Ok(())
}

pub(super) fn pops(vm: &mut Vm, args: &[Arg]) -> Result<(), Fault> {
    let (tag, name) = var_ref(&args[0])?;
    let value = pop_operand(&mut vm.operand_stack)?;
    vm.frames.store(tag, name, value)
}
