use crate::{gas, Host, InstructionResult, Interpreter};
use primitives::{Bytes, U256};

pub(crate) fn jump(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::MID);
    popn!([target], interpreter);
    jump_inner(interpreter, target);
}

pub(crate) fn jumpi(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::HIGH);
    popn!([target, cond], interpreter);
    if !cond.is_zero() {
        jump_inner(interpreter, target);
    }
}

#[inline]
fn jump_inner(interpreter: &mut Interpreter, target: U256) {
    let target = as_usize_or_fail!(interpreter, target, InstructionResult::InvalidJump);
    if !interpreter.jump_table.is_valid(target) {
        interpreter.halt(InstructionResult::InvalidJump);
        return;
    }
    interpreter.pc = target;
}

pub(crate) fn jumpdest(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::JUMPDEST);
}

pub(crate) fn pc(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    // - 1 because we have already advanced the program counter in `Interpreter::step`
    push!(interpreter, U256::from(interpreter.pc - 1));
}

#[inline]
fn return_inner(interpreter: &mut Interpreter, result: InstructionResult) {
    // zero gas cost
    popn!([offset, len], interpreter);
    let len = as_usize_or_fail!(interpreter, len);
    // important: offset must be ignored if len is zero
    let mut output = Bytes::new();
    if len != 0 {
        let offset = as_usize_or_fail!(interpreter, offset);
        resize_memory!(interpreter, offset, len);
        output = interpreter.memory.slice_len(offset, len).to_vec().into();
    }
    interpreter.output = output;
    interpreter.halt(result);
}

pub(crate) fn ret(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    return_inner(interpreter, InstructionResult::Return);
}

/// EIP-140: REVERT instruction
pub(crate) fn revert(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    check!(interpreter, BYZANTIUM);
    return_inner(interpreter, InstructionResult::Revert);
}

pub(crate) fn stop(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    interpreter.halt(InstructionResult::Stop);
}

/// Invalid opcode. This opcode halts the execution.
pub(crate) fn invalid(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    interpreter.halt(InstructionResult::InvalidFEOpcode);
}

/// Unknown opcode. This opcode halts the execution.
pub(crate) fn unknown(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    interpreter.halt(InstructionResult::OpcodeNotFound);
}
