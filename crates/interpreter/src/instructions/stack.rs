use crate::{gas, Host, InstructionResult, Interpreter};
use primitives::U256;

pub(crate) fn pop(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    popn!([_discarded], interpreter);
}

/// EIP-3855: PUSH0 instruction
///
/// Introduce a new instruction which pushes the constant value 0 onto the stack.
pub(crate) fn push0(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    check!(interpreter, SHANGHAI);
    gas!(interpreter, gas::BASE);
    push!(interpreter, U256::ZERO);
}

/// Pushes the `N` bytes following the opcode. Bytes past the end of the code read as zero.
pub(crate) fn push<const N: usize>(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    let start = interpreter.pc.min(interpreter.bytecode.len());
    let end = (interpreter.pc + N).min(interpreter.bytecode.len());
    let mut word = [0u8; 32];
    let immediate = &interpreter.bytecode[start..end];
    word[32 - N..32 - N + immediate.len()].copy_from_slice(immediate);
    push!(interpreter, U256::from_be_bytes(word));
    interpreter.pc += N;
}

pub(crate) fn dup<const N: usize>(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    if interpreter.stack.len() < N {
        interpreter.halt(InstructionResult::StackUnderflow);
        return;
    }
    if !interpreter.stack.dup(N) {
        interpreter.halt(InstructionResult::StackOverflow);
    }
}

pub(crate) fn swap<const N: usize>(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    if !interpreter.stack.exchange_top(N) {
        interpreter.halt(InstructionResult::StackUnderflow);
    }
}
