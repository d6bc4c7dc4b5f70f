use crate::{gas, Host, InstructionResult, Interpreter};
use primitives::{keccak256, B256, KECCAK_EMPTY, U256};

pub(crate) fn keccak256_op(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    popn!([offset, len], interpreter);
    let len = as_usize_or_fail!(interpreter, len);
    gas_or_fail!(interpreter, gas::keccak256_cost(len));
    let hash = if len == 0 {
        KECCAK_EMPTY
    } else {
        let from = as_usize_or_fail!(interpreter, offset);
        resize_memory!(interpreter, from, len);
        keccak256(interpreter.memory.slice_len(from, len))
    };
    push!(interpreter, hash.into());
}

pub(crate) fn address(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    push!(
        interpreter,
        interpreter.input.target_address.into_word().into()
    );
}

pub(crate) fn caller(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    push!(interpreter, interpreter.input.caller.into_word().into());
}

pub(crate) fn callvalue(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    push!(interpreter, interpreter.input.call_value);
}

pub(crate) fn calldataload(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([], offset_ptr, interpreter);
    let offset = as_usize_saturated!(*offset_ptr);
    let input = &interpreter.input.input;
    let mut word = B256::ZERO;
    if offset < input.len() {
        let count = 32.min(input.len() - offset);
        word[..count].copy_from_slice(&input[offset..offset + count]);
    }
    *offset_ptr = word.into();
}

pub(crate) fn calldatasize(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    push!(interpreter, U256::from(interpreter.input.input.len()));
}

pub(crate) fn calldatacopy(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    popn!([memory_offset, data_offset, len], interpreter);
    let Some(memory_offset) = memory_resize(interpreter, memory_offset, len) else {
        return;
    };
    let data_offset = as_usize_saturated!(data_offset);
    let len = as_usize_saturated!(len);
    let input = interpreter.input.input.clone();
    interpreter
        .memory
        .set_data(memory_offset, data_offset, len, &input);
}

pub(crate) fn codesize(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    push!(interpreter, U256::from(interpreter.bytecode.len()));
}

pub(crate) fn codecopy(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    popn!([memory_offset, code_offset, len], interpreter);
    let Some(memory_offset) = memory_resize(interpreter, memory_offset, len) else {
        return;
    };
    let code_offset = as_usize_saturated!(code_offset);
    let len = as_usize_saturated!(len);
    let code = interpreter.bytecode.clone();
    interpreter
        .memory
        .set_data(memory_offset, code_offset, len, &code);
}

/// EIP-211: New opcodes: RETURNDATASIZE and RETURNDATACOPY
pub(crate) fn returndatasize(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    check!(interpreter, BYZANTIUM);
    gas!(interpreter, gas::BASE);
    push!(interpreter, U256::from(interpreter.return_data.len()));
}

/// EIP-211: New opcodes: RETURNDATASIZE and RETURNDATACOPY
pub(crate) fn returndatacopy(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    check!(interpreter, BYZANTIUM);
    popn!([memory_offset, offset, len], interpreter);

    let len = as_usize_or_fail!(interpreter, len);
    let data_offset = as_usize_saturated!(offset);

    // Old legacy behavior is to panic if data_end is out of scope of return buffer.
    let data_end = data_offset.saturating_add(len);
    if data_end > interpreter.return_data.len() {
        interpreter.halt(InstructionResult::OutOfOffset);
        return;
    }

    let Some(memory_offset) = memory_resize(interpreter, memory_offset, U256::from(len)) else {
        return;
    };
    let data = interpreter.return_data.clone();
    interpreter
        .memory
        .set_data(memory_offset, data_offset, len, &data);
}

pub(crate) fn gas(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    push!(interpreter, U256::from(interpreter.gas.remaining()));
}

/// Charges the copy cost and grows memory for a `*COPY` instruction.
///
/// Returns the memory offset, or `None` if the instruction halted. A zero length copy never
/// touches memory.
pub(crate) fn memory_resize(
    interpreter: &mut Interpreter,
    memory_offset: U256,
    len: U256,
) -> Option<usize> {
    let Ok(len) = usize::try_from(len) else {
        interpreter.halt(InstructionResult::OutOfGas);
        return None;
    };
    let Some(cost) = gas::copy_cost_verylow(len) else {
        interpreter.halt(InstructionResult::OutOfGas);
        return None;
    };
    if !interpreter.gas.record_cost(cost) {
        interpreter.halt(InstructionResult::OutOfGas);
        return None;
    }
    if len == 0 {
        return Some(0);
    }
    let Ok(memory_offset) = usize::try_from(memory_offset) else {
        interpreter.halt(InstructionResult::OutOfGas);
        return None;
    };
    interpreter
        .resize_memory(memory_offset, len)
        .then_some(memory_offset)
}
