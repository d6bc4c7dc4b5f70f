use crate::{gas, interpreter::Interpreter, Host, InstructionResult};
use primitives::{hardfork::SpecId, Address, Log, LogData, B256, BLOCK_HASH_HISTORY, U256};

#[inline]
fn pop_address(value: U256) -> Address {
    Address::from_word(B256::from(value))
}

pub(crate) fn balance(interpreter: &mut Interpreter, host: &mut dyn Host) {
    popn!([address], interpreter);
    let account = host_or_fail!(interpreter, host.load_account(pop_address(address)));
    gas!(
        interpreter,
        gas::account_access_cost(interpreter.spec_id, account.is_cold)
    );
    push!(interpreter, account.data.balance);
}

/// EIP-1884: Repricing for trie-size-dependent opcodes
pub(crate) fn selfbalance(interpreter: &mut Interpreter, host: &mut dyn Host) {
    check!(interpreter, ISTANBUL);
    gas!(interpreter, gas::LOW);
    let account = host_or_fail!(
        interpreter,
        host.load_account(interpreter.input.target_address)
    );
    push!(interpreter, account.data.balance);
}

pub(crate) fn extcodesize(interpreter: &mut Interpreter, host: &mut dyn Host) {
    popn!([address], interpreter);
    let code = host_or_fail!(interpreter, host.load_code(pop_address(address)));
    gas!(
        interpreter,
        gas::account_access_cost(interpreter.spec_id, code.is_cold)
    );
    push!(interpreter, U256::from(code.data.len()));
}

/// EIP-1052: EXTCODEHASH opcode
pub(crate) fn extcodehash(interpreter: &mut Interpreter, host: &mut dyn Host) {
    check!(interpreter, PETERSBURG);
    popn!([address], interpreter);
    let account = host_or_fail!(interpreter, host.load_account(pop_address(address)));
    gas!(
        interpreter,
        gas::account_access_cost(interpreter.spec_id, account.is_cold)
    );
    // empty accounts hash to zero
    let hash = if account.data.is_empty() {
        B256::ZERO
    } else {
        account.data.code_hash
    };
    push!(interpreter, hash.into());
}

pub(crate) fn extcodecopy(interpreter: &mut Interpreter, host: &mut dyn Host) {
    popn!([address, memory_offset, code_offset, len_u256], interpreter);
    let code = host_or_fail!(interpreter, host.load_code(pop_address(address)));

    let len = as_usize_or_fail!(interpreter, len_u256);
    gas_or_fail!(
        interpreter,
        gas::copy_cost(
            gas::account_access_cost(interpreter.spec_id, code.is_cold),
            len
        )
    );
    if len == 0 {
        return;
    }
    let memory_offset = as_usize_or_fail!(interpreter, memory_offset);
    let code_offset = as_usize_saturated!(code_offset);
    resize_memory!(interpreter, memory_offset, len);

    interpreter
        .memory
        .set_data(memory_offset, code_offset, len, code.data.bytes_slice());
}

pub(crate) fn blockhash(interpreter: &mut Interpreter, host: &mut dyn Host) {
    gas!(interpreter, gas::BLOCKHASH);
    popn!([number], interpreter);
    let requested = as_u64_saturated!(number);
    let current = host.env().block.number;

    // Only the 256 most recent blocks, excluding the current one, have a hash.
    let hash = if requested < current && current - requested <= BLOCK_HASH_HISTORY {
        host_or_fail!(interpreter, host.block_hash(requested))
    } else {
        B256::ZERO
    };
    push!(interpreter, hash.into());
}

pub(crate) fn sload(interpreter: &mut Interpreter, host: &mut dyn Host) {
    popn!([index], interpreter);
    let value = host_or_fail!(
        interpreter,
        host.sload(interpreter.input.target_address, index)
    );
    gas!(
        interpreter,
        gas::sload_cost(interpreter.spec_id, value.is_cold)
    );
    push!(interpreter, value.data);
}

pub(crate) fn sstore(interpreter: &mut Interpreter, host: &mut dyn Host) {
    require_non_staticcall!(interpreter);
    popn!([index, value], interpreter);

    // EIP-2200: Structured Definitions for Net Gas Metering
    if interpreter.spec_id.is_enabled_in(SpecId::ISTANBUL)
        && interpreter.gas.remaining() <= gas::CALL_STIPEND
    {
        interpreter.halt(InstructionResult::OutOfGas);
        return;
    }

    let state_load = host_or_fail!(
        interpreter,
        host.sstore(interpreter.input.target_address, index, value)
    );
    gas!(
        interpreter,
        gas::sstore_cost(interpreter.spec_id, &state_load.data, state_load.is_cold)
    );
    interpreter
        .gas
        .record_refund(gas::sstore_refund(interpreter.spec_id, &state_load.data));
}

/// EIP-1153: Transient storage opcodes
pub(crate) fn tstore(interpreter: &mut Interpreter, host: &mut dyn Host) {
    check!(interpreter, CANCUN);
    require_non_staticcall!(interpreter);
    gas!(interpreter, gas::WARM_STORAGE_READ_COST);
    popn!([index, value], interpreter);
    host_or_fail!(
        interpreter,
        host.tstore(interpreter.input.target_address, index, value)
    );
}

/// EIP-1153: Transient storage opcodes
pub(crate) fn tload(interpreter: &mut Interpreter, host: &mut dyn Host) {
    check!(interpreter, CANCUN);
    gas!(interpreter, gas::WARM_STORAGE_READ_COST);
    popn_top!([], index, interpreter);
    *index = host.tload(interpreter.input.target_address, *index);
}

pub(crate) fn log<const N: usize>(interpreter: &mut Interpreter, host: &mut dyn Host) {
    require_non_staticcall!(interpreter);

    popn!([offset, len], interpreter);
    let len = as_usize_or_fail!(interpreter, len);
    gas_or_fail!(interpreter, gas::log_cost(N as u8, len));
    let data = if len == 0 {
        Vec::new()
    } else {
        let offset = as_usize_or_fail!(interpreter, offset);
        resize_memory!(interpreter, offset, len);
        interpreter.memory.slice_len(offset, len).to_vec()
    };
    let Some(topics) = interpreter.stack.popn::<N>() else {
        interpreter.halt(InstructionResult::StackUnderflow);
        return;
    };

    let log = Log {
        address: interpreter.input.target_address,
        data: LogData::new_unchecked(
            topics.into_iter().map(B256::from).collect(),
            data.into(),
        ),
    };
    host_or_fail!(interpreter, host.log(log));
}
