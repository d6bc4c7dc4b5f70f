use crate::{
    gas,
    interpreter_action::{CallInputs, CallScheme, CallValue, CreateInputs, CreateScheme},
    Host, InstructionResult, Interpreter, InterpreterResult,
};
use core::{cmp::min, ops::Range};
use primitives::{hardfork::SpecId, Address, Bytes, B256, U256};

/// Resolves the input and output memory ranges of a call, growing memory to cover both.
///
/// Returns `None` if the instruction halted.
fn get_memory_input_and_out_ranges(
    interpreter: &mut Interpreter,
    in_offset: U256,
    in_len: U256,
    out_offset: U256,
    out_len: U256,
) -> Option<(Bytes, Range<usize>)> {
    let in_range = resize_memory_range(interpreter, in_offset, in_len)?;
    let input = if in_range.is_empty() {
        Bytes::new()
    } else {
        Bytes::copy_from_slice(interpreter.memory.slice_len(in_range.start, in_range.len()))
    };
    let out_range = resize_memory_range(interpreter, out_offset, out_len)?;
    Some((input, out_range))
}

/// Grows memory to cover `offset..offset + len`. A zero length never touches memory.
fn resize_memory_range(
    interpreter: &mut Interpreter,
    offset: U256,
    len: U256,
) -> Option<Range<usize>> {
    let Ok(len) = usize::try_from(len) else {
        interpreter.halt(InstructionResult::OutOfGas);
        return None;
    };
    if len == 0 {
        return Some(usize::MAX..usize::MAX);
    }
    let Ok(offset) = usize::try_from(offset) else {
        interpreter.halt(InstructionResult::OutOfGas);
        return None;
    };
    interpreter
        .resize_memory(offset, len)
        .then_some(offset..offset + len)
}

/// Gas forwarded to a child frame: the requested amount capped at all but one 64th of what
/// is left (EIP-150). Before Tangerine the request must be affordable in full.
fn child_gas_limit(interpreter: &mut Interpreter, requested: u64) -> Option<u64> {
    let remaining = interpreter.gas.remaining();
    let gas_limit = if interpreter.spec_id.is_enabled_in(SpecId::TANGERINE) {
        min(gas::max_child_gas(interpreter.spec_id, remaining), requested)
    } else {
        requested
    };
    if !interpreter.gas.record_cost(gas_limit) {
        interpreter.halt(InstructionResult::OutOfGas);
        return None;
    }
    Some(gas_limit)
}

/// Folds a finished child frame back into the caller.
fn return_child_gas(interpreter: &mut Interpreter, result: &InterpreterResult) {
    interpreter.gas.erase_cost(result.gas.remaining());
    if result.is_ok() {
        interpreter.gas.record_refund(result.gas.refunded());
    }
}

#[inline]
fn pop_address(value: U256) -> Address {
    Address::from_word(B256::from(value))
}

fn call_inner(interpreter: &mut Interpreter, host: &mut dyn Host, scheme: CallScheme) {
    let (local_gas_limit, to, value, in_offset, in_len, out_offset, out_len) = match scheme {
        CallScheme::Call => {
            popn!([gas_limit, to, value, in_offset, in_len, out_offset, out_len], interpreter);
            (gas_limit, to, value, in_offset, in_len, out_offset, out_len)
        }
        CallScheme::DelegateCall | CallScheme::StaticCall => {
            popn!([gas_limit, to, in_offset, in_len, out_offset, out_len], interpreter);
            (gas_limit, to, U256::ZERO, in_offset, in_len, out_offset, out_len)
        }
    };
    let to = pop_address(to);
    let local_gas_limit = as_u64_saturated!(local_gas_limit);
    let transfers_value = scheme == CallScheme::Call && !value.is_zero();

    // Calls with value from a static frame are state changes.
    if interpreter.input.is_static && transfers_value {
        interpreter.halt(InstructionResult::StateChangeDuringStaticCall);
        return;
    }

    let Some((input, return_memory_offset)) =
        get_memory_input_and_out_ranges(interpreter, in_offset, in_len, out_offset, out_len)
    else {
        return;
    };

    let account = host_or_fail!(interpreter, host.load_account(to));
    // Only plain calls can create the callee by sending it value.
    let is_empty = scheme == CallScheme::Call && account.data.is_empty();
    gas!(
        interpreter,
        gas::call_cost(interpreter.spec_id, transfers_value, account.is_cold, is_empty)
    );

    let Some(mut gas_limit) = child_gas_limit(interpreter, local_gas_limit) else {
        return;
    };
    if transfers_value {
        gas_limit = gas_limit.saturating_add(gas::CALL_STIPEND);
    }

    let (target_address, caller, call_value) = match scheme {
        CallScheme::Call | CallScheme::StaticCall => (
            to,
            interpreter.input.target_address,
            CallValue::Transfer(value),
        ),
        CallScheme::DelegateCall => (
            interpreter.input.target_address,
            interpreter.input.caller,
            CallValue::Apparent(interpreter.input.call_value),
        ),
    };

    let outcome = host.call(CallInputs {
        input,
        return_memory_offset,
        gas_limit,
        bytecode_address: to,
        target_address,
        caller,
        value: call_value,
        scheme,
        is_static: interpreter.input.is_static || scheme == CallScheme::StaticCall,
    });

    if outcome.result.result.is_fatal() {
        interpreter.halt(InstructionResult::FatalExternalError);
        return;
    }

    return_child_gas(interpreter, &outcome.result);
    let target_len = min(outcome.memory_offset.len(), outcome.result.output.len());
    if target_len != 0 {
        interpreter.memory.set(
            outcome.memory_offset.start,
            &outcome.result.output[..target_len],
        );
    }
    interpreter.return_data = outcome.result.output;
    push!(interpreter, U256::from(outcome.result.result.is_ok()));
}

pub(crate) fn call(interpreter: &mut Interpreter, host: &mut dyn Host) {
    call_inner(interpreter, host, CallScheme::Call);
}

/// EIP-7: DELEGATECALL
pub(crate) fn delegate_call(interpreter: &mut Interpreter, host: &mut dyn Host) {
    check!(interpreter, HOMESTEAD);
    call_inner(interpreter, host, CallScheme::DelegateCall);
}

/// EIP-214: New opcode STATICCALL
pub(crate) fn static_call(interpreter: &mut Interpreter, host: &mut dyn Host) {
    check!(interpreter, BYZANTIUM);
    call_inner(interpreter, host, CallScheme::StaticCall);
}

pub(crate) fn create<const IS_CREATE2: bool>(interpreter: &mut Interpreter, host: &mut dyn Host) {
    require_non_staticcall!(interpreter);

    // EIP-1014: Skinny CREATE2
    if IS_CREATE2 {
        check!(interpreter, PETERSBURG);
    }

    popn!([value, code_offset, len], interpreter);
    let len = as_usize_or_fail!(interpreter, len);

    let mut init_code = Bytes::new();
    if len != 0 {
        // EIP-3860: Limit and meter initcode
        if interpreter.spec_id.is_enabled_in(SpecId::SHANGHAI) {
            if len > host.env().cfg.max_initcode_size() {
                interpreter.halt(InstructionResult::CreateInitCodeSizeLimit);
                return;
            }
            gas!(interpreter, gas::initcode_cost(len));
        }

        let code_offset = as_usize_or_fail!(interpreter, code_offset);
        resize_memory!(interpreter, code_offset, len);
        init_code = Bytes::copy_from_slice(interpreter.memory.slice_len(code_offset, len));
    }

    let scheme = if IS_CREATE2 {
        popn!([salt], interpreter);
        gas_or_fail!(interpreter, gas::create2_cost(len));
        CreateScheme::Create2 { salt }
    } else {
        gas!(interpreter, gas::CREATE);
        CreateScheme::Create
    };

    let remaining = interpreter.gas.remaining();
    let Some(gas_limit) = child_gas_limit(interpreter, remaining) else {
        return;
    };

    let outcome = host.create(CreateInputs {
        caller: interpreter.input.target_address,
        scheme,
        value,
        init_code,
        gas_limit,
    });

    if outcome.result.result.is_fatal() {
        interpreter.halt(InstructionResult::FatalExternalError);
        return;
    }

    return_child_gas(interpreter, &outcome.result);
    // Only a reverted deployment exposes its output.
    interpreter.return_data = if outcome.result.is_revert() {
        outcome.result.output.clone()
    } else {
        Bytes::new()
    };
    let created = match outcome.address {
        Some(address) if outcome.result.is_ok() => address.into_word().into(),
        _ => U256::ZERO,
    };
    push!(interpreter, created);
}
