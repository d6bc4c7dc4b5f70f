//! Transaction and block environment instructions.

use crate::{gas, Host, Interpreter};
use primitives::{hardfork::SpecId, U256};

pub(crate) fn origin(interpreter: &mut Interpreter, host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    push!(interpreter, host.env().tx.caller.into_word().into());
}

pub(crate) fn gasprice(interpreter: &mut Interpreter, host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    push!(interpreter, U256::from(host.env().effective_gas_price()));
}

pub(crate) fn coinbase(interpreter: &mut Interpreter, host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    push!(interpreter, host.env().block.beneficiary.into_word().into());
}

pub(crate) fn timestamp(interpreter: &mut Interpreter, host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    push!(interpreter, U256::from(host.env().block.timestamp));
}

pub(crate) fn block_number(interpreter: &mut Interpreter, host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    push!(interpreter, U256::from(host.env().block.number));
}

/// `DIFFICULTY` before the merge, `PREVRANDAO` after it.
pub(crate) fn difficulty(interpreter: &mut Interpreter, host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    let block = &host.env().block;
    let value = if interpreter.spec_id.is_enabled_in(SpecId::MERGE) {
        block.prevrandao.map(Into::<U256>::into).unwrap_or_default()
    } else {
        block.difficulty
    };
    push!(interpreter, value);
}

pub(crate) fn gaslimit(interpreter: &mut Interpreter, host: &mut dyn Host) {
    gas!(interpreter, gas::BASE);
    push!(interpreter, U256::from(host.env().block.gas_limit));
}

/// EIP-1344: ChainID opcode
pub(crate) fn chainid(interpreter: &mut Interpreter, host: &mut dyn Host) {
    check!(interpreter, ISTANBUL);
    gas!(interpreter, gas::BASE);
    push!(interpreter, U256::from(host.env().cfg.chain_id));
}

/// EIP-3198: BASEFEE opcode
pub(crate) fn basefee(interpreter: &mut Interpreter, host: &mut dyn Host) {
    check!(interpreter, LONDON);
    gas!(interpreter, gas::BASE);
    push!(interpreter, U256::from(host.env().block.basefee));
}

/// EIP-4844: Shard Blob Transactions
pub(crate) fn blob_hash(interpreter: &mut Interpreter, host: &mut dyn Host) {
    check!(interpreter, CANCUN);
    gas!(interpreter, gas::VERYLOW);
    popn_top!([], index, interpreter);
    let i = as_usize_saturated!(*index);
    *index = host
        .env()
        .tx
        .blob_hashes
        .get(i)
        .map(|hash| U256::from_be_bytes(hash.0))
        .unwrap_or_default();
}

/// EIP-7516: BLOBBASEFEE opcode
pub(crate) fn blob_basefee(interpreter: &mut Interpreter, host: &mut dyn Host) {
    check!(interpreter, CANCUN);
    gas!(interpreter, gas::BASE);
    push!(
        interpreter,
        U256::from(host.env().block.blob_gasprice().unwrap_or_default())
    );
}
