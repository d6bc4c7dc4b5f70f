use crate::{gas, Host, Interpreter};
use core::cmp::Ordering;
use primitives::{I256, U256};

pub(crate) fn lt(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = U256::from(op1 < *op2);
}

pub(crate) fn gt(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = U256::from(op1 > *op2);
}

pub(crate) fn slt(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = U256::from(I256::from_raw(op1).cmp(&I256::from_raw(*op2)) == Ordering::Less);
}

pub(crate) fn sgt(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = U256::from(I256::from_raw(op1).cmp(&I256::from_raw(*op2)) == Ordering::Greater);
}

pub(crate) fn eq(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = U256::from(op1 == *op2);
}

pub(crate) fn iszero(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([], op1, interpreter);
    *op1 = U256::from(op1.is_zero());
}

pub(crate) fn bitand(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = op1 & *op2;
}

pub(crate) fn bitor(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = op1 | *op2;
}

pub(crate) fn bitxor(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = op1 ^ *op2;
}

pub(crate) fn not(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([], op1, interpreter);
    *op1 = !*op1;
}

pub(crate) fn byte(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    let o1 = as_usize_saturated!(op1);
    *op2 = if o1 < 32 {
        // `31 - o1` because `byte` returns LE, while we want BE
        U256::from(op2.byte(31 - o1))
    } else {
        U256::ZERO
    };
}

/// EIP-145: Bitwise shifting instructions in EVM
pub(crate) fn shl(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    check!(interpreter, PETERSBURG);
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    let shift = as_usize_saturated!(op1);
    *op2 = if shift < 256 {
        *op2 << shift
    } else {
        U256::ZERO
    };
}

/// EIP-145: Bitwise shifting instructions in EVM
pub(crate) fn shr(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    check!(interpreter, PETERSBURG);
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    let shift = as_usize_saturated!(op1);
    *op2 = if shift < 256 {
        *op2 >> shift
    } else {
        U256::ZERO
    };
}

/// EIP-145: Bitwise shifting instructions in EVM
pub(crate) fn sar(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    check!(interpreter, PETERSBURG);
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    let shift = as_usize_saturated!(op1).min(255);
    *op2 = I256::from_raw(*op2).asr(shift).into_raw();
}
