use crate::{gas, Host, Interpreter};
use primitives::{I256, U256};

pub(crate) fn add(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = op1.wrapping_add(*op2);
}

pub(crate) fn mul(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::LOW);
    popn_top!([op1], op2, interpreter);
    *op2 = op1.wrapping_mul(*op2);
}

pub(crate) fn sub(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::VERYLOW);
    popn_top!([op1], op2, interpreter);
    *op2 = op1.wrapping_sub(*op2);
}

pub(crate) fn div(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::LOW);
    popn_top!([op1], op2, interpreter);
    *op2 = op1.checked_div(*op2).unwrap_or_default();
}

pub(crate) fn sdiv(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::LOW);
    popn_top!([op1], op2, interpreter);
    *op2 = if op2.is_zero() {
        U256::ZERO
    } else {
        I256::from_raw(op1)
            .wrapping_div(I256::from_raw(*op2))
            .into_raw()
    };
}

pub(crate) fn rem(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::LOW);
    popn_top!([op1], op2, interpreter);
    *op2 = op1.checked_rem(*op2).unwrap_or_default();
}

pub(crate) fn smod(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::LOW);
    popn_top!([op1], op2, interpreter);
    *op2 = if op2.is_zero() {
        U256::ZERO
    } else {
        I256::from_raw(op1)
            .wrapping_rem(I256::from_raw(*op2))
            .into_raw()
    };
}

pub(crate) fn addmod(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::MID);
    popn_top!([op1, op2], op3, interpreter);
    *op3 = op1.add_mod(op2, *op3);
}

pub(crate) fn mulmod(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::MID);
    popn_top!([op1, op2], op3, interpreter);
    *op3 = op1.mul_mod(op2, *op3);
}

pub(crate) fn exp(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    popn!([base, power], interpreter);
    gas_or_fail!(interpreter, gas::exp_cost(interpreter.spec_id, power));
    push!(interpreter, base.pow(power));
}

/// Extends the sign of the byte at index `op1` (counted from the least significant end) of `op2`.
pub(crate) fn signextend(interpreter: &mut Interpreter, _host: &mut dyn Host) {
    gas!(interpreter, gas::LOW);
    popn_top!([ext], x, interpreter);
    if ext < U256::from(31) {
        let bit_index = (8 * ext.as_limbs()[0] + 7) as usize;
        let bit = x.bit(bit_index);
        let mask = (U256::from(1) << bit_index) - U256::from(1);
        *x = if bit { *x | !mask } else { *x & mask };
    }
}
