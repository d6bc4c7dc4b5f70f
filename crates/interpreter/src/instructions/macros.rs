//! Utility macros to help implementing opcode instruction functions.

/// Fails the instruction if the current call is static.
macro_rules! require_non_staticcall {
    ($interpreter:expr) => {
        if $interpreter.input.is_static {
            $interpreter.halt($crate::InstructionResult::StateChangeDuringStaticCall);
            return;
        }
    };
}

/// Check if the hardfork is enabled, and fail the instruction if it is not.
macro_rules! check {
    ($interpreter:expr, $min:ident) => {
        if !$interpreter
            .spec_id
            .is_enabled_in(primitives::hardfork::SpecId::$min)
        {
            $interpreter.halt($crate::InstructionResult::NotActivated);
            return;
        }
    };
}

/// Records a `gas` cost and fails the instruction if it would exceed the available gas.
macro_rules! gas {
    ($interpreter:expr, $gas:expr) => {
        if !$interpreter.gas.record_cost($gas) {
            $interpreter.halt($crate::InstructionResult::OutOfGas);
            return;
        }
    };
}

/// Same as [`gas!`], but with `gas` as an option.
macro_rules! gas_or_fail {
    ($interpreter:expr, $gas:expr) => {
        match $gas {
            Some(gas_used) => gas!($interpreter, gas_used),
            None => {
                $interpreter.halt($crate::InstructionResult::OutOfGas);
                return;
            }
        }
    };
}

/// Resizes the interpreter memory if necessary. Fails the instruction if the gas limit is
/// exceeded.
macro_rules! resize_memory {
    ($interpreter:expr, $offset:expr, $len:expr) => {
        if !$interpreter.resize_memory($offset, $len) {
            return;
        }
    };
}

/// Pops n values from the stack. Fails the instruction if n values can't be popped.
macro_rules! popn {
    ([ $($x:ident),* ], $interpreter:expr) => {
        let Some([$( $x ),*]) = $interpreter.stack.popn() else {
            $interpreter.halt($crate::InstructionResult::StackUnderflow);
            return;
        };
    };
}

/// Pops n values from the stack and returns the top value. Fails the instruction if n values
/// can't be popped.
macro_rules! popn_top {
    ([ $($x:ident),* ], $top:ident, $interpreter:expr) => {
        let Some(([$( $x ),*], $top)) = $interpreter.stack.popn_top() else {
            $interpreter.halt($crate::InstructionResult::StackUnderflow);
            return;
        };
    };
}

/// Pushes a value onto the stack. Fails the instruction if the stack is full.
macro_rules! push {
    ($interpreter:expr, $x:expr) => {
        if !($interpreter.stack.push($x)) {
            $interpreter.halt($crate::InstructionResult::StackOverflow);
            return;
        }
    };
}

/// Converts a `U256` value to a `u64`, saturating to `MAX` if the value is too large.
macro_rules! as_u64_saturated {
    ($v:expr) => {{
        let x = $v.as_limbs();
        if (x[1] == 0) & (x[2] == 0) & (x[3] == 0) {
            x[0]
        } else {
            u64::MAX
        }
    }};
}

/// Converts a `U256` value to a `usize`, saturating to `MAX` if the value is too large.
macro_rules! as_usize_saturated {
    ($v:expr) => {
        usize::try_from(as_u64_saturated!($v)).unwrap_or(usize::MAX)
    };
}

/// Converts a `U256` value to a `usize`, failing the instruction if the value is too large.
macro_rules! as_usize_or_fail {
    ($interpreter:expr, $v:expr) => {
        as_usize_or_fail!($interpreter, $v, $crate::InstructionResult::OutOfGas)
    };
    ($interpreter:expr, $v:expr, $reason:expr) => {{
        let x = $v.as_limbs();
        if x[1] != 0 || x[2] != 0 || x[3] != 0 {
            $interpreter.halt($reason);
            return;
        }
        let Ok(v) = usize::try_from(x[0]) else {
            $interpreter.halt($reason);
            return;
        };
        v
    }};
}

/// Unwraps a host result, halting the frame when the host refuses.
macro_rules! host_or_fail {
    ($interpreter:expr, $e:expr) => {
        match $e {
            Ok(v) => v,
            Err($crate::HostError::StateChangeInStaticContext) => {
                $interpreter.halt($crate::InstructionResult::StateChangeDuringStaticCall);
                return;
            }
            Err($crate::HostError::Fatal) => {
                $interpreter.halt($crate::InstructionResult::FatalExternalError);
                return;
            }
        }
    };
}
