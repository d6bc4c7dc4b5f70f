//! Requests an executing frame makes to its host, and what comes back.
mod call_inputs;
mod create_inputs;

pub use call_inputs::{CallInputs, CallScheme, CallValue};
pub use create_inputs::{CreateInputs, CreateScheme};

use crate::{Gas, InstructionResult};
use core::ops::Range;
use primitives::{Address, Bytes};

/// The result of an interpreter operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterpreterResult {
    /// The result of the instruction execution.
    pub result: InstructionResult,
    /// The output of the instruction execution.
    pub output: Bytes,
    /// The gas usage information.
    pub gas: Gas,
}

impl InterpreterResult {
    /// Returns a new `InterpreterResult` with the given values.
    pub fn new(result: InstructionResult, output: Bytes, gas: Gas) -> Self {
        Self {
            result,
            output,
            gas,
        }
    }

    /// Result for a frame that never ran: nothing spent on success, everything spent otherwise.
    pub fn new_with_limit(result: InstructionResult, gas_limit: u64) -> Self {
        let gas = if result.is_ok() {
            Gas::new(gas_limit)
        } else {
            Gas::new_spent(gas_limit)
        };
        Self::new(result, Bytes::new(), gas)
    }

    /// Returns whether the instruction result is a success.
    #[inline]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns whether the instruction result is a revert.
    #[inline]
    pub const fn is_revert(&self) -> bool {
        self.result.is_revert()
    }

    /// Returns whether the instruction result is an error.
    #[inline]
    pub const fn is_error(&self) -> bool {
        self.result.is_error()
    }
}

/// Represents the outcome of a call operation in a virtual machine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallOutcome {
    /// The result of the interpreter's execution, including output data and gas usage
    pub result: InterpreterResult,
    /// The range in memory where the output data is located
    pub memory_offset: Range<usize>,
}

impl CallOutcome {
    /// Constructs a new [`CallOutcome`].
    pub fn new(result: InterpreterResult, memory_offset: Range<usize>) -> Self {
        Self {
            result,
            memory_offset,
        }
    }
}

/// Represents the outcome of a create operation in an interpreter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreateOutcome {
    /// The result of the interpreter operation
    pub result: InterpreterResult,
    /// An optional address associated with the create operation
    pub address: Option<Address>,
}

impl CreateOutcome {
    /// Constructs a new [`CreateOutcome`].
    pub fn new(result: InterpreterResult, address: Option<Address>) -> Self {
        Self { result, address }
    }
}
