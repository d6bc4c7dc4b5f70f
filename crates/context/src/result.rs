//! Transaction outcomes and the errors that prevent one.
use crate::journal::JournalError;
use core::fmt::Debug;
use primitives::{Address, Bytes, Log, U256};

/// Result of a transaction execution
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionResult {
    /// Returned successfully
    Success {
        /// How the top frame ended.
        reason: SuccessReason,
        /// Gas used after the refund was applied.
        gas_used: u64,
        /// Refund granted, already capped.
        gas_refunded: u64,
        /// Logs emitted by the transaction, in order.
        logs: Vec<Log>,
        /// Return data, and the new address for deployments.
        output: Output,
    },
    /// Reverted by `REVERT` opcode that doesn't spend all gas
    Revert {
        /// Gas spent up to the revert.
        gas_used: u64,
        /// Revert data.
        output: Bytes,
    },
    /// Halted on an error condition, spending all gas
    Halt {
        /// Why execution halted.
        reason: HaltReason,
        /// Halting will spend all the gas, and will be equal to gas_limit.
        gas_used: u64,
    },
}

impl ExecutionResult {
    /// Returns if transaction execution is successful.
    ///
    /// 1 indicates success, 0 indicates revert.
    ///
    /// <https://eips.ethereum.org/EIPS/eip-658>
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns true if execution result is a Halt.
    pub fn is_halt(&self) -> bool {
        matches!(self, Self::Halt { .. })
    }

    /// Returns true if execution result is a Revert.
    pub fn is_revert(&self) -> bool {
        matches!(self, Self::Revert { .. })
    }

    /// Returns created address if execution is Create transaction
    /// and Contract was created.
    pub fn created_address(&self) -> Option<Address> {
        match self {
            Self::Success { output, .. } => output.address().cloned(),
            _ => None,
        }
    }

    /// Returns the halt reason, if execution halted.
    pub fn halt_reason(&self) -> Option<HaltReason> {
        match self {
            Self::Halt { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Short name of how execution ended: the success reason, `Revert`, or the halt reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Success { reason, .. } => reason.name(),
            Self::Revert { .. } => "Revert",
            Self::Halt { reason, .. } => reason.name(),
        }
    }

    /// Returns the output data of the execution.
    ///
    /// Returns [`None`] if the execution was halted.
    pub fn output(&self) -> Option<&Bytes> {
        match self {
            Self::Success { output, .. } => Some(output.data()),
            Self::Revert { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Consumes the type and returns the output data of the execution.
    ///
    /// Returns [`None`] if the execution was halted.
    pub fn into_output(self) -> Option<Bytes> {
        match self {
            Self::Success { output, .. } => Some(output.into_data()),
            Self::Revert { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Returns the logs if execution is successful, or an empty list otherwise.
    pub fn logs(&self) -> &[Log] {
        match self {
            Self::Success { logs, .. } => logs.as_slice(),
            _ => &[],
        }
    }

    /// Returns the gas used.
    pub fn gas_used(&self) -> u64 {
        match *self {
            Self::Success { gas_used, .. }
            | Self::Revert { gas_used, .. }
            | Self::Halt { gas_used, .. } => gas_used,
        }
    }

    /// Returns the refunded gas, zero unless successful.
    pub fn gas_refunded(&self) -> u64 {
        match *self {
            Self::Success { gas_refunded, .. } => gas_refunded,
            _ => 0,
        }
    }
}

/// Output of a transaction execution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Output {
    /// Return data of a call.
    Call(Bytes),
    /// Deployed code and the address it was deployed at.
    Create(Bytes, Option<Address>),
}

impl Output {
    /// Returns the output data of the execution output.
    pub fn into_data(self) -> Bytes {
        match self {
            Output::Call(data) => data,
            Output::Create(data, _) => data,
        }
    }

    /// Returns the output data of the execution output.
    pub fn data(&self) -> &Bytes {
        match self {
            Output::Call(data) => data,
            Output::Create(data, _) => data,
        }
    }

    /// Returns the created address, if any.
    pub fn address(&self) -> Option<&Address> {
        match self {
            Output::Call(_) => None,
            Output::Create(_, address) => address.as_ref(),
        }
    }
}

/// Reason a successful frame stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SuccessReason {
    /// `STOP` or running off the end of the code.
    Stop,
    /// `RETURN`.
    Return,
}

impl SuccessReason {
    /// Variant name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Stop => "Stop",
            Self::Return => "Return",
        }
    }
}

/// Closed set of reasons a frame halts.
///
/// A halt reverts every change of the frame and consumes all of its gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HaltReason {
    /// Ran out of gas, including intrinsic gas and code deposit.
    OutOfGas,
    /// Memory grown past the configured memory limit.
    MemoryLimitOOG,
    /// Unknown or designated invalid opcode.
    InvalidOpcode,
    /// Popped from an empty stack.
    StackUnderflow,
    /// Pushed onto a full stack.
    StackOverflow,
    /// Jump to a location that is not a `JUMPDEST`.
    InvalidJump,
    /// Memory or return data access out of range.
    OutOfOffset,
    /// State mutation attempted inside a static call.
    StateChangeInStaticContext,
    /// Frame depth limit exceeded.
    CallTooDeep,
    /// Caller balance lower than the transferred value.
    InsufficientBalance,
    /// Recipient balance would overflow.
    OverflowPayment,
    /// Deployed code larger than the code size limit.
    CodeTooLarge,
    /// Deployed code starting with `0xEF`.
    InvalidCodePrefix,
    /// Deployment target already has code or a nonce.
    CreateCollision,
    /// Init code larger than the init code size limit.
    InitCodeTooLarge,
    /// Deployer nonce at its maximum.
    NonceOverflow,
}

impl HaltReason {
    /// Variant name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OutOfGas => "OutOfGas",
            Self::MemoryLimitOOG => "MemoryLimitOOG",
            Self::InvalidOpcode => "InvalidOpcode",
            Self::StackUnderflow => "StackUnderflow",
            Self::StackOverflow => "StackOverflow",
            Self::InvalidJump => "InvalidJump",
            Self::OutOfOffset => "OutOfOffset",
            Self::StateChangeInStaticContext => "StateChangeInStaticContext",
            Self::CallTooDeep => "CallTooDeep",
            Self::InsufficientBalance => "InsufficientBalance",
            Self::OverflowPayment => "OverflowPayment",
            Self::CodeTooLarge => "CodeTooLarge",
            Self::InvalidCodePrefix => "InvalidCodePrefix",
            Self::CreateCollision => "CreateCollision",
            Self::InitCodeTooLarge => "InitCodeTooLarge",
            Self::NonceOverflow => "NonceOverflow",
        }
    }
}

/// Main EVM error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvmError<DBError> {
    /// Transaction validation error
    #[error("transaction validation error: {0}")]
    Transaction(#[from] InvalidTransaction),
    /// Database error
    #[error("database error: {0}")]
    Database(DBError),
    /// Journal invariant violated
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),
}

impl<DBError> EvmError<DBError> {
    /// Maps a `DBError` to a new error type using the provided closure, leaving other variants unchanged.
    pub fn map_db_err<F, E>(self, op: F) -> EvmError<E>
    where
        F: FnOnce(DBError) -> E,
    {
        match self {
            Self::Transaction(e) => EvmError::Transaction(e),
            Self::Database(e) => EvmError::Database(op(e)),
            Self::Journal(e) => EvmError::Journal(e),
        }
    }
}

/// Transaction validation error.
///
/// Raised before the transaction touches any state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InvalidTransaction {
    /// EIP-1559: priority fee is greater than the max fee.
    #[error("priority fee is greater than max fee")]
    PriorityFeeGreaterThanMaxFee,
    /// EIP-1559: `gas_price` is less than `basefee`.
    #[error("gas price is less than basefee")]
    GasPriceLessThanBasefee,
    /// `gas_limit` in the tx is bigger than `block_gas_limit`.
    #[error("caller gas limit exceeds the block gas limit")]
    CallerGasLimitMoreThanBlock,
    /// Caller cannot pay for the maximum gas fee.
    #[error("lack of funds ({balance}) for max fee ({fee})")]
    LackOfFundForMaxFee {
        /// Maximum fee the transaction may be charged.
        fee: Box<U256>,
        /// Caller balance.
        balance: Box<U256>,
    },
    /// Nonce overflows in transaction.
    #[error("nonce overflow in transaction")]
    NonceOverflowInTransaction,
    /// Transaction nonce is higher than the account nonce.
    #[error("nonce {tx} too high, expected {state}")]
    NonceTooHigh {
        /// Transaction nonce.
        tx: u64,
        /// Account nonce.
        state: u64,
    },
    /// Transaction nonce is lower than the account nonce.
    #[error("nonce {tx} too low, expected {state}")]
    NonceTooLow {
        /// Transaction nonce.
        tx: u64,
        /// Account nonce.
        state: u64,
    },
    /// Transaction chain id does not match the configured chain id.
    #[error("invalid chain ID")]
    InvalidChainId,
    /// EIP-3860: init code of a create transaction is too large.
    #[error("create initcode size limit")]
    CreateInitCodeSizeLimit,
    /// EIP-4844: max fee per blob gas is below the block's blob gas price.
    #[error("blob gas price is greater than max fee per blob gas")]
    BlobGasPriceGreaterThanMax,
    /// EIP-4844: blob transactions cannot deploy.
    #[error("blob transaction can't be a create transaction")]
    BlobCreateTransaction,
    /// EIP-4844: too many blobs.
    #[error("too many blobs, have {have}, max {max}")]
    TooManyBlobs {
        /// Blobs in the transaction.
        have: usize,
        /// Maximum allowed.
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitives::bytes;

    #[test]
    fn accessors_follow_variant() {
        let success = ExecutionResult::Success {
            reason: SuccessReason::Return,
            gas_used: 21_000,
            gas_refunded: 0,
            logs: Vec::new(),
            output: Output::Create(bytes!("00"), Some(Address::with_last_byte(1))),
        };
        assert!(success.is_success());
        assert_eq!(success.created_address(), Some(Address::with_last_byte(1)));
        assert_eq!(success.reason(), "Return");

        let revert = ExecutionResult::Revert {
            gas_used: 100,
            output: bytes!("dead"),
        };
        assert!(!revert.is_success() && !revert.is_halt());
        assert_eq!(revert.output(), Some(&bytes!("dead")));

        let halt = ExecutionResult::Halt {
            reason: HaltReason::OutOfGas,
            gas_used: 30_000,
        };
        assert!(halt.is_halt());
        assert_eq!(halt.output(), None);
        assert_eq!(halt.halt_reason(), Some(HaltReason::OutOfGas));
        assert_eq!(halt.reason(), "OutOfGas");
    }

    #[test]
    fn error_messages() {
        let err: EvmError<std::convert::Infallible> = InvalidTransaction::NonceTooLow {
            tx: 1,
            state: 2,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "transaction validation error: nonce 1 too low, expected 2"
        );
    }
}
