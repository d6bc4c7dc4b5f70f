use context::{HaltReason, SuccessReason};

/// Outcome of executing one instruction, or of a whole frame.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstructionResult {
    // success codes
    /// Keep executing.
    #[default]
    Continue = 0x00,
    /// Encountered a `STOP` opcode
    Stop,
    /// Return from the current call.
    Return,

    // revert codes
    /// Revert the transaction.
    Revert = 0x10,

    // error codes
    /// Out of gas error.
    OutOfGas = 0x50,
    /// Memory growth past the configured memory limit.
    MemoryLimitOOG,
    /// Unknown or invalid opcode.
    OpcodeNotFound,
    /// Invalid `0xFE` opcode.
    InvalidFEOpcode,
    /// Opcode not activated in the current hardfork.
    NotActivated,
    /// Stack underflow.
    StackUnderflow,
    /// Stack overflow.
    StackOverflow,
    /// Invalid jump destination.
    InvalidJump,
    /// Out of bounds access to return data.
    OutOfOffset,
    /// State-changing instruction in a static call.
    StateChangeDuringStaticCall,
    /// Call depth exceeded.
    CallTooDeep,
    /// Caller can't cover the transferred value.
    OutOfFunds,
    /// Recipient balance overflow.
    OverflowPayment,
    /// Deployment target already exists.
    CreateCollision,
    /// Deployer nonce overflow.
    NonceOverflow,
    /// Deployed code exceeds the size limit.
    CreateContractSizeLimit,
    /// Deployed code starts with `0xEF`.
    CreateContractStartingWithEF,
    /// EIP-3860: Limit and meter initcode. Initcode size limit exceeded.
    CreateInitCodeSizeLimit,

    /// Fatal external error. Returned by database.
    FatalExternalError,
}

/// Matches every successful [`InstructionResult`].
#[macro_export]
macro_rules! return_ok {
    () => {
        $crate::InstructionResult::Continue
            | $crate::InstructionResult::Stop
            | $crate::InstructionResult::Return
    };
}

/// Matches every reverting [`InstructionResult`].
#[macro_export]
macro_rules! return_revert {
    () => {
        $crate::InstructionResult::Revert
    };
}

impl InstructionResult {
    /// Returns whether the result is a success.
    #[inline]
    pub const fn is_ok(self) -> bool {
        matches!(self, return_ok!())
    }

    /// Returns whether the result is a revert.
    #[inline]
    pub const fn is_revert(self) -> bool {
        matches!(self, return_revert!())
    }

    /// Returns whether the result is an error.
    #[inline]
    pub const fn is_error(self) -> bool {
        !self.is_ok() && !self.is_revert()
    }

    /// Returns `true` for the result recorded when the host failed.
    #[inline]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::FatalExternalError)
    }
}

/// Final classification of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SuccessOrHalt {
    /// Finished successfully.
    Success(SuccessReason),
    /// Reverted.
    Revert,
    /// Halted.
    Halt(HaltReason),
    /// The host failed; the error is parked in the context.
    FatalExternalError,
    /// Still running. Only seen inside the interpreter loop.
    Internal,
}

impl SuccessOrHalt {
    /// Returns true if the transaction returned successfully without halts.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, SuccessOrHalt::Success(_))
    }

    /// Returns true if the transaction reverted.
    #[inline]
    pub fn is_revert(self) -> bool {
        matches!(self, SuccessOrHalt::Revert)
    }

    /// Returns true if the EVM has experienced an exceptional halt
    #[inline]
    pub fn is_halt(self) -> bool {
        matches!(self, SuccessOrHalt::Halt(_))
    }

    /// Returns the [`HaltReason`] value the EVM has experienced an exceptional halt
    #[inline]
    pub fn to_halt(self) -> Option<HaltReason> {
        match self {
            SuccessOrHalt::Halt(halt) => Some(halt),
            _ => None,
        }
    }
}

impl From<InstructionResult> for SuccessOrHalt {
    fn from(result: InstructionResult) -> Self {
        match result {
            InstructionResult::Continue => Self::Internal,
            InstructionResult::Stop => Self::Success(SuccessReason::Stop),
            InstructionResult::Return => Self::Success(SuccessReason::Return),
            InstructionResult::Revert => Self::Revert,
            InstructionResult::OutOfGas => Self::Halt(HaltReason::OutOfGas),
            InstructionResult::MemoryLimitOOG => Self::Halt(HaltReason::MemoryLimitOOG),
            InstructionResult::OpcodeNotFound
            | InstructionResult::InvalidFEOpcode
            | InstructionResult::NotActivated => Self::Halt(HaltReason::InvalidOpcode),
            InstructionResult::StackUnderflow => Self::Halt(HaltReason::StackUnderflow),
            InstructionResult::StackOverflow => Self::Halt(HaltReason::StackOverflow),
            InstructionResult::InvalidJump => Self::Halt(HaltReason::InvalidJump),
            InstructionResult::OutOfOffset => Self::Halt(HaltReason::OutOfOffset),
            InstructionResult::StateChangeDuringStaticCall => {
                Self::Halt(HaltReason::StateChangeInStaticContext)
            }
            InstructionResult::CallTooDeep => Self::Halt(HaltReason::CallTooDeep),
            InstructionResult::OutOfFunds => Self::Halt(HaltReason::InsufficientBalance),
            InstructionResult::OverflowPayment => Self::Halt(HaltReason::OverflowPayment),
            InstructionResult::CreateCollision => Self::Halt(HaltReason::CreateCollision),
            InstructionResult::NonceOverflow => Self::Halt(HaltReason::NonceOverflow),
            InstructionResult::CreateContractSizeLimit => Self::Halt(HaltReason::CodeTooLarge),
            InstructionResult::CreateContractStartingWithEF => {
                Self::Halt(HaltReason::InvalidCodePrefix)
            }
            InstructionResult::CreateInitCodeSizeLimit => {
                Self::Halt(HaltReason::InitCodeTooLarge)
            }
            InstructionResult::FatalExternalError => Self::FatalExternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(InstructionResult::Stop.is_ok());
        assert!(InstructionResult::Revert.is_revert());
        assert!(InstructionResult::OutOfGas.is_error());
        assert!(InstructionResult::FatalExternalError.is_error());
        assert_eq!(
            SuccessOrHalt::from(InstructionResult::NotActivated).to_halt(),
            Some(HaltReason::InvalidOpcode)
        );
        assert_eq!(
            SuccessOrHalt::from(InstructionResult::OutOfFunds).to_halt(),
            Some(HaltReason::InsufficientBalance)
        );
        assert!(SuccessOrHalt::from(InstructionResult::Return).is_success());
    }
}
