//! Settlement after the first frame returned: refund, reimbursement, beneficiary reward and the
//! final [`ExecutionResult`].
use crate::FrameResult;
use context::{Context, EvmError, ExecutionResult, HaltReason};
use database_interface::DatabaseMut;
use interpreter::{Gas, SuccessOrHalt};
use primitives::{hardfork::SpecId, Log, U256};

/// Caps the refund of a finished transaction.
///
/// If spec is set to london, the maximum refund is a fifth of the gas spent. Before london it
/// was half.
pub fn refund(spec: SpecId, gas: &mut Gas) {
    gas.set_final_refund(spec.is_enabled_in(SpecId::LONDON));
}

/// Returns the unspent and refunded gas to the caller at the effective gas price.
pub fn reimburse_caller<DB: DatabaseMut>(
    ctx: &mut Context<DB>,
    gas: &Gas,
) -> Result<(), EvmError<DB::Error>> {
    let caller = ctx.env.tx.caller;
    let effective_gas_price = ctx.env.effective_gas_price();
    let reimbursed = U256::from(effective_gas_price)
        .saturating_mul(U256::from(gas.remaining() + gas.refunded() as u64));
    if reimbursed.is_zero() {
        return Ok(());
    }

    let balance = ctx
        .journal
        .load_account(caller)
        .map_err(EvmError::Database)?
        .data
        .balance;
    ctx.journal
        .set_balance(caller, balance.saturating_add(reimbursed))
        .map_err(EvmError::Database)
}

/// Pays the block beneficiary for the gas used.
///
/// EIP-1559 burns the base fee: from london only the priority part is paid out.
pub fn reward_beneficiary<DB: DatabaseMut>(
    ctx: &mut Context<DB>,
    gas: &Gas,
) -> Result<(), EvmError<DB::Error>> {
    let beneficiary = ctx.env.block.beneficiary;
    let basefee = ctx.env.block.basefee as u128;
    let effective_gas_price = ctx.env.effective_gas_price();
    let coinbase_gas_price = if ctx.spec().is_enabled_in(SpecId::LONDON) {
        effective_gas_price.saturating_sub(basefee)
    } else {
        effective_gas_price
    };
    let reward = U256::from(coinbase_gas_price)
        .saturating_mul(U256::from(gas.spent() - gas.refunded() as u64));
    if reward.is_zero() {
        return Ok(());
    }

    let balance = ctx
        .journal
        .load_account(beneficiary)
        .map_err(EvmError::Database)?
        .data
        .balance;
    ctx.journal
        .set_balance(beneficiary, balance.saturating_add(reward))
        .map_err(EvmError::Database)
}

/// Builds the transaction result from the first frame and the transaction gas.
pub fn output(result: &FrameResult, gas: &Gas, logs: Vec<Log>) -> ExecutionResult {
    // Used gas with refund calculated.
    let gas_refunded = gas.refunded() as u64;
    let gas_used = gas.spent() - gas_refunded;
    let output = result.output();

    match SuccessOrHalt::from(result.interpreter_result().result) {
        SuccessOrHalt::Success(reason) => ExecutionResult::Success {
            reason,
            gas_used,
            gas_refunded,
            logs,
            output,
        },
        SuccessOrHalt::Revert => ExecutionResult::Revert {
            gas_used,
            output: output.into_data(),
        },
        SuccessOrHalt::Halt(reason) => ExecutionResult::Halt { reason, gas_used },
        // A fatal result carries its error in the context, which is returned before this point.
        SuccessOrHalt::FatalExternalError | SuccessOrHalt::Internal => ExecutionResult::Halt {
            reason: HaltReason::OutOfGas,
            gas_used,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use context::{Env, Output, SuccessReason};
    use database::AccountStore;
    use interpreter::{CallOutcome, InstructionResult, InterpreterResult};
    use primitives::{address, bytes, Address};
    use state::AccountInfo;

    const CALLER: Address = address!("0x1000000000000000000000000000000000000001");
    const COINBASE: Address = address!("0x00000000000000000000000000000000000c0ffe");

    fn spent_gas(limit: u64, spent: u64, refund: i64) -> Gas {
        let mut gas = Gas::new(limit);
        assert!(gas.record_cost(spent));
        gas.record_refund(refund);
        gas
    }

    #[test]
    fn refund_is_capped() {
        let mut gas = spent_gas(100_000, 50_000, 20_000);
        refund(SpecId::LONDON, &mut gas);
        assert_eq!(gas.refunded(), 10_000);

        let mut gas = spent_gas(100_000, 50_000, 20_000);
        refund(SpecId::BERLIN, &mut gas);
        assert_eq!(gas.refunded(), 20_000);
    }

    #[test]
    fn reimburse_and_reward() {
        let mut env = Env::new_with_spec(SpecId::CANCUN);
        env.tx.caller = CALLER;
        env.tx.gas_price = 10;
        env.block.basefee = 4;
        env.block.beneficiary = COINBASE;
        let mut db = AccountStore::new();
        db.insert_account_info(CALLER, AccountInfo::from_balance(U256::from(1_000)));
        let mut ctx = Context::new(env, db);

        // 30 gas left, 70 spent of which 10 refunded
        let gas = spent_gas(100, 70, 10);
        reimburse_caller(&mut ctx, &gas).unwrap();
        reward_beneficiary(&mut ctx, &gas).unwrap();

        assert_eq!(
            ctx.journal.peek_account(CALLER).unwrap().balance,
            U256::from(1_000 + 40 * 10)
        );
        assert_eq!(
            ctx.journal.peek_account(COINBASE).unwrap().balance,
            U256::from(60 * 6)
        );
    }

    #[test]
    fn output_follows_result() {
        let gas = spent_gas(1_000, 600, 100);
        let frame = |result| {
            FrameResult::Call(CallOutcome::new(
                InterpreterResult::new(result, bytes!("beef"), Gas::new(0)),
                0..0,
            ))
        };

        assert_eq!(
            output(&frame(InstructionResult::Return), &gas, Vec::new()),
            ExecutionResult::Success {
                reason: SuccessReason::Return,
                gas_used: 500,
                gas_refunded: 100,
                logs: Vec::new(),
                output: Output::Call(bytes!("beef")),
            }
        );
        assert_eq!(
            output(&frame(InstructionResult::Revert), &gas, Vec::new()),
            ExecutionResult::Revert {
                gas_used: 500,
                output: bytes!("beef"),
            }
        );
        assert_eq!(
            output(&frame(InstructionResult::StackUnderflow), &gas, Vec::new()),
            ExecutionResult::Halt {
                reason: HaltReason::StackUnderflow,
                gas_used: 500,
            }
        );
    }
}
