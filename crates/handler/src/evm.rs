//! The transaction driver.
use crate::{frame::Frame, post_execution, pre_execution, validation, FrameResult};
use context::{Context, EvmError, ExecutionResult, JournalCheckpoint};
use database_interface::{Database, DatabaseMut};
use derive_where::derive_where;
use inspector::{inspectors::NoOpInspector, Inspector};
use interpreter::{
    CallInputs, CallOutcome, CallScheme, CallValue, CreateInputs, CreateOutcome, CreateScheme,
    EthInterpreter, Gas, InstructionExecutor, InstructionResult, InterpreterResult,
};
use primitives::TxKind;
use tracing::{trace, warn};

/// Executes the transaction held in its context's environment.
///
/// Every transaction runs inside a journal checkpoint: it is committed once a result is built
/// and reverted when an error is returned, so a failed transaction leaves no trace.
#[derive_where(Debug; DB, <DB as Database>::Error, INSP, EXEC)]
pub struct Evm<DB: Database, INSP = NoOpInspector, EXEC = EthInterpreter> {
    /// Environment, journal and database.
    pub ctx: Context<DB>,
    /// Receives execution callbacks.
    pub inspector: INSP,
    /// Runs the code of every frame.
    pub executor: EXEC,
}

impl<DB: DatabaseMut> Evm<DB> {
    /// Creates an EVM with the bundled interpreter and no inspector.
    pub fn new(ctx: Context<DB>) -> Self {
        Self {
            ctx,
            inspector: NoOpInspector,
            executor: EthInterpreter,
        }
    }
}

impl<DB, INSP, EXEC> Evm<DB, INSP, EXEC>
where
    DB: DatabaseMut,
    INSP: Inspector,
    EXEC: InstructionExecutor,
{
    /// Creates an EVM from its parts.
    pub fn new_with(ctx: Context<DB>, inspector: INSP, executor: EXEC) -> Self {
        Self {
            ctx,
            inspector,
            executor,
        }
    }

    /// Replaces the inspector.
    pub fn with_inspector<I: Inspector>(self, inspector: I) -> Evm<DB, I, EXEC> {
        Evm {
            ctx: self.ctx,
            inspector,
            executor: self.executor,
        }
    }

    /// Executes the transaction. Its changes stay in the journal and can be reverted through an
    /// enclosing checkpoint.
    pub fn transact(&mut self) -> Result<ExecutionResult, EvmError<DB::Error>> {
        self.transact_inner(false)
    }

    /// Executes the transaction with state changes forbidden.
    pub fn transact_static(&mut self) -> Result<ExecutionResult, EvmError<DB::Error>> {
        self.transact_inner(true)
    }

    /// Executes the transaction and ends it for good: the journal is finalized afterwards and
    /// nothing can be reverted anymore.
    pub fn transact_commit(&mut self) -> Result<ExecutionResult, EvmError<DB::Error>> {
        let result = self.transact()?;
        self.ctx.journal.finalize();
        Ok(result)
    }

    fn transact_inner(&mut self, is_static: bool) -> Result<ExecutionResult, EvmError<DB::Error>> {
        validation::validate_env(&self.ctx.env)?;
        let initial_gas = validation::initial_tx_gas(&self.ctx.env);

        self.ctx.journal.begin_transaction();
        let checkpoint = self.ctx.journal.checkpoint();
        let result = match self.execute(checkpoint, initial_gas, is_static) {
            Ok(result) => result,
            Err(error) => return Err(self.abort(checkpoint, error)),
        };
        self.ctx.journal.checkpoint_commit(checkpoint)?;

        self.inspector.transaction_end(&result, &self.ctx.env);
        Ok(result)
    }

    /// Undoes an errored transaction. The error that stopped it is the one reported unless the
    /// revert itself fails.
    fn abort(
        &mut self,
        checkpoint: JournalCheckpoint,
        error: EvmError<DB::Error>,
    ) -> EvmError<DB::Error> {
        match self.ctx.journal.checkpoint_revert(checkpoint) {
            Ok(()) => error,
            Err(revert_error) => {
                warn!(
                    target: "simevm::journal",
                    %error,
                    %revert_error,
                    "failed to revert errored transaction"
                );
                revert_error.into()
            }
        }
    }

    fn execute(
        &mut self,
        checkpoint: JournalCheckpoint,
        initial_gas: u64,
        is_static: bool,
    ) -> Result<ExecutionResult, EvmError<DB::Error>> {
        pre_execution::load_accounts(&mut self.ctx)?;
        pre_execution::validate_against_state_and_deduct_caller(&mut self.ctx)?;

        let gas_limit = self.ctx.env.tx.gas_limit;
        let frame_result = match gas_limit.checked_sub(initial_gas) {
            Some(frame_gas) => self.first_frame(frame_gas, is_static),
            None => self.unexecuted_frame(InstructionResult::OutOfGas),
        };
        self.ctx.take_error()?;

        let mut gas = transaction_gas(gas_limit, &frame_result);
        post_execution::refund(self.ctx.spec(), &mut gas);
        post_execution::reimburse_caller(&mut self.ctx, &gas)?;
        post_execution::reward_beneficiary(&mut self.ctx, &gas)?;

        let logs = self
            .ctx
            .journal
            .logs()
            .get(checkpoint.log_i..)
            .unwrap_or_default()
            .to_vec();
        Ok(post_execution::output(&frame_result, &gas, logs))
    }

    fn first_frame(&mut self, gas_limit: u64, is_static: bool) -> FrameResult {
        let tx = &self.ctx.env.tx;
        trace!(
            target: "simevm::frame",
            caller = %tx.caller,
            kind = ?tx.kind,
            gas_limit,
            "transaction"
        );
        let kind = tx.kind;
        match kind {
            TxKind::Call(target) => {
                let inputs = CallInputs {
                    input: tx.data.clone(),
                    return_memory_offset: 0..0,
                    gas_limit,
                    bytecode_address: target,
                    target_address: target,
                    caller: tx.caller,
                    value: CallValue::Transfer(tx.value),
                    scheme: CallScheme::Call,
                    is_static,
                };
                let mut frame = Frame::new(
                    &mut self.ctx,
                    &mut self.inspector,
                    &self.executor,
                    0,
                    is_static,
                );
                FrameResult::Call(frame.run_call(inputs))
            }
            TxKind::Create if is_static => {
                self.unexecuted_frame(InstructionResult::StateChangeDuringStaticCall)
            }
            TxKind::Create => {
                let scheme = match tx.salt {
                    Some(salt) => CreateScheme::Create2 { salt },
                    None => CreateScheme::Create,
                };
                let inputs = CreateInputs {
                    caller: tx.caller,
                    scheme,
                    value: tx.value,
                    init_code: tx.data.clone(),
                    gas_limit,
                };
                let mut frame =
                    Frame::new(&mut self.ctx, &mut self.inspector, &self.executor, 0, false);
                FrameResult::Create(frame.run_create(inputs))
            }
        }
    }

    /// Result of a first frame that never ran.
    fn unexecuted_frame(&self, result: InstructionResult) -> FrameResult {
        let result = InterpreterResult::new_with_limit(result, 0);
        if self.ctx.env.tx.is_create() {
            FrameResult::Create(CreateOutcome::new(result, None))
        } else {
            FrameResult::Call(CallOutcome::new(result, 0..0))
        }
    }
}

/// Gas of the whole transaction, given how its first frame ended.
///
/// A halt consumes everything the transaction paid for. Refunds only count on success.
fn transaction_gas(gas_limit: u64, result: &FrameResult) -> Gas {
    let mut gas = Gas::new_spent(gas_limit);
    let frame = result.interpreter_result();
    if !frame.is_error() {
        gas.erase_cost(frame.gas.remaining());
    }
    if frame.is_ok() {
        gas.record_refund(frame.gas.refunded());
    }
    gas
}

#[cfg(test)]
mod tests {
    use super::*;
    use context::{Env, HaltReason, InvalidTransaction, JournalError, Output, SuccessReason};
    use database::AccountStore;
    use interpreter::opcode::*;
    use primitives::{address, Address, Bytes, U256};
    use state::{AccountInfo, Bytecode};

    const CALLER: Address = address!("0x1000000000000000000000000000000000000001");
    const TARGET: Address = address!("0x2000000000000000000000000000000000000002");

    fn evm(code: &[u8]) -> Evm<AccountStore> {
        let mut db = AccountStore::new();
        db.insert_account_info(CALLER, AccountInfo::from_balance(U256::from(1_000_000)));
        if !code.is_empty() {
            db.insert_account_info(
                TARGET,
                AccountInfo::default().with_code(Bytecode::new_raw(Bytes::copy_from_slice(code))),
            );
        }
        let mut env = Env::default();
        env.tx.caller = CALLER;
        env.tx.kind = TxKind::Call(TARGET);
        env.tx.gas_limit = 100_000;
        Evm::new(Context::new(env, db))
    }

    fn balance(evm: &mut Evm<AccountStore>, address: Address) -> U256 {
        evm.ctx.journal.peek_account(address).unwrap().balance
    }

    #[test]
    fn value_transfer_pays_fee() {
        let mut evm = evm(&[]);
        evm.ctx.env.tx.value = U256::from(10_000);
        evm.ctx.env.tx.gas_price = 2;

        let result = evm.transact().unwrap();
        assert_eq!(
            result,
            ExecutionResult::Success {
                reason: SuccessReason::Stop,
                gas_used: 21_000,
                gas_refunded: 0,
                logs: Vec::new(),
                output: Output::Call(Bytes::new()),
            }
        );
        assert_eq!(balance(&mut evm, TARGET), U256::from(10_000));
        assert_eq!(
            balance(&mut evm, CALLER),
            U256::from(1_000_000 - 10_000 - 21_000 * 2)
        );
        assert_eq!(evm.ctx.journal.peek_account(CALLER).unwrap().nonce, 1);
        assert_eq!(evm.ctx.journal.depth(), 0);
    }

    #[test]
    fn abort_reports_a_failed_revert() {
        let mut evm = evm(&[]);
        let checkpoint = evm.ctx.journal.checkpoint();
        evm.ctx.journal.set_balance(CALLER, U256::ZERO).unwrap();
        evm.ctx.journal.checkpoint_commit(checkpoint).unwrap();

        let error = evm.abort(checkpoint, InvalidTransaction::InvalidChainId.into());
        assert!(matches!(
            error,
            EvmError::Journal(JournalError::InvalidCheckpoint { .. })
        ));

        let checkpoint = evm.ctx.journal.checkpoint();
        evm.ctx.journal.set_balance(CALLER, U256::from(7)).unwrap();
        let error = evm.abort(checkpoint, InvalidTransaction::InvalidChainId.into());
        assert!(matches!(
            error,
            EvmError::Transaction(InvalidTransaction::InvalidChainId)
        ));
        assert_eq!(balance(&mut evm, CALLER), U256::ZERO);
    }

    #[test]
    fn intrinsic_gas_shortfall_consumes_limit() {
        let mut evm = evm(&[]);
        evm.ctx.env.tx.gas_limit = 20_000;
        evm.ctx.env.tx.gas_price = 1;

        let result = evm.transact().unwrap();
        assert_eq!(
            result,
            ExecutionResult::Halt {
                reason: HaltReason::OutOfGas,
                gas_used: 20_000,
            }
        );
        assert_eq!(balance(&mut evm, CALLER), U256::from(1_000_000 - 20_000));
    }

    #[test]
    fn value_above_balance_halts() {
        let mut evm = evm(&[]);
        evm.ctx.env.tx.value = U256::from(1_000_001);

        let result = evm.transact().unwrap();
        assert_eq!(result.halt_reason(), Some(HaltReason::InsufficientBalance));
        assert_eq!(result.gas_used(), 100_000);
        assert_eq!(balance(&mut evm, CALLER), U256::from(1_000_000));
        assert_eq!(balance(&mut evm, TARGET), U256::ZERO);
    }

    #[test]
    fn invalid_transaction_leaves_no_trace() {
        let mut evm = evm(&[]);
        evm.ctx.env.tx.gas_price = 100;
        let len = evm.ctx.journal.len();

        assert_eq!(
            evm.transact(),
            Err(EvmError::Transaction(
                InvalidTransaction::LackOfFundForMaxFee {
                    fee: Box::new(U256::from(10_000_000)),
                    balance: Box::new(U256::from(1_000_000)),
                }
            ))
        );
        assert_eq!(evm.ctx.journal.len(), len);
        assert_eq!(evm.ctx.journal.depth(), 0);
    }

    #[test]
    fn revert_returns_data_and_undoes_storage() {
        // PUSH1 1 PUSH1 0 SSTORE PUSH1 0xaa PUSH1 0 MSTORE8 PUSH1 1 PUSH1 0 REVERT
        let mut evm = evm(&[
            PUSH1, 1, PUSH1, 0, SSTORE, PUSH1, 0xaa, PUSH1, 0, MSTORE8, PUSH1, 1, PUSH1, 0, REVERT,
        ]);
        let result = evm.transact().unwrap();
        assert!(result.is_revert());
        assert_eq!(result.output(), Some(&Bytes::from(vec![0xaa])));
        assert!(result.gas_used() < 100_000);
        assert_eq!(
            evm.ctx.journal.sload(TARGET, U256::ZERO).unwrap().data,
            U256::ZERO
        );
    }

    #[test]
    fn static_transaction_rejects_writes() {
        // PUSH1 1 PUSH1 0 SSTORE
        let mut evm = evm(&[PUSH1, 1, PUSH1, 0, SSTORE]);
        let result = evm.transact_static().unwrap();
        assert_eq!(
            result.halt_reason(),
            Some(HaltReason::StateChangeInStaticContext)
        );
    }

    #[test]
    fn create_transaction_deploys() {
        let mut evm = evm(&[]);
        evm.ctx.env.tx.kind = TxKind::Create;
        // PUSH1 2 PUSH1 0 RETURN
        evm.ctx.env.tx.data = Bytes::from(vec![PUSH1, 2, PUSH1, 0, RETURN]);

        let result = evm.transact_commit().unwrap();
        let address = CALLER.create(0);
        assert_eq!(result.created_address(), Some(address));
        assert_eq!(
            evm.ctx.journal.load_code(address).unwrap().data.len(),
            2
        );
        assert_eq!(evm.ctx.journal.peek_account(CALLER).unwrap().nonce, 1);
        assert!(evm.ctx.journal.is_empty());
    }
}
