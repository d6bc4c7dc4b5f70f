//! Call and create frames.
//!
//! A [`Frame`] is the [`Host`] one executing frame talks to. Nested calls and deployments build a
//! child frame one level deeper and recurse, so the Rust call stack mirrors the frame stack and
//! every checkpoint is resolved before its frame returns.
use context::{
    Context, ContextError, Env, JournalCheckpoint, Output, SStoreResult, StateLoad,
    TransferError,
};
use database_interface::{Database, DatabaseMut};
use inspector::Inspector;
use interpreter::{
    gas, CallInputs, CallOutcome, CallValue, CreateInputs, CreateOutcome, Gas, Host, HostError,
    InstructionExecutor, InstructionResult, Interpreter, InterpreterInput, InterpreterResult,
};
use primitives::{hardfork::SpecId, Address, Bytes, Log, StorageKey, StorageValue, B256};
use state::{AccountInfo, Bytecode};
use tracing::{trace, warn};

/// Host of one executing frame.
pub struct Frame<'a, DB: DatabaseMut, INSP, EXEC> {
    ctx: &'a mut Context<DB>,
    inspector: &'a mut INSP,
    executor: &'a EXEC,
    depth: usize,
    is_static: bool,
}

impl<DB: DatabaseMut, INSP, EXEC> core::fmt::Debug for Frame<'_, DB, INSP, EXEC> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Frame")
            .field("depth", &self.depth)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

impl<'a, DB, INSP, EXEC> Frame<'a, DB, INSP, EXEC>
where
    DB: DatabaseMut,
    INSP: Inspector,
    EXEC: InstructionExecutor,
{
    /// Creates the frame at `depth`. The transaction's first frame is at depth zero.
    pub fn new(
        ctx: &'a mut Context<DB>,
        inspector: &'a mut INSP,
        executor: &'a EXEC,
        depth: usize,
        is_static: bool,
    ) -> Self {
        Self {
            ctx,
            inspector,
            executor,
            depth,
            is_static,
        }
    }

    /// Depth of this frame.
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn child(&mut self, is_static: bool) -> Frame<'_, DB, INSP, EXEC> {
        Frame {
            ctx: &mut *self.ctx,
            inspector: &mut *self.inspector,
            executor: self.executor,
            depth: self.depth + 1,
            is_static,
        }
    }

    /// Parks a database error in the context and reports the host as failed.
    fn fatal(&mut self, error: DB::Error) -> HostError {
        warn!(target: "simevm::frame", %error, depth = self.depth, "database error");
        self.ctx.set_error(ContextError::Db(error));
        HostError::Fatal
    }

    fn too_deep(&self) -> bool {
        self.depth > self.ctx.env.cfg.call_stack_limit
    }

    /// Runs a message call to completion.
    ///
    /// The call's changes are kept on success and reverted otherwise.
    pub fn run_call(&mut self, inputs: CallInputs) -> CallOutcome {
        trace!(
            target: "simevm::frame",
            depth = self.depth,
            caller = %inputs.caller,
            target = %inputs.target_address,
            gas_limit = inputs.gas_limit,
            is_static = inputs.is_static,
            "call"
        );
        let memory_offset = inputs.return_memory_offset.clone();
        let result = self.call_inner(inputs);
        trace!(
            target: "simevm::frame",
            depth = self.depth,
            result = ?result.result,
            gas_remaining = result.gas.remaining(),
            "call done"
        );
        CallOutcome::new(result, memory_offset)
    }

    fn call_inner(&mut self, inputs: CallInputs) -> InterpreterResult {
        let gas_limit = inputs.gas_limit;
        let return_result = |result: InstructionResult| {
            InterpreterResult::new(result, Bytes::new(), Gas::new(gas_limit))
        };

        if self.too_deep() {
            return return_result(InstructionResult::CallTooDeep);
        }

        let checkpoint = self.ctx.journal.checkpoint();

        if let CallValue::Transfer(value) = inputs.value {
            match self
                .ctx
                .journal
                .transfer(inputs.caller, inputs.target_address, value)
            {
                Ok(None) => {}
                Ok(Some(error)) => {
                    self.revert(checkpoint);
                    return return_result(transfer_error_result(error));
                }
                Err(error) => {
                    let _ = self.fatal(error);
                    self.revert(checkpoint);
                    return InterpreterResult::new_with_limit(
                        InstructionResult::FatalExternalError,
                        gas_limit,
                    );
                }
            }
        }

        let bytecode = match self.ctx.journal.load_code(inputs.bytecode_address) {
            Ok(code) => code.data,
            Err(error) => {
                let _ = self.fatal(error);
                self.revert(checkpoint);
                return InterpreterResult::new_with_limit(
                    InstructionResult::FatalExternalError,
                    gas_limit,
                );
            }
        };

        // Accounts without code succeed right away.
        if bytecode.is_empty() {
            self.commit(checkpoint);
            return return_result(InstructionResult::Stop);
        }

        let input = InterpreterInput {
            target_address: inputs.target_address,
            caller: inputs.caller,
            input: inputs.input,
            call_value: inputs.value.get(),
            bytecode,
            gas_limit,
            is_static: inputs.is_static,
        };
        let executor = self.executor;
        let mut result = executor.execute(input, self);
        self.settle(checkpoint, &mut result);
        result
    }

    /// Runs a deployment to completion.
    ///
    /// The deployment checkpoint is taken before the deployer's nonce is bumped, so a failed
    /// deployment leaves the deployer untouched.
    pub fn run_create(&mut self, inputs: CreateInputs) -> CreateOutcome {
        trace!(
            target: "simevm::frame",
            depth = self.depth,
            caller = %inputs.caller,
            value = %inputs.value,
            init_code_len = inputs.init_code.len(),
            gas_limit = inputs.gas_limit,
            "create"
        );
        let (result, address) = self.create_inner(inputs);
        trace!(
            target: "simevm::frame",
            depth = self.depth,
            result = ?result.result,
            address = ?address,
            gas_remaining = result.gas.remaining(),
            "create done"
        );
        CreateOutcome::new(result, address)
    }

    fn create_inner(&mut self, inputs: CreateInputs) -> (InterpreterResult, Option<Address>) {
        let gas_limit = inputs.gas_limit;
        let return_error = |result: InstructionResult| {
            (
                InterpreterResult::new(result, Bytes::new(), Gas::new(gas_limit)),
                None,
            )
        };
        let fatal_result = || {
            (
                InterpreterResult::new_with_limit(InstructionResult::FatalExternalError, gas_limit),
                None,
            )
        };

        if self.too_deep() {
            return return_error(InstructionResult::CallTooDeep);
        }

        let spec = self.ctx.spec();
        // EIP-3860: Limit and meter initcode
        if spec.is_enabled_in(SpecId::SHANGHAI)
            && inputs.init_code.len() > self.ctx.env.cfg.max_initcode_size()
        {
            return return_error(InstructionResult::CreateInitCodeSizeLimit);
        }

        let caller_balance = match self.ctx.journal.load_account(inputs.caller) {
            Ok(account) => account.data.balance,
            Err(error) => {
                let _ = self.fatal(error);
                return fatal_result();
            }
        };
        if caller_balance < inputs.value {
            return return_error(InstructionResult::OutOfFunds);
        }

        let checkpoint = self.ctx.journal.checkpoint();

        let nonce = match self.ctx.journal.inc_nonce(inputs.caller) {
            Ok(Some(nonce)) => nonce,
            Ok(None) => {
                self.revert(checkpoint);
                return return_error(InstructionResult::NonceOverflow);
            }
            Err(error) => {
                let _ = self.fatal(error);
                self.revert(checkpoint);
                return fatal_result();
            }
        };
        let created_address = inputs.created_address(nonce - 1);

        match self
            .ctx
            .journal
            .create_account(inputs.caller, created_address, inputs.value)
        {
            Ok(None) => {}
            Ok(Some(error)) => {
                self.revert(checkpoint);
                return return_error(transfer_error_result(error));
            }
            Err(error) => {
                let _ = self.fatal(error);
                self.revert(checkpoint);
                return fatal_result();
            }
        }

        let input = InterpreterInput {
            target_address: created_address,
            caller: inputs.caller,
            input: Bytes::new(),
            call_value: inputs.value,
            bytecode: Bytecode::new_raw(inputs.init_code),
            gas_limit,
            is_static: false,
        };
        let executor = self.executor;
        let mut result = executor.execute(input, self);
        self.return_create(checkpoint, &mut result, created_address);
        (result, Some(created_address))
    }

    /// Resolves the checkpoint of a finished frame.
    ///
    /// A halted frame spends all of its gas.
    fn settle(&mut self, checkpoint: JournalCheckpoint, result: &mut InterpreterResult) {
        if self.ctx.has_error() {
            result.result = InstructionResult::FatalExternalError;
        }
        if result.is_ok() {
            self.commit(checkpoint);
        } else {
            self.revert(checkpoint);
            if result.is_error() {
                result.gas.spend_all();
            }
        }
    }

    /// Validates and installs the code returned by init code.
    fn return_create(
        &mut self,
        checkpoint: JournalCheckpoint,
        result: &mut InterpreterResult,
        address: Address,
    ) {
        if self.ctx.has_error() {
            result.result = InstructionResult::FatalExternalError;
        }
        if !result.is_ok() {
            self.settle(checkpoint, result);
            return;
        }

        let spec = self.ctx.spec();
        // EIP-3541: Reject new contract code starting with the 0xEF byte
        if spec.is_enabled_in(SpecId::LONDON) && result.output.first() == Some(&0xEF) {
            result.result = InstructionResult::CreateContractStartingWithEF;
            self.settle(checkpoint, result);
            return;
        }

        // EIP-170: Contract code size limit
        if spec.is_enabled_in(SpecId::SPURIOUS_DRAGON)
            && result.output.len() > self.ctx.env.cfg.max_code_size()
        {
            result.result = InstructionResult::CreateContractSizeLimit;
            self.settle(checkpoint, result);
            return;
        }

        let gas_for_code = result.output.len() as u64 * gas::CODEDEPOSIT;
        if !result.gas.record_cost(gas_for_code) {
            // EIP-2: a deployment that can't pay for its code fails instead of leaving an empty
            // contract behind.
            if spec.is_enabled_in(SpecId::HOMESTEAD) {
                result.result = InstructionResult::OutOfGas;
                self.settle(checkpoint, result);
                return;
            }
            result.output = Bytes::new();
        }

        let code = Bytecode::new_raw(result.output.clone());
        if let Err(error) = self.ctx.journal.set_code(address, code) {
            let _ = self.fatal(error);
        }
        result.result = InstructionResult::Return;
        self.settle(checkpoint, result);
    }

    fn commit(&mut self, checkpoint: JournalCheckpoint) {
        if let Err(error) = self.ctx.journal.checkpoint_commit(checkpoint) {
            self.ctx.set_error(ContextError::Journal(error));
        }
    }

    fn revert(&mut self, checkpoint: JournalCheckpoint) {
        if let Err(error) = self.ctx.journal.checkpoint_revert(checkpoint) {
            self.ctx.set_error(ContextError::Journal(error));
        }
    }

    fn ensure_non_static(&self) -> Result<(), HostError> {
        if self.is_static {
            return Err(HostError::StateChangeInStaticContext);
        }
        Ok(())
    }
}

/// Outcome of the first frame of a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameResult {
    /// Message call.
    Call(CallOutcome),
    /// Deployment.
    Create(CreateOutcome),
}

impl FrameResult {
    /// Returns the interpreter result.
    #[inline]
    pub fn interpreter_result(&self) -> &InterpreterResult {
        match self {
            Self::Call(outcome) => &outcome.result,
            Self::Create(outcome) => &outcome.result,
        }
    }

    /// Returns the gas of the frame.
    #[inline]
    pub fn gas(&self) -> &Gas {
        &self.interpreter_result().gas
    }

    /// Returns the output, with the created address for successful deployments.
    pub fn output(&self) -> Output {
        match self {
            Self::Call(outcome) => Output::Call(outcome.result.output.clone()),
            Self::Create(outcome) => Output::Create(
                outcome.result.output.clone(),
                outcome.address.filter(|_| outcome.result.is_ok()),
            ),
        }
    }
}

fn transfer_error_result(error: TransferError) -> InstructionResult {
    match error {
        TransferError::OutOfFunds => InstructionResult::OutOfFunds,
        TransferError::OverflowPayment => InstructionResult::OverflowPayment,
        TransferError::CreateCollision => InstructionResult::CreateCollision,
    }
}

impl<DB, INSP, EXEC> Host for Frame<'_, DB, INSP, EXEC>
where
    DB: DatabaseMut,
    INSP: Inspector,
    EXEC: InstructionExecutor,
{
    fn env(&self) -> &Env {
        &self.ctx.env
    }

    fn load_account(&mut self, address: Address) -> Result<StateLoad<AccountInfo>, HostError> {
        self.ctx
            .journal
            .load_account(address)
            .map_err(|e| self.fatal(e))
    }

    fn load_code(&mut self, address: Address) -> Result<StateLoad<Bytecode>, HostError> {
        self.ctx
            .journal
            .load_code(address)
            .map_err(|e| self.fatal(e))
    }

    fn block_hash(&mut self, number: u64) -> Result<B256, HostError> {
        self.ctx
            .journal
            .db_mut()
            .block_hash(number)
            .map_err(|e| self.fatal(e))
    }

    fn sload(
        &mut self,
        address: Address,
        key: StorageKey,
    ) -> Result<StateLoad<StorageValue>, HostError> {
        self.ctx
            .journal
            .sload(address, key)
            .map_err(|e| self.fatal(e))
    }

    fn sstore(
        &mut self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<StateLoad<SStoreResult>, HostError> {
        self.ensure_non_static()?;
        self.ctx
            .journal
            .sstore(address, key, value)
            .map_err(|e| self.fatal(e))
    }

    fn tload(&mut self, address: Address, key: StorageKey) -> StorageValue {
        self.ctx.journal.tload(address, key)
    }

    fn tstore(
        &mut self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), HostError> {
        self.ensure_non_static()?;
        self.ctx.journal.tstore(address, key, value);
        Ok(())
    }

    fn log(&mut self, log: Log) -> Result<(), HostError> {
        self.ensure_non_static()?;
        self.ctx.journal.log(log);
        Ok(())
    }

    fn call(&mut self, inputs: CallInputs) -> CallOutcome {
        let is_static = self.is_static || inputs.is_static;
        self.child(is_static).run_call(inputs)
    }

    fn create(&mut self, inputs: CreateInputs) -> CreateOutcome {
        if self.is_static {
            let gas_limit = inputs.gas_limit;
            return CreateOutcome::new(
                InterpreterResult::new_with_limit(
                    InstructionResult::StateChangeDuringStaticCall,
                    gas_limit,
                ),
                None,
            );
        }
        self.child(false).run_create(inputs)
    }

    fn step(&mut self, interp: &Interpreter) {
        self.inspector.step(interp, self.depth);
    }

    fn step_end(&mut self, interp: &Interpreter) {
        self.inspector.step_end(interp, self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::AccountStore;
    use inspector::inspectors::NoOpInspector;
    use interpreter::{opcode, CallScheme, CreateScheme, EthInterpreter};
    use primitives::{address, U256};

    const CALLER: Address = address!("0x1000000000000000000000000000000000000001");
    const TARGET: Address = address!("0x2000000000000000000000000000000000000002");

    fn ctx() -> Context<AccountStore> {
        let mut db = AccountStore::new();
        db.insert_account_info(CALLER, AccountInfo::from_balance(U256::from(1_000)));
        Context::new(Env::default(), db)
    }

    fn call_inputs(value: U256, is_static: bool) -> CallInputs {
        CallInputs {
            input: Bytes::new(),
            return_memory_offset: 0..0,
            gas_limit: 100_000,
            bytecode_address: TARGET,
            target_address: TARGET,
            caller: CALLER,
            value: CallValue::Transfer(value),
            scheme: CallScheme::Call,
            is_static,
        }
    }

    fn run_call(ctx: &mut Context<AccountStore>, inputs: CallInputs) -> CallOutcome {
        let mut inspector = NoOpInspector;
        let is_static = inputs.is_static;
        Frame::new(ctx, &mut inspector, &EthInterpreter, 0, is_static).run_call(inputs)
    }

    fn balance(ctx: &mut Context<AccountStore>, address: Address) -> U256 {
        ctx.journal.peek_account(address).unwrap().balance
    }

    #[test]
    fn transfer_to_account_without_code() {
        let mut ctx = ctx();
        let outcome = run_call(&mut ctx, call_inputs(U256::from(400), false));
        assert_eq!(outcome.result.result, InstructionResult::Stop);
        assert_eq!(outcome.result.gas.remaining(), 100_000);
        assert_eq!(balance(&mut ctx, CALLER), U256::from(600));
        assert_eq!(balance(&mut ctx, TARGET), U256::from(400));
        assert_eq!(ctx.journal.depth(), 0);
    }

    #[test]
    fn insufficient_balance_keeps_both_balances() {
        let mut ctx = ctx();
        let outcome = run_call(&mut ctx, call_inputs(U256::from(1_001), false));
        assert_eq!(outcome.result.result, InstructionResult::OutOfFunds);
        assert_eq!(balance(&mut ctx, CALLER), U256::from(1_000));
        assert_eq!(balance(&mut ctx, TARGET), U256::ZERO);
        assert_eq!(ctx.journal.depth(), 0);
    }

    #[test]
    fn static_sstore_halts_and_spends_all_gas() {
        let mut ctx = ctx();
        // PUSH1 1 PUSH1 0 SSTORE
        let code = Bytecode::new_raw(Bytes::from(vec![
            opcode::PUSH1,
            1,
            opcode::PUSH1,
            0,
            opcode::SSTORE,
        ]));
        ctx.journal.set_code(TARGET, code).unwrap();
        let outcome = run_call(&mut ctx, call_inputs(U256::ZERO, true));
        assert_eq!(
            outcome.result.result,
            InstructionResult::StateChangeDuringStaticCall
        );
        assert_eq!(outcome.result.gas.remaining(), 0);
        assert_eq!(ctx.journal.sload(TARGET, U256::ZERO).unwrap().data, U256::ZERO);
    }

    #[test]
    fn too_deep_returns_gas() {
        let mut ctx = ctx();
        ctx.env.cfg.call_stack_limit = 0;
        let mut inspector = NoOpInspector;
        let mut frame = Frame::new(&mut ctx, &mut inspector, &EthInterpreter, 1, false);
        let outcome = frame.run_call(call_inputs(U256::ZERO, false));
        assert_eq!(outcome.result.result, InstructionResult::CallTooDeep);
        assert_eq!(outcome.result.gas.remaining(), 100_000);
    }

    #[test]
    fn create_installs_returned_code() {
        let mut ctx = ctx();
        // PUSH1 1 PUSH1 0 RETURN: deploys one zero byte
        let init_code = Bytes::from(vec![
            opcode::PUSH1,
            1,
            opcode::PUSH1,
            0,
            opcode::RETURN,
        ]);
        let mut inspector = NoOpInspector;
        let outcome = Frame::new(&mut ctx, &mut inspector, &EthInterpreter, 0, false).run_create(
            CreateInputs {
                caller: CALLER,
                scheme: CreateScheme::Create,
                value: U256::from(10),
                init_code,
                gas_limit: 100_000,
            },
        );
        assert_eq!(outcome.result.result, InstructionResult::Return);
        let address = outcome.address.unwrap();
        assert_eq!(address, CALLER.create(0));

        let deployed = ctx.journal.load_code(address).unwrap().data;
        assert_eq!(deployed.original_bytes(), Bytes::from(vec![0]));
        assert_eq!(balance(&mut ctx, address), U256::from(10));
        assert_eq!(ctx.journal.peek_account(CALLER).unwrap().nonce, 1);
        assert_eq!(ctx.journal.depth(), 0);
    }

    #[test]
    fn failed_create_leaves_deployer_untouched() {
        let mut ctx = ctx();
        // INVALID
        let mut inspector = NoOpInspector;
        let outcome = Frame::new(&mut ctx, &mut inspector, &EthInterpreter, 0, false).run_create(
            CreateInputs {
                caller: CALLER,
                scheme: CreateScheme::Create,
                value: U256::from(10),
                init_code: Bytes::from(vec![opcode::INVALID]),
                gas_limit: 100_000,
            },
        );
        assert_eq!(outcome.result.result, InstructionResult::InvalidFEOpcode);
        assert_eq!(outcome.result.gas.remaining(), 0);
        let caller = ctx.journal.peek_account(CALLER).unwrap();
        assert_eq!(caller.nonce, 0);
        assert_eq!(caller.balance, U256::from(1_000));
    }
}
