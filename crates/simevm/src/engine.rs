use context::{
    BlockEnv, Context, Env, EvmError, ExecutionResult, JournalCheckpoint, JournalError, TxEnv,
};
use database::{AccountStore, DbAccount};
use database_interface::{Database, ProviderError, SharedProvider};
use handler::Evm;
use inspector::{
    inspectors::{NoOpInspector, TracerEip3155},
    Inspector,
};
use interpreter::EthInterpreter;
use primitives::{
    hardfork::SpecId, Address, Bytes, HashMap, Log, StorageKey, StorageValue, TxKind, B256, U256,
};
use state::{AccountInfo, Bytecode};
use tracing::debug;

/// Errors returned by [`Engine`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Transaction validation, provider or journal failure. No state was changed.
    #[error(transparent)]
    Evm(#[from] EvmError<ProviderError>),
    /// A deployment ran but did not succeed.
    #[error("execution failed: {}", .0.reason())]
    Execution(ExecutionResult),
}

impl From<ProviderError> for EngineError {
    fn from(error: ProviderError) -> Self {
        Self::Evm(EvmError::Database(error))
    }
}

impl From<JournalError> for EngineError {
    fn from(error: JournalError) -> Self {
        Self::Evm(EvmError::Journal(error))
    }
}

/// Options an [`Engine`] is built from.
#[derive(Clone)]
pub struct EngineOpts {
    /// Initial environment.
    pub env: Env,
    /// Fallback source for state that is not cached locally.
    pub fork: Option<SharedProvider>,
    /// Gas limit of calls that do not set one.
    pub gas_limit: u64,
    /// Writes an EIP-3155 trace of every transaction to stdout.
    pub tracing: bool,
    /// Hardfork rules to execute with. Overrides the spec of `env`.
    pub spec_id: SpecId,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            env: Env::default(),
            fork: None,
            gas_limit: u64::MAX,
            tracing: false,
            spec_id: SpecId::CANCUN,
        }
    }
}

impl core::fmt::Debug for EngineOpts {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EngineOpts")
            .field("env", &self.env)
            .field("fork", &self.fork.as_ref().map(|p| p.fork_block()))
            .field("gas_limit", &self.gas_limit)
            .field("tracing", &self.tracing)
            .field("spec_id", &self.spec_id)
            .finish()
    }
}

/// Execution engine over an in-memory account store.
///
/// Calls made through [`message_call`](Engine::message_call) and [`deploy`](Engine::deploy) keep
/// their changes in the journal: a [`snapshot`](Engine::snapshot) taken before them can still be
/// [`revert`](Engine::revert)ed. [`message_call_committing`](Engine::message_call_committing)
/// closes the transaction and makes every change so far permanent.
pub struct Engine {
    evm: Evm<AccountStore, Box<dyn Inspector>, EthInterpreter>,
    gas_limit: u64,
    tracing: bool,
    last_result: Option<ExecutionResult>,
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("env", &self.evm.ctx.env)
            .field("db", self.evm.ctx.journal.db())
            .field("gas_limit", &self.gas_limit)
            .field("tracing", &self.tracing)
            .field("last_result", &self.last_result)
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOpts::default())
    }
}

impl Engine {
    /// Creates an engine. With `opts.tracing` set, transactions are traced to stdout.
    pub fn new(opts: EngineOpts) -> Self {
        let inspector: Box<dyn Inspector> = if opts.tracing {
            Box::new(TracerEip3155::new_stdout())
        } else {
            Box::new(NoOpInspector)
        };
        Self::new_with_inspector(opts, inspector)
    }

    /// Creates an engine that reports execution to `inspector`.
    pub fn new_with_inspector(opts: EngineOpts, inspector: Box<dyn Inspector>) -> Self {
        let EngineOpts {
            env,
            fork,
            gas_limit,
            tracing,
            spec_id,
        } = opts;
        let db = match fork {
            Some(provider) => AccountStore::with_provider(provider),
            None => AccountStore::new(),
        };
        let mut ctx = Context::new(env, db);
        ctx.set_spec(spec_id);
        debug!(target: "simevm::engine", spec = spec_id.name(), gas_limit, tracing, "engine created");

        Self {
            evm: Evm::new_with(ctx, inspector, EthInterpreter),
            gas_limit,
            tracing,
            last_result: None,
        }
    }

    fn db(&mut self) -> &mut AccountStore {
        self.evm.ctx.journal.db_mut()
    }

    /// Returns the account at `address`. Unknown accounts read as empty.
    pub fn basic(&mut self, address: Address) -> Result<AccountInfo, EngineError> {
        Ok(self.db().basic(address)?.unwrap_or_default())
    }

    /// Same as [`basic`](Engine::basic).
    pub fn get_account_info(&mut self, address: Address) -> Result<AccountInfo, EngineError> {
        self.basic(address)
    }

    /// Balance of `address`.
    pub fn get_balance(&mut self, address: Address) -> Result<U256, EngineError> {
        Ok(self.basic(address)?.balance)
    }

    /// Code deployed at `address`, empty when there is none.
    pub fn get_code(&mut self, address: Address) -> Result<Bytecode, EngineError> {
        let info = self.basic(address)?;
        match info.code {
            Some(code) => Ok(code),
            None => Ok(self.db().code_by_hash(info.code_hash)?),
        }
    }

    /// Value of storage slot `index` of `address`.
    pub fn storage(&mut self, address: Address, index: StorageKey) -> Result<StorageValue, EngineError> {
        Ok(self.db().storage(address, index)?)
    }

    /// Same as [`storage`](Engine::storage).
    pub fn get_storage(
        &mut self,
        address: Address,
        index: StorageKey,
    ) -> Result<StorageValue, EngineError> {
        self.storage(address, index)
    }

    /// Sets the balance of `address`. The change is journaled and can be reverted.
    pub fn set_balance(&mut self, address: Address, balance: U256) -> Result<(), EngineError> {
        Ok(self.evm.ctx.journal.set_balance(address, balance)?)
    }

    /// Seeds an account, replacing its balance, nonce and code but keeping its storage.
    ///
    /// Seeding is not journaled.
    pub fn insert_account_info(&mut self, address: Address, info: AccountInfo) {
        self.db().insert_account_info(address, info);
    }

    /// Seeds one storage slot. Not journaled.
    pub fn insert_account_storage(
        &mut self,
        address: Address,
        slot: StorageKey,
        value: StorageValue,
    ) -> Result<(), EngineError> {
        Ok(self.db().insert_account_storage(address, slot, value)?)
    }

    /// Seeds the hash of block `number`.
    pub fn insert_block_hash(&mut self, number: u64, hash: B256) {
        self.db().insert_block_hash(number, hash);
    }

    /// Executes a call. Its changes stay revertable through [`snapshot`](Engine::snapshot)s.
    ///
    /// Reverts and halts are returned as results, only failures outside execution are errors.
    /// `gas` defaults to the engine gas limit and `gas_price` to the one of the current
    /// transaction environment.
    #[allow(clippy::too_many_arguments)]
    pub fn message_call(
        &mut self,
        caller: Address,
        to: Address,
        calldata: Bytes,
        value: U256,
        gas: Option<u64>,
        gas_price: Option<u128>,
        is_static: bool,
    ) -> Result<ExecutionResult, EngineError> {
        self.prepare_tx(caller, TxKind::Call(to), calldata, value, gas, gas_price, None);
        let result = if is_static {
            self.evm.transact_static()
        } else {
            self.evm.transact()
        };
        self.record(result)
    }

    /// Executes a call and closes the transaction: afterwards nothing done so far can be
    /// reverted.
    #[allow(clippy::too_many_arguments)]
    pub fn message_call_committing(
        &mut self,
        caller: Address,
        to: Address,
        calldata: Bytes,
        value: U256,
        gas: Option<u64>,
        gas_price: Option<u128>,
        is_static: bool,
    ) -> Result<ExecutionResult, EngineError> {
        let result = self.message_call(caller, to, calldata, value, gas, gas_price, is_static)?;
        self.evm.ctx.journal.finalize();
        Ok(result)
    }

    /// Deploys `code` as init code and returns the address of the new contract.
    ///
    /// With a `salt` the address is derived CREATE2 style, otherwise from the deployer nonce.
    /// A deployment that does not succeed leaves no trace and returns
    /// [`EngineError::Execution`].
    pub fn deploy(
        &mut self,
        deployer: Address,
        code: Bytes,
        value: U256,
        salt: Option<U256>,
        gas: Option<u64>,
        gas_price: Option<u128>,
    ) -> Result<Address, EngineError> {
        self.prepare_tx(deployer, TxKind::Create, code, value, gas, gas_price, salt);
        let result = self.evm.transact();
        let result = self.record(result)?;
        match result.created_address() {
            Some(address) => Ok(address),
            None => Err(EngineError::Execution(result)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn prepare_tx(
        &mut self,
        caller: Address,
        kind: TxKind,
        data: Bytes,
        value: U256,
        gas: Option<u64>,
        gas_price: Option<u128>,
        salt: Option<U256>,
    ) {
        let tx = &mut self.evm.ctx.env.tx;
        tx.caller = caller;
        tx.kind = kind;
        tx.data = data;
        tx.value = value;
        tx.salt = salt;
        tx.gas_limit = gas.unwrap_or(self.gas_limit);
        if let Some(gas_price) = gas_price {
            tx.gas_price = gas_price;
        }
    }

    fn record(
        &mut self,
        result: Result<ExecutionResult, EvmError<ProviderError>>,
    ) -> Result<ExecutionResult, EngineError> {
        match result {
            Ok(result) => {
                debug!(
                    target: "simevm::engine",
                    outcome = result.reason(),
                    gas_used = result.gas_used(),
                    logs = result.logs().len(),
                    "transaction executed"
                );
                self.last_result = Some(result.clone());
                Ok(result)
            }
            Err(error) => {
                debug!(target: "simevm::engine", %error, "transaction failed");
                Err(error.into())
            }
        }
    }

    /// Takes a checkpoint of the current state.
    pub fn snapshot(&mut self) -> JournalCheckpoint {
        self.evm.ctx.journal.checkpoint()
    }

    /// Undoes every change made since `checkpoint` was taken, including those of checkpoints
    /// taken after it.
    pub fn revert(&mut self, checkpoint: JournalCheckpoint) -> Result<(), EngineError> {
        Ok(self.evm.ctx.journal.checkpoint_revert(checkpoint)?)
    }

    /// Keeps the changes made since `checkpoint`; they can still be reverted by an outer one.
    pub fn commit(&mut self, checkpoint: JournalCheckpoint) -> Result<(), EngineError> {
        Ok(self.evm.ctx.journal.checkpoint_commit(checkpoint)?)
    }

    /// Replaces the block environment.
    pub fn set_block_env(&mut self, block: BlockEnv) {
        self.evm.ctx.env.block = block;
    }

    /// Replaces the transaction environment.
    pub fn set_tx_env(&mut self, tx: TxEnv) {
        self.evm.ctx.env.tx = tx;
    }

    /// Sets the current block number.
    pub fn set_block_number(&mut self, number: u64) {
        self.evm.ctx.env.block.number = number;
    }

    /// Sets the current block timestamp.
    pub fn set_block_timestamp(&mut self, timestamp: u64) {
        self.evm.ctx.env.block.timestamp = timestamp;
    }

    /// Sets the excess blob gas of the current block and recomputes its blob gas price.
    pub fn set_excess_blob_gas(&mut self, excess_blob_gas: u64) {
        let is_prague = self.spec_id().is_enabled_in(SpecId::PRAGUE);
        self.evm
            .ctx
            .env
            .block
            .set_blob_excess_gas_and_price(excess_blob_gas, is_prague);
    }

    /// Clears transient storage.
    pub fn reset_transient_storage(&mut self) {
        self.evm.ctx.journal.reset_transient_storage();
    }

    /// Result of the last executed transaction.
    pub fn last_result(&self) -> Option<&ExecutionResult> {
        self.last_result.as_ref()
    }

    /// Number of active checkpoints.
    pub fn journal_depth(&self) -> usize {
        self.evm.ctx.journal.depth()
    }

    /// Number of journal entries.
    pub fn journal_len(&self) -> usize {
        self.evm.ctx.journal.len()
    }

    /// Logs emitted since the last committing call.
    pub fn journal_logs(&self) -> &[Log] {
        self.evm.ctx.journal.logs()
    }

    /// Every cached account.
    pub fn accounts(&self) -> &HashMap<Address, DbAccount> {
        self.evm.ctx.journal.db().accounts()
    }

    /// Whether transactions are traced.
    pub fn tracing(&self) -> bool {
        self.tracing
    }

    /// Hardfork rules in use.
    pub fn spec_id(&self) -> SpecId {
        self.evm.ctx.spec()
    }

    /// Current environment.
    pub fn env(&self) -> &Env {
        &self.evm.ctx.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitives::address;

    const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");

    #[test]
    fn opts_override_spec() {
        let engine = Engine::new(EngineOpts {
            spec_id: SpecId::LONDON,
            ..Default::default()
        });
        assert_eq!(engine.spec_id(), SpecId::LONDON);
        assert_eq!(engine.env().cfg.spec, SpecId::LONDON);
        assert!(!engine.tracing());
    }

    #[test]
    fn unknown_account_reads_empty() {
        let mut engine = Engine::default();
        assert_eq!(engine.basic(ALICE).unwrap(), AccountInfo::default());
        assert!(engine.get_code(ALICE).unwrap().is_empty());
        assert_eq!(engine.storage(ALICE, U256::from(1)).unwrap(), U256::ZERO);
    }

    #[test]
    fn set_balance_is_journaled() {
        let mut engine = Engine::default();
        let checkpoint = engine.snapshot();
        engine.set_balance(ALICE, U256::from(7)).unwrap();
        assert_eq!(engine.get_balance(ALICE).unwrap(), U256::from(7));
        assert!(engine.journal_len() > 0);

        engine.revert(checkpoint).unwrap();
        assert_eq!(engine.get_balance(ALICE).unwrap(), U256::ZERO);
        assert_eq!(engine.journal_depth(), 0);
    }

    #[test]
    fn block_progression() {
        let mut engine = Engine::default();
        engine.set_block_number(17);
        engine.set_block_timestamp(1_700_000_000);
        engine.set_excess_blob_gas(0);
        assert_eq!(engine.env().block.number, 17);
        assert_eq!(engine.env().block.timestamp, 1_700_000_000);
        assert_eq!(engine.env().block.blob_gasprice(), Some(1));
    }
}
