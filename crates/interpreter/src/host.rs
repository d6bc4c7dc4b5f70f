use crate::{CallInputs, CallOutcome, CreateInputs, CreateOutcome, Interpreter};
use context::{Env, SStoreResult, StateLoad};
use primitives::{Address, Log, StorageKey, StorageValue, B256};
use state::{AccountInfo, Bytecode};

/// Why the host refused a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostError {
    /// State mutation requested from a static frame.
    StateChangeInStaticContext,
    /// The database failed. The error itself is kept by the host.
    Fatal,
}

/// State and environment an executing frame talks to.
///
/// Every state read goes through the journal, so warm/cold status is reported back for gas
/// pricing. Nested calls and deployments recurse through [`Host::call`] and [`Host::create`].
pub trait Host {
    /// Configuration, block and transaction environment.
    fn env(&self) -> &Env;

    /// Loads an account, warming it.
    fn load_account(&mut self, address: Address) -> Result<StateLoad<AccountInfo>, HostError>;

    /// Loads the code of an account, warming it.
    fn load_code(&mut self, address: Address) -> Result<StateLoad<Bytecode>, HostError>;

    /// Hash of a past block. The caller checks the block is within range.
    fn block_hash(&mut self, number: u64) -> Result<B256, HostError>;

    /// Reads a storage slot of `address`.
    fn sload(
        &mut self,
        address: Address,
        key: StorageKey,
    ) -> Result<StateLoad<StorageValue>, HostError>;

    /// Writes a storage slot of `address`.
    fn sstore(
        &mut self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<StateLoad<SStoreResult>, HostError>;

    /// Reads a transient storage slot.
    fn tload(&mut self, address: Address, key: StorageKey) -> StorageValue;

    /// Writes a transient storage slot.
    fn tstore(
        &mut self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), HostError>;

    /// Emits a log.
    fn log(&mut self, log: Log) -> Result<(), HostError>;

    /// Runs a nested call to completion.
    fn call(&mut self, inputs: CallInputs) -> CallOutcome;

    /// Runs a nested deployment to completion.
    fn create(&mut self, inputs: CreateInputs) -> CreateOutcome;

    /// Called before every instruction.
    fn step(&mut self, interp: &Interpreter) {
        let _ = interp;
    }

    /// Called after every instruction.
    fn step_end(&mut self, interp: &Interpreter) {
        let _ = interp;
    }
}
