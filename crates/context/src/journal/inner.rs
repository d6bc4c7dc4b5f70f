//! Module containing the [`JournalInner`] that is part of [`crate::Journal`].
use super::{JournalEntry, SStoreResult, StateLoad, TransferError};
use crate::journal::JournalError;
use database_interface::{Database, DatabaseMut};
use primitives::{
    hardfork::SpecId, Address, HashMap, HashSet, Log, StorageKey, StorageValue, KECCAK_EMPTY, U256,
};
use state::{AccountInfo, Bytecode};
use tracing::{trace, warn};

/// EIP-1153 transient storage, keyed by account and slot.
pub type TransientStorage = HashMap<(Address, StorageKey), StorageValue>;

/// Accounts and slots accessed in the current transaction (EIP-2929).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WarmSet {
    /// Warm accounts.
    pub addresses: HashSet<Address>,
    /// Warm storage slots.
    pub slots: HashSet<(Address, StorageKey)>,
}

impl WarmSet {
    /// Makes every account and slot cold again.
    pub fn clear(&mut self) {
        self.addresses.clear();
        self.slots.clear();
    }
}

/// Journal checkpoint: its position on the checkpoint stack and the journal and log lengths at
/// the time it was taken.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JournalCheckpoint {
    /// Number of checkpoints active when this one was taken.
    pub depth: usize,
    /// Checkpoint to where on revert we will go back to.
    pub log_i: usize,
    /// Checkpoint to where on revert we will go back to and revert other journal entries.
    pub journal_i: usize,
}

/// Inner journal state that contains the undo log, logs and the checkpoint stack.
///
/// Accounts and storage live in the database; this type only records how to undo writes to them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JournalInner {
    /// Reversible entries, in the order they were recorded.
    pub journal: Vec<JournalEntry>,
    /// Logs emitted and not reverted.
    pub logs: Vec<Log>,
    /// Transient storage that is discarded after every transaction.
    ///
    /// See [EIP-1153](https://eips.ethereum.org/EIPS/eip-1153).
    pub transient_storage: TransientStorage,
    /// Accounts and slots accessed in the current transaction.
    pub warm: WarmSet,
    /// Value of each storage slot at its first access in the current transaction.
    pub original_values: HashMap<(Address, StorageKey), StorageValue>,
    /// Active checkpoints, innermost last.
    pub checkpoints: Vec<JournalCheckpoint>,
    /// The spec ID for the EVM. Spec is required for some journal entries and needs to be set
    /// for the journal to work correctly.
    pub spec: SpecId,
}

impl Default for JournalInner {
    fn default() -> Self {
        Self::new()
    }
}

impl JournalInner {
    /// Creates new [`JournalInner`].
    pub fn new() -> JournalInner {
        Self {
            journal: Vec::new(),
            logs: Vec::new(),
            transient_storage: TransientStorage::default(),
            warm: WarmSet::default(),
            original_values: HashMap::default(),
            checkpoints: Vec::new(),
            spec: SpecId::default(),
        }
    }

    /// Sets SpecId.
    #[inline]
    pub fn set_spec_id(&mut self, spec: SpecId) {
        self.spec = spec;
    }

    /// Starts a new transaction: every account and slot is cold again and original values are
    /// re-read on first access. Entries and checkpoints are kept.
    pub fn begin_transaction(&mut self) {
        self.warm.clear();
        self.original_values.clear();
    }

    /// Ends the transaction for good. Nothing recorded so far can be reverted afterwards.
    pub fn finalize(&mut self) {
        let Self {
            journal,
            logs,
            transient_storage,
            warm,
            original_values,
            checkpoints,
            spec: _,
        } = self;
        journal.clear();
        logs.clear();
        transient_storage.clear();
        warm.clear();
        original_values.clear();
        checkpoints.clear();
    }

    /// Clears transient storage.
    pub fn reset_transient_storage(&mut self) {
        self.transient_storage.clear();
    }

    /// Number of active checkpoints.
    #[inline]
    pub fn depth(&self) -> usize {
        self.checkpoints.len()
    }

    /// Marks `address` warm. Returns `true` if it was cold.
    #[inline]
    pub fn warm_account(&mut self, address: Address) -> bool {
        let is_cold = self.warm.addresses.insert(address);
        if is_cold {
            self.journal.push(JournalEntry::AccountWarmed { address });
        }
        is_cold
    }

    /// Marks a storage slot warm. Returns `true` if it was cold.
    #[inline]
    pub fn warm_slot(&mut self, address: Address, key: StorageKey) -> bool {
        let is_cold = self.warm.slots.insert((address, key));
        if is_cold {
            self.journal.push(JournalEntry::StorageWarmed { address, key });
        }
        is_cold
    }

    /// Loads an account, warming it. Unknown accounts read as empty.
    #[inline]
    pub fn load_account<DB: Database>(
        &mut self,
        db: &mut DB,
        address: Address,
    ) -> Result<StateLoad<AccountInfo>, DB::Error> {
        let info = db.basic(address)?.unwrap_or_default();
        let is_cold = self.warm_account(address);
        Ok(StateLoad::new(info, is_cold))
    }

    /// Loads the code of an account, warming it.
    pub fn load_code<DB: Database>(
        &mut self,
        db: &mut DB,
        address: Address,
    ) -> Result<StateLoad<Bytecode>, DB::Error> {
        let account = self.load_account(db, address)?;
        let is_cold = account.is_cold;
        let code = match account.data.code {
            Some(code) => code,
            None => db.code_by_hash(account.data.code_hash)?,
        };
        Ok(StateLoad::new(code, is_cold))
    }

    /// Loads a storage slot, warming it and remembering its original value.
    #[inline]
    pub fn sload<DB: Database>(
        &mut self,
        db: &mut DB,
        address: Address,
        key: StorageKey,
    ) -> Result<StateLoad<StorageValue>, DB::Error> {
        let value = db.storage(address, key)?;
        self.original_values.entry((address, key)).or_insert(value);
        let is_cold = self.warm_slot(address, key);
        Ok(StateLoad::new(value, is_cold))
    }

    /// Stores a storage slot.
    ///
    /// Nothing is recorded when the new value equals the present one.
    #[inline]
    pub fn sstore<DB: DatabaseMut>(
        &mut self,
        db: &mut DB,
        address: Address,
        key: StorageKey,
        new: StorageValue,
    ) -> Result<StateLoad<SStoreResult>, DB::Error> {
        let present = self.sload(db, address, key)?;
        let original_value = self
            .original_values
            .get(&(address, key))
            .copied()
            .unwrap_or(present.data);

        if present.data != new {
            self.journal.push(JournalEntry::StorageChanged {
                address,
                key,
                had_value: present.data,
            });
            db.set_storage(address, key, new);
        }

        Ok(StateLoad::new(
            SStoreResult {
                original_value,
                present_value: present.data,
                new_value: new,
            },
            present.is_cold,
        ))
    }

    /// Read transient storage tied to the account.
    ///
    /// EIP-1153: Transient storage opcodes
    #[inline]
    pub fn tload(&mut self, address: Address, key: StorageKey) -> StorageValue {
        self.transient_storage
            .get(&(address, key))
            .copied()
            .unwrap_or_default()
    }

    /// Store transient storage tied to the account.
    ///
    /// If values is different add entry to the journal
    /// so that old state can be reverted if that action is needed.
    ///
    /// EIP-1153: Transient storage opcodes
    #[inline]
    pub fn tstore(&mut self, address: Address, key: StorageKey, new: StorageValue) {
        let had_value = if new.is_zero() {
            // if new values is zero, remove entry from transient storage.
            self.transient_storage.remove(&(address, key))
        } else {
            // if new values is different from previous value, insert it.
            let previous_value = self
                .transient_storage
                .insert((address, key), new)
                .unwrap_or_default();
            (previous_value != new).then_some(previous_value)
        };

        if let Some(had_value) = had_value {
            self.journal.push(JournalEntry::TransientStorageChange {
                address,
                key,
                had_value,
            });
        }
    }

    /// Appends a log.
    #[inline]
    pub fn log(&mut self, log: Log) {
        self.logs.push(log);
        self.journal.push(JournalEntry::LogEmitted);
    }

    /// Overwrites the balance of an account, recording the old one.
    pub fn set_balance<DB: DatabaseMut>(
        &mut self,
        db: &mut DB,
        address: Address,
        balance: U256,
    ) -> Result<(), DB::Error> {
        let old_balance = self.load_account(db, address)?.data.balance;
        self.record_balance(db, address, old_balance, balance);
        Ok(())
    }

    /// Increments the nonce of the account.
    ///
    /// Returns the new nonce, or `None` if the nonce is already at its maximum.
    #[inline]
    pub fn inc_nonce<DB: DatabaseMut>(
        &mut self,
        db: &mut DB,
        address: Address,
    ) -> Result<Option<u64>, DB::Error> {
        let old_nonce = self.load_account(db, address)?.data.nonce;
        // Check if nonce is going to overflow.
        let Some(nonce) = old_nonce.checked_add(1) else {
            return Ok(None);
        };
        self.journal
            .push(JournalEntry::NonceChange { address, old_nonce });
        db.set_nonce(address, nonce);
        Ok(Some(nonce))
    }

    /// Installs new code on an account.
    pub fn set_code<DB: DatabaseMut>(
        &mut self,
        db: &mut DB,
        address: Address,
        code: Bytecode,
    ) -> Result<(), DB::Error> {
        let had_code_hash = self.load_account(db, address)?.data.code_hash;
        self.journal.push(JournalEntry::CodeChange {
            address,
            had_code_hash,
        });
        db.set_code(address, code);
        Ok(())
    }

    /// Transfers balance from two accounts. Returns error if sender balance is not enough.
    ///
    /// Both accounts are warmed, even when the transfer fails.
    #[inline]
    pub fn transfer<DB: DatabaseMut>(
        &mut self,
        db: &mut DB,
        from: Address,
        to: Address,
        balance: U256,
    ) -> Result<Option<TransferError>, DB::Error> {
        let from_balance = self.load_account(db, from)?.data.balance;
        let to_balance = self.load_account(db, to)?.data.balance;
        if balance.is_zero() {
            return Ok(None);
        }

        let Some(from_balance_decr) = from_balance.checked_sub(balance) else {
            return Ok(Some(TransferError::OutOfFunds));
        };
        if from == to {
            return Ok(None);
        }
        let Some(to_balance_incr) = to_balance.checked_add(balance) else {
            return Ok(Some(TransferError::OverflowPayment));
        };

        self.record_balance(db, from, from_balance, from_balance_decr);
        self.record_balance(db, to, to_balance, to_balance_incr);
        Ok(None)
    }

    /// Creates the account a deployment targets and moves `balance` into it.
    ///
    /// Fails with [`TransferError::CreateCollision`] when the target already has code or a
    /// nonce. Changes made before a transfer error are left in place for the caller's checkpoint
    /// to revert.
    pub fn create_account<DB: DatabaseMut>(
        &mut self,
        db: &mut DB,
        caller: Address,
        target_address: Address,
        balance: U256,
    ) -> Result<Option<TransferError>, DB::Error> {
        let target = self.load_account(db, target_address)?.data;
        if target.code_hash != KECCAK_EMPTY || target.nonce != 0 {
            return Ok(Some(TransferError::CreateCollision));
        }

        let had_account = db.create_account(target_address);
        self.journal.push(JournalEntry::AccountCreated {
            address: target_address,
            had_account,
        });

        // EIP-161: contracts start at nonce one
        if self.spec.is_enabled_in(SpecId::SPURIOUS_DRAGON) {
            self.journal.push(JournalEntry::NonceChange {
                address: target_address,
                old_nonce: 0,
            });
            db.set_nonce(target_address, 1);
        }

        self.transfer(db, caller, target_address, balance)
    }

    /// Makes a checkpoint that in case of Revert can bring back state to this point.
    #[inline]
    pub fn checkpoint(&mut self) -> JournalCheckpoint {
        let checkpoint = JournalCheckpoint {
            depth: self.checkpoints.len(),
            log_i: self.logs.len(),
            journal_i: self.journal.len(),
        };
        self.checkpoints.push(checkpoint);
        trace!(
            target: "simevm::journal",
            depth = self.checkpoints.len(),
            journal_i = checkpoint.journal_i,
            log_i = checkpoint.log_i,
            "checkpoint"
        );
        checkpoint
    }

    /// Discards the checkpoint and every checkpoint taken after it, keeping their changes.
    pub fn checkpoint_commit(&mut self, checkpoint: JournalCheckpoint) -> Result<(), JournalError> {
        if !self.is_active(checkpoint) {
            return self.ensure_unchanged_since(checkpoint);
        }
        self.checkpoints.truncate(checkpoint.depth);
        trace!(
            target: "simevm::journal",
            depth = self.checkpoints.len(),
            journal_i = checkpoint.journal_i,
            "checkpoint commit"
        );
        Ok(())
    }

    /// Reverts all changes to state until given checkpoint.
    ///
    /// Checkpoints taken after `checkpoint` are discarded along with it.
    pub fn checkpoint_revert<DB: DatabaseMut>(
        &mut self,
        db: &mut DB,
        checkpoint: JournalCheckpoint,
    ) -> Result<(), JournalError> {
        if !self.is_active(checkpoint) {
            return self.ensure_unchanged_since(checkpoint);
        }
        if checkpoint.journal_i > self.journal.len() {
            return Err(self.invalid_checkpoint(checkpoint));
        }
        self.checkpoints.truncate(checkpoint.depth);

        let Self {
            journal,
            logs,
            transient_storage,
            warm,
            ..
        } = self;
        let reverted = journal.len() - checkpoint.journal_i;
        // iterate over last N journals sets and revert our global state
        journal
            .drain(checkpoint.journal_i..)
            .rev()
            .for_each(|entry| entry.revert(db, warm, transient_storage, logs));
        trace!(
            target: "simevm::journal",
            depth = self.checkpoints.len(),
            journal_i = checkpoint.journal_i,
            reverted,
            "checkpoint revert"
        );

        if self.logs.len() != checkpoint.log_i {
            return Err(JournalError::LogDesync {
                expected: checkpoint.log_i,
                found: self.logs.len(),
            });
        }
        Ok(())
    }

    fn is_active(&self, checkpoint: JournalCheckpoint) -> bool {
        self.checkpoints.get(checkpoint.depth) == Some(&checkpoint)
    }

    /// An inactive checkpoint is only acceptable if nothing was recorded since it was taken.
    fn ensure_unchanged_since(&self, checkpoint: JournalCheckpoint) -> Result<(), JournalError> {
        if checkpoint.journal_i == self.journal.len() && checkpoint.log_i == self.logs.len() {
            return Ok(());
        }
        Err(self.invalid_checkpoint(checkpoint))
    }

    fn invalid_checkpoint(&self, checkpoint: JournalCheckpoint) -> JournalError {
        warn!(
            target: "simevm::journal",
            ?checkpoint,
            journal_len = self.journal.len(),
            log_len = self.logs.len(),
            "invalid checkpoint"
        );
        JournalError::InvalidCheckpoint {
            checkpoint,
            journal_len: self.journal.len(),
            log_len: self.logs.len(),
        }
    }

    fn record_balance<DB: DatabaseMut>(
        &mut self,
        db: &mut DB,
        address: Address,
        old_balance: U256,
        balance: U256,
    ) {
        self.journal.push(JournalEntry::BalanceChange {
            address,
            old_balance,
        });
        db.set_balance(address, balance);
    }
}
