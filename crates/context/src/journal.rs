//! This module contains the [`Journal`] struct.
//!
//! Entry submodule contains [`JournalEntry`] and the inverse of every mutation,
//! and inner submodule contains [`JournalInner`] with the undo log and the checkpoint stack.
pub mod entry;
pub mod inner;

pub use entry::JournalEntry;
pub use inner::{JournalCheckpoint, JournalInner, TransientStorage, WarmSet};

use core::ops::{Deref, DerefMut};
use database_interface::{Database, DatabaseMut};
use primitives::{hardfork::SpecId, Address, Log, StorageKey, StorageValue, U256};
use state::{AccountInfo, Bytecode};

/// A journal of state changes made on top of a database.
///
/// Every mutation is applied to the database right away and recorded as a [`JournalEntry`] that
/// knows how to undo it. Checkpoints are positions in that record; reverting one replays the
/// inverse of every newer entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Journal<DB> {
    /// Database
    pub database: DB,
    /// Inner journal state.
    pub inner: JournalInner,
}

impl<DB> Deref for Journal<DB> {
    type Target = JournalInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<DB> DerefMut for Journal<DB> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<DB: DatabaseMut> Journal<DB> {
    /// Creates a new journal on top of `database`.
    pub fn new(database: DB) -> Journal<DB> {
        Self {
            database,
            inner: JournalInner::new(),
        }
    }

    /// Creates a new journal for the given hardfork.
    pub fn new_with_spec(database: DB, spec: SpecId) -> Journal<DB> {
        let mut journal = Self::new(database);
        journal.inner.set_spec_id(spec);
        journal
    }

    /// Returns the database.
    #[inline]
    pub fn db(&self) -> &DB {
        &self.database
    }

    /// Returns the mutable database.
    #[inline]
    pub fn db_mut(&mut self) -> &mut DB {
        &mut self.database
    }

    /// Number of recorded entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.journal.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.journal.is_empty()
    }

    /// Recorded entries, oldest first.
    #[inline]
    pub fn entries(&self) -> &[JournalEntry] {
        &self.inner.journal
    }

    /// Logs emitted and not reverted.
    #[inline]
    pub fn logs(&self) -> &[Log] {
        &self.inner.logs
    }

    /// Loads an account, warming it.
    #[inline]
    pub fn load_account(
        &mut self,
        address: Address,
    ) -> Result<StateLoad<AccountInfo>, DB::Error> {
        self.inner.load_account(&mut self.database, address)
    }

    /// Loads the code of an account, warming it.
    #[inline]
    pub fn load_code(&mut self, address: Address) -> Result<StateLoad<Bytecode>, DB::Error> {
        self.inner.load_code(&mut self.database, address)
    }

    /// Reads a storage slot.
    #[inline]
    pub fn sload(
        &mut self,
        address: Address,
        key: StorageKey,
    ) -> Result<StateLoad<StorageValue>, DB::Error> {
        self.inner.sload(&mut self.database, address, key)
    }

    /// Writes a storage slot.
    #[inline]
    pub fn sstore(
        &mut self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<StateLoad<SStoreResult>, DB::Error> {
        self.inner.sstore(&mut self.database, address, key, value)
    }

    /// Overwrites a balance, recording the old one.
    #[inline]
    pub fn set_balance(&mut self, address: Address, balance: U256) -> Result<(), DB::Error> {
        self.inner.set_balance(&mut self.database, address, balance)
    }

    /// Increments a nonce. Returns the new nonce, `None` on overflow.
    #[inline]
    pub fn inc_nonce(&mut self, address: Address) -> Result<Option<u64>, DB::Error> {
        self.inner.inc_nonce(&mut self.database, address)
    }

    /// Installs code on an account.
    #[inline]
    pub fn set_code(&mut self, address: Address, code: Bytecode) -> Result<(), DB::Error> {
        self.inner.set_code(&mut self.database, address, code)
    }

    /// Transfers value between two accounts.
    #[inline]
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        balance: U256,
    ) -> Result<Option<TransferError>, DB::Error> {
        self.inner.transfer(&mut self.database, from, to, balance)
    }

    /// Creates the account a deployment targets and funds it.
    #[inline]
    pub fn create_account(
        &mut self,
        caller: Address,
        target_address: Address,
        balance: U256,
    ) -> Result<Option<TransferError>, DB::Error> {
        self.inner
            .create_account(&mut self.database, caller, target_address, balance)
    }

    /// Reverts every change recorded after `checkpoint`.
    #[inline]
    pub fn checkpoint_revert(&mut self, checkpoint: JournalCheckpoint) -> Result<(), JournalError> {
        self.inner.checkpoint_revert(&mut self.database, checkpoint)
    }
}

/// Journal invariant violations.
///
/// These are bugs in the caller, never transaction outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JournalError {
    /// The checkpoint is not active and changes were recorded after it.
    #[error(
        "invalid checkpoint {checkpoint:?}: journal has {journal_len} entries and {log_len} logs"
    )]
    InvalidCheckpoint {
        /// The rejected checkpoint.
        checkpoint: JournalCheckpoint,
        /// Journal length at the time of the request.
        journal_len: usize,
        /// Log count at the time of the request.
        log_len: usize,
    },
    /// Reverting did not bring the log list back to the checkpoint position.
    #[error("log list desynchronized: expected {expected} logs, found {found}")]
    LogDesync {
        /// Log position stored in the checkpoint.
        expected: usize,
        /// Logs left after the revert.
        found: usize,
    },
}

/// Transfer and creation error
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferError {
    /// Caller does not have enough funds
    OutOfFunds,
    /// Overflow in target account
    OverflowPayment,
    /// Create collision.
    CreateCollision,
}

/// State load information that contains the data and if the account or storage is cold loaded
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateLoad<T> {
    /// Returned data
    pub data: T,
    /// Is account is cold loaded
    pub is_cold: bool,
}

impl<T> Deref for StateLoad<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> StateLoad<T> {
    /// Returns a new [`StateLoad`] with the given data and cold load status.
    #[inline]
    pub fn new(data: T, is_cold: bool) -> Self {
        Self { data, is_cold }
    }

    /// Maps the data of the [`StateLoad`] to a new value.
    #[inline]
    pub fn map<B, F>(self, f: F) -> StateLoad<B>
    where
        F: FnOnce(T) -> B,
    {
        StateLoad::new(f(self.data), self.is_cold)
    }
}

/// Result of a storage write, with the values SSTORE gas is priced on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SStoreResult {
    /// Value of the storage when it is first read in the transaction
    pub original_value: StorageValue,
    /// Current value of the storage
    pub present_value: StorageValue,
    /// New value that is set
    pub new_value: StorageValue,
}

impl SStoreResult {
    /// Returns `true` if the new value is equal to the present value.
    #[inline]
    pub fn is_new_eq_present(&self) -> bool {
        self.new_value == self.present_value
    }

    /// Returns `true` if the original value is equal to the present value.
    #[inline]
    pub fn is_original_eq_present(&self) -> bool {
        self.original_value == self.present_value
    }

    /// Returns `true` if the original value is equal to the new value.
    #[inline]
    pub fn is_original_eq_new(&self) -> bool {
        self.original_value == self.new_value
    }

    /// Returns `true` if the original value is zero.
    #[inline]
    pub fn is_original_zero(&self) -> bool {
        self.original_value.is_zero()
    }

    /// Returns `true` if the present value is zero.
    #[inline]
    pub fn is_present_zero(&self) -> bool {
        self.present_value.is_zero()
    }

    /// Returns `true` if the new value is zero.
    #[inline]
    pub fn is_new_zero(&self) -> bool {
        self.new_value.is_zero()
    }
}

/// Convenience for reading through the journal without warming anything.
impl<DB: Database> Journal<DB> {
    /// Reads an account without touching the warm set. Unknown accounts read as empty.
    pub fn peek_account(&mut self, address: Address) -> Result<AccountInfo, DB::Error> {
        Ok(self.database.basic(address)?.unwrap_or_default())
    }
}
