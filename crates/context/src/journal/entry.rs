//! Journal entries and their inverse operations.
//!
//! Every state mutation made through the journal pushes one [`JournalEntry`] carrying the prior
//! value it overwrote. Reverting a checkpoint pops entries back to the checkpoint position and
//! applies [`JournalEntry::revert`] to each of them, newest first.

use super::inner::{TransientStorage, WarmSet};
use database_interface::DatabaseMut;
use primitives::{Address, Log, StorageKey, StorageValue, B256, U256};

/// Journal entries that are used to track changes to the state and are used to revert it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JournalEntry {
    /// Account marked as freshly created by a deployment.
    /// Action: Clear the account record for the new contract.
    /// Revert: Drop the record again if there was none before.
    AccountCreated {
        /// Address of the created account.
        address: Address,
        /// Whether a non-empty record existed before creation.
        had_account: bool,
    },
    /// Balance changed
    /// Action: Balance changed
    /// Revert: Revert to previous balance
    BalanceChange {
        /// Address of account that had its balance changed.
        address: Address,
        /// Balance before the change.
        old_balance: U256,
    },
    /// Nonce changed
    /// Action: Nonce set, usually incremented by one
    /// Revert: Restore the previous nonce
    NonceChange {
        /// Address of account that had its nonce changed.
        address: Address,
        /// Nonce before the change.
        old_nonce: u64,
    },
    /// Code changed
    /// Action: Account code changed
    /// Revert: Point the account back at its previous code hash.
    CodeChange {
        /// Address of account that had its code changed.
        address: Address,
        /// Code hash before the change.
        had_code_hash: B256,
    },
    /// Entry used to track storage changes
    /// Action: Storage change
    /// Revert: Revert to previous value
    StorageChanged {
        /// Address of account that had its storage changed.
        address: Address,
        /// Key of storage slot that is changed.
        key: StorageKey,
        /// Previous value of storage slot.
        had_value: StorageValue,
    },
    /// Account touched for the first time in the transaction (EIP-2929).
    /// Action: Mark account warm
    /// Revert: Mark account cold
    AccountWarmed {
        /// Address of warmed account.
        address: Address,
    },
    /// Entry used to track storage warming introduced by EIP-2929.
    /// Action: Storage warmed
    /// Revert: Revert to cold state
    StorageWarmed {
        /// Address of account that had its storage warmed.
        address: Address,
        /// Key of storage slot that is warmed.
        key: StorageKey,
    },
    /// It is used to track an EIP-1153 transient storage change.
    /// Action: Transient storage changed.
    /// Revert: Revert to previous value.
    TransientStorageChange {
        /// Address of account that had its transient storage changed.
        address: Address,
        /// Key of transient storage slot that is changed.
        key: StorageKey,
        /// Previous value of transient storage slot.
        had_value: StorageValue,
    },
    /// Log appended to the log list.
    /// Action: Push log
    /// Revert: Pop log
    LogEmitted,
}

impl JournalEntry {
    /// Undoes the entry.
    ///
    /// State lives in three places: the database for accounts and storage, and the journal's own
    /// warm set, transient storage and log list.
    pub(crate) fn revert<DB: DatabaseMut>(
        self,
        db: &mut DB,
        warm: &mut WarmSet,
        transient_storage: &mut TransientStorage,
        logs: &mut Vec<Log>,
    ) {
        match self {
            JournalEntry::AccountCreated {
                address,
                had_account,
            } => {
                if !had_account {
                    db.remove_account(address);
                }
            }
            JournalEntry::BalanceChange {
                address,
                old_balance,
            } => db.set_balance(address, old_balance),
            JournalEntry::NonceChange { address, old_nonce } => db.set_nonce(address, old_nonce),
            JournalEntry::CodeChange {
                address,
                had_code_hash,
            } => db.set_code_hash(address, had_code_hash),
            JournalEntry::StorageChanged {
                address,
                key,
                had_value,
            } => db.set_storage(address, key, had_value),
            JournalEntry::AccountWarmed { address } => {
                warm.addresses.remove(&address);
            }
            JournalEntry::StorageWarmed { address, key } => {
                warm.slots.remove(&(address, key));
            }
            JournalEntry::TransientStorageChange {
                address,
                key,
                had_value,
            } => {
                let tkey = (address, key);
                if had_value.is_zero() {
                    // if previous value is zero, remove it
                    transient_storage.remove(&tkey);
                } else {
                    // if not zero, reinsert old value to transient storage.
                    transient_storage.insert(tkey, had_value);
                }
            }
            JournalEntry::LogEmitted => {
                logs.pop();
            }
        }
    }
}
