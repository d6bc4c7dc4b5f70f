//! Database interface.
//!
//! [`Database`] is what the journal reads through, [`DatabaseMut`] is the raw write path the
//! journal uses to apply and undo its entries, and [`StateProvider`] is the read-only fallback
//! consulted for state that is not cached locally.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use core::convert::Infallible;

use auto_impl::auto_impl;
use primitives::{Address, StorageKey, StorageValue, B256, U256};
use state::{AccountInfo, Bytecode};

pub mod provider;

pub use provider::{ForkBlock, ParseForkBlockError, ProviderError, SharedProvider, StateProvider};

/// Database error marker is needed to implement From conversion for Error type.
pub trait DBErrorMarker: core::error::Error + Send + Sync + 'static {}

impl DBErrorMarker for Infallible {}
impl DBErrorMarker for ProviderError {}

/// EVM database interface.
#[auto_impl(&mut, Box)]
pub trait Database {
    /// The database error type.
    type Error: DBErrorMarker;

    /// Gets basic account information.
    fn basic(&mut self, address: Address) -> Result<Option<AccountInfo>, Self::Error>;

    /// Gets account code by its hash.
    fn code_by_hash(&mut self, code_hash: B256) -> Result<Bytecode, Self::Error>;

    /// Gets storage value of address at index.
    fn storage(&mut self, address: Address, index: StorageKey)
        -> Result<StorageValue, Self::Error>;

    /// Gets block hash by block number.
    fn block_hash(&mut self, number: u64) -> Result<B256, Self::Error>;
}

/// Direct mutation of the stored state.
///
/// None of these methods record anything: journaling is the caller's job.
#[auto_impl(&mut, Box)]
pub trait DatabaseMut: Database {
    /// Overwrites the balance of `address`.
    fn set_balance(&mut self, address: Address, balance: U256);

    /// Overwrites the nonce of `address`.
    fn set_nonce(&mut self, address: Address, nonce: u64);

    /// Installs `code` on `address`, registering it by hash.
    fn set_code(&mut self, address: Address, code: Bytecode);

    /// Points `address` at code that is already registered under `code_hash`.
    fn set_code_hash(&mut self, address: Address, code_hash: B256);

    /// Overwrites a single storage slot.
    fn set_storage(&mut self, address: Address, key: StorageKey, value: StorageValue);

    /// Marks `address` as freshly created.
    ///
    /// Returns `true` if a record for the address already existed.
    fn create_account(&mut self, address: Address) -> bool;

    /// Drops the record of `address` so that it reads as never having existed.
    fn remove_account(&mut self, address: Address);
}
