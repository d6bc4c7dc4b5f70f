//! Execution environment, journal and results.
//!
//! [`Context`] bundles the [`Env`] of a transaction with the [`Journal`] that records every
//! state change made to the underlying database.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod block;
pub mod cfg;
pub mod context;
pub mod journal;
pub mod result;
pub mod tx;

pub use block::{BlobExcessGasAndPrice, BlockEnv};
pub use cfg::CfgEnv;
pub use context::{Context, ContextError, Env};
pub use journal::{
    Journal, JournalCheckpoint, JournalEntry, JournalError, JournalInner, SStoreResult, StateLoad,
    TransferError,
};
pub use result::{EvmError, ExecutionResult, HaltReason, InvalidTransaction, Output, SuccessReason};
pub use tx::{AccessListItem, TxEnv};
