//! Database implementations.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub use database_interface::*;

mod block_hashes;
pub mod store;

pub use block_hashes::BlockHashRing;
pub use store::{AccountState, AccountStore, Cache, DbAccount};
