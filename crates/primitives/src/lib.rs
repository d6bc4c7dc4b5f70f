//! # simevm-primitives
//!
//! Value types, protocol constants and hardfork identifiers shared by every simevm crate.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;
pub mod eip170;
pub mod eip3860;
pub mod eip4844;
pub mod hardfork;

pub use alloy_primitives::{
    self, address, b256, bytes, fixed_bytes, hex, keccak256,
    map::{self, hash_map, hash_set, HashMap, HashSet},
    Address, Bytes, FixedBytes, Log, LogData, TxKind, B256, I256, U256,
};
pub use constants::*;

/// Type alias for EVM storage keys.
pub type StorageKey = U256;

/// Type alias for EVM storage values.
pub type StorageValue = U256;
