//! Account and code types stored by the simevm account store.
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod account_info;
mod bytecode;

pub use account_info::AccountInfo;
pub use bytecode::Bytecode;

use primitives::{HashMap, StorageKey, StorageValue};

/// Storage of a single account, keyed by slot.
pub type Storage = HashMap<StorageKey, StorageValue>;
