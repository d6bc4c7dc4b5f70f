//! # simevm
//!
//! Journaled state-transition engine for simulating EVM transactions.
//!
//! [`Engine`] owns an in-memory [`AccountStore`](database::AccountStore), optionally backed by a
//! fork [`StateProvider`](database_interface::StateProvider), and executes message calls and
//! deployments against it. Every change is recorded in a journal, so callers can take snapshots
//! and revert speculative execution.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod engine;

// reexport dependencies
pub use context;
pub use database;
pub use database_interface;
pub use handler;
pub use inspector;
pub use interpreter;
pub use primitives;
pub use state;

pub use engine::{Engine, EngineError, EngineOpts};
