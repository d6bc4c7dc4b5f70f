//! # simevm-handler
//!
//! The call executor: transaction validation, the setup charged before execution, nested call
//! and create frames, and the settlement that turns the first frame into an
//! [`ExecutionResult`](context::ExecutionResult).
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod evm;
pub mod frame;
pub mod post_execution;
pub mod pre_execution;
pub mod validation;

pub use evm::Evm;
pub use frame::{Frame, FrameResult};
