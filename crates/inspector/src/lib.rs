//! Hooks into execution and the EIP-3155 tracer built on them.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod eip3155;
mod gas;
mod inspector;
mod noop;

pub use inspector::Inspector;

/// [Inspector] implementations.
pub mod inspectors {
    pub use super::eip3155::TracerEip3155;
    pub use super::gas::GasInspector;
    pub use super::noop::NoOpInspector;
}
