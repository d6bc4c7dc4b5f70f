//! This module contains [`CfgEnv`].
use primitives::{eip170, eip3860, eip4844, hardfork::SpecId, CALL_STACK_LIMIT, MEMORY_LIMIT};

/// EVM configuration
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CfgEnv {
    /// Chain ID of the EVM. Used in CHAINID opcode and transaction's chain ID check.
    ///
    /// Chain ID is introduced EIP-155.
    pub chain_id: u64,
    /// Specification for EVM represent the hardfork
    pub spec: SpecId,
    /// Contract code size limit override.
    ///
    /// If None, the EIP-170 limit is used. Useful to increase this because of tests.
    pub limit_contract_code_size: Option<usize>,
    /// Maximum frame depth. Frames deeper than this halt with `CallTooDeep`.
    pub call_stack_limit: usize,
    /// Largest memory a single frame may grow to, in bytes.
    ///
    /// Growing past it halts with `MemoryLimitOOG` whatever gas is left.
    pub memory_limit: u64,
    /// Skips the nonce validation against the account's nonce
    pub disable_nonce_check: bool,
    /// Skips the base fee check of the transaction gas price.
    pub disable_base_fee: bool,
}

impl CfgEnv {
    /// Creates a new configuration for `spec` with default values.
    pub fn new_with_spec(spec: SpecId) -> Self {
        Self {
            spec,
            ..Default::default()
        }
    }

    /// Sets the chain id.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Maximum size of deployed code.
    pub fn max_code_size(&self) -> usize {
        self.limit_contract_code_size
            .unwrap_or(eip170::MAX_CODE_SIZE)
    }

    /// Maximum size of init code, twice the code size limit.
    pub fn max_initcode_size(&self) -> usize {
        self.limit_contract_code_size
            .map(|limit| limit.saturating_mul(2))
            .unwrap_or(eip3860::MAX_INITCODE_SIZE)
    }

    /// Maximum number of blobs a transaction may carry.
    pub fn max_blobs_per_tx(&self) -> u64 {
        if self.spec.is_enabled_in(SpecId::PRAGUE) {
            eip4844::MAX_BLOB_NUMBER_PER_BLOCK_PRAGUE
        } else {
            eip4844::MAX_BLOB_NUMBER_PER_BLOCK_CANCUN
        }
    }
}

impl Default for CfgEnv {
    fn default() -> Self {
        Self {
            chain_id: 1,
            spec: SpecId::default(),
            limit_contract_code_size: None,
            call_stack_limit: CALL_STACK_LIMIT,
            memory_limit: MEMORY_LIMIT,
            disable_nonce_check: false,
            disable_base_fee: false,
        }
    }
}
