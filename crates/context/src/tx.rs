//! This module contains [`TxEnv`].
use primitives::{eip4844::GAS_PER_BLOB, Address, Bytes, TxKind, B256, U256};

/// One entry of an EIP-2930 access list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessListItem {
    /// Account to warm.
    pub address: Address,
    /// Storage keys of `address` to warm.
    pub storage_keys: Vec<B256>,
}

/// The transaction environment
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TxEnv {
    /// Caller aka Author aka transaction signer
    pub caller: Address,
    /// The gas limit of the transaction
    pub gas_limit: u64,
    /// The gas price of the transaction
    ///
    /// For EIP-1559 transactions this is the max fee per gas.
    pub gas_price: u128,
    /// The destination of the transaction
    pub kind: TxKind,
    /// The value sent to the destination
    pub value: U256,
    /// The data of the transaction
    pub data: Bytes,
    /// The nonce of the transaction
    ///
    /// If set to [`None`], the nonce is not checked.
    pub nonce: Option<u64>,
    /// The chain ID of the transaction
    ///
    /// If set to [`None`], no checks are performed.
    pub chain_id: Option<u64>,
    /// Salt for a create transaction. When set, the address is derived `CREATE2` style.
    pub salt: Option<U256>,
    /// A list of addresses and storage keys that the transaction plans to access
    ///
    /// Added in [EIP-2930].
    ///
    /// [EIP-2930]: https://eips.ethereum.org/EIPS/eip-2930
    pub access_list: Vec<AccessListItem>,
    /// The priority fee per gas
    ///
    /// Incorporated as part of the London upgrade via [EIP-1559].
    ///
    /// [EIP-1559]: https://eips.ethereum.org/EIPS/eip-1559
    pub gas_priority_fee: Option<u128>,
    /// The list of blob versioned hashes
    ///
    /// Incorporated as part of the Cancun upgrade via [EIP-4844].
    ///
    /// [EIP-4844]: https://eips.ethereum.org/EIPS/eip-4844
    pub blob_hashes: Vec<B256>,
    /// The max fee per blob gas
    pub max_fee_per_blob_gas: u128,
}

impl Default for TxEnv {
    fn default() -> Self {
        Self {
            caller: Address::ZERO,
            gas_limit: u64::MAX,
            gas_price: 0,
            kind: TxKind::Call(Address::ZERO),
            value: U256::ZERO,
            data: Bytes::default(),
            nonce: None,
            chain_id: None,
            salt: None,
            access_list: Vec::new(),
            gas_priority_fee: None,
            blob_hashes: Vec::new(),
            max_fee_per_blob_gas: 0,
        }
    }
}

impl TxEnv {
    /// Returns `true` if the transaction deploys a contract.
    #[inline]
    pub fn is_create(&self) -> bool {
        self.kind.is_create()
    }

    /// Total blob gas consumed by the blobs of this transaction.
    #[inline]
    pub fn total_blob_gas(&self) -> u64 {
        GAS_PER_BLOB * self.blob_hashes.len() as u64
    }

    /// Number of accounts and storage keys in the access list.
    pub fn access_list_nums(&self) -> (u64, u64) {
        let accounts = self.access_list.len() as u64;
        let keys = self
            .access_list
            .iter()
            .map(|item| item.storage_keys.len() as u64)
            .sum();
        (accounts, keys)
    }
}
