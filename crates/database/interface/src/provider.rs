//! Read-only fallback state source.
use core::str::FromStr;
use primitives::{hex, Address, StorageKey, StorageValue, B256};
use state::AccountInfo;
use std::sync::Arc;

/// Errors raised by a [`StateProvider`].
///
/// These are never retried by the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The remote source could not be reached or answered with a transport failure.
    #[error("provider transport error: {0}")]
    Transport(String),
    /// The remote source answered with data that could not be decoded.
    #[error("malformed provider response: {0}")]
    Decode(String),
    /// Any other provider failure.
    #[error("{0}")]
    Other(String),
}

/// Fallback source of account, storage and block-hash data for addresses not cached locally.
///
/// Implementations are typically backed by a remote node pinned at a [`ForkBlock`]. They are
/// shared by reference, never mutated by the engine, and must be safe for concurrent reads.
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait StateProvider: Send + Sync {
    /// Fetches an account. `Ok(None)` means the account does not exist at the pinned block.
    ///
    /// Returned accounts should carry their code inline.
    fn fetch_account(&self, address: Address) -> Result<Option<AccountInfo>, ProviderError>;

    /// Fetches a storage slot, zero when unset.
    fn fetch_storage(&self, address: Address, key: StorageKey)
        -> Result<StorageValue, ProviderError>;

    /// Fetches the hash of block `number`.
    fn fetch_block_hash(&self, number: u64) -> Result<B256, ProviderError>;

    /// Block this provider is pinned to.
    fn fork_block(&self) -> ForkBlock {
        ForkBlock::Latest
    }
}

/// Shared handle to a provider.
pub type SharedProvider = Arc<dyn StateProvider>;

/// Point in chain history a provider reads from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ForkBlock {
    /// Most recent block.
    #[default]
    Latest,
    /// Most recent finalized block.
    Finalized,
    /// Most recent safe block.
    Safe,
    /// Genesis.
    Earliest,
    /// Pending block.
    Pending,
    /// Block by number.
    Number(u64),
    /// Block by hash.
    Hash(B256),
}

/// Error parsing a [`ForkBlock`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid block identifier: {0:?}")]
pub struct ParseForkBlockError(pub String);

impl FromStr for ForkBlock {
    type Err = ParseForkBlockError;

    /// Accepts a tag (`latest`, `finalized`, `safe`, `earliest`, `pending`), a 32-byte hex hash
    /// or a decimal or `0x` prefixed block number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseForkBlockError(s.to_string());
        match s {
            "latest" => return Ok(Self::Latest),
            "finalized" => return Ok(Self::Finalized),
            "safe" => return Ok(Self::Safe),
            "earliest" => return Ok(Self::Earliest),
            "pending" => return Ok(Self::Pending),
            _ => {}
        }
        match s.strip_prefix("0x") {
            Some(digits) if digits.len() == 64 => {
                let bytes = hex::decode(digits).map_err(|_| err())?;
                Ok(Self::Hash(B256::from_slice(&bytes)))
            }
            Some(digits) => u64::from_str_radix(digits, 16)
                .map(Self::Number)
                .map_err(|_| err()),
            None => s.parse().map(Self::Number).map_err(|_| err()),
        }
    }
}

impl From<u64> for ForkBlock {
    fn from(number: u64) -> Self {
        Self::Number(number)
    }
}

impl From<B256> for ForkBlock {
    fn from(hash: B256) -> Self {
        Self::Hash(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tags_numbers_and_hashes() {
        assert_eq!("latest".parse(), Ok(ForkBlock::Latest));
        assert_eq!("safe".parse(), Ok(ForkBlock::Safe));
        assert_eq!("16148323".parse(), Ok(ForkBlock::Number(16148323)));
        assert_eq!("0x10".parse(), Ok(ForkBlock::Number(16)));
        let hash = format!("0x{}", "ab".repeat(32));
        assert_eq!(
            hash.parse(),
            Ok(ForkBlock::Hash(B256::repeat_byte(0xab)))
        );
        assert!("tomorrow".parse::<ForkBlock>().is_err());
    }
}
