use crate::Bytecode;
use core::hash::{Hash, Hasher};
use primitives::{B256, KECCAK_EMPTY, U256};

/// Account information that contains balance, nonce, code hash and code
///
/// Code is optional. When it is `None` the code is resolved through `code_hash`.
#[derive(Clone, Debug, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccountInfo {
    /// Account balance
    pub balance: U256,
    /// Account nonce
    pub nonce: u64,
    /// Code hash
    pub code_hash: B256,
    /// [`Bytecode`] associated with this account
    pub code: Option<Bytecode>,
}

impl Default for AccountInfo {
    fn default() -> Self {
        Self {
            balance: U256::ZERO,
            code_hash: KECCAK_EMPTY,
            code: Some(Bytecode::default()),
            nonce: 0,
        }
    }
}

impl PartialEq for AccountInfo {
    fn eq(&self, other: &Self) -> bool {
        self.balance == other.balance
            && self.nonce == other.nonce
            && self.code_hash == other.code_hash
    }
}

impl Hash for AccountInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.balance.hash(state);
        self.nonce.hash(state);
        self.code_hash.hash(state);
    }
}

impl AccountInfo {
    /// Creates a new [`AccountInfo`] with the given fields.
    #[inline]
    pub fn new(balance: U256, nonce: u64, code_hash: B256, code: Bytecode) -> Self {
        Self {
            balance,
            nonce,
            code: Some(code),
            code_hash,
        }
    }

    /// Creates an account holding only a balance.
    #[inline]
    pub fn from_balance(balance: U256) -> Self {
        Self {
            balance,
            ..Default::default()
        }
    }

    /// Replaces the code, recomputing the code hash.
    pub fn with_code(self, code: Bytecode) -> Self {
        Self {
            balance: self.balance,
            nonce: self.nonce,
            code_hash: code.hash_slow(),
            code: Some(code),
        }
    }

    /// Replaces the balance.
    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    /// Replaces the nonce.
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Sets code and its hash.
    pub fn set_code_and_hash(&mut self, code: Bytecode) {
        self.code_hash = code.hash_slow();
        self.code = Some(code);
    }

    /// Returns a copy of this account with the [`Bytecode`] removed.
    #[inline]
    pub fn copy_without_code(&self) -> Self {
        Self {
            balance: self.balance,
            nonce: self.nonce,
            code_hash: self.code_hash,
            code: None,
        }
    }

    /// Returns `true` if the account has no code, zero nonce and zero balance (EIP-161).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.has_no_code_and_nonce()
    }

    /// Returns `true` if the code hash is the empty sentinel or zero.
    #[inline]
    pub fn is_empty_code_hash(&self) -> bool {
        self.code_hash == KECCAK_EMPTY || self.code_hash == B256::ZERO
    }

    /// Returns `true` if the account has neither code nor a nonce.
    ///
    /// Such an address is a valid deployment target.
    #[inline]
    pub fn has_no_code_and_nonce(&self) -> bool {
        self.is_empty_code_hash() && self.nonce == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitives::keccak256;

    #[test]
    fn equality_ignores_code_body() {
        let code = Bytecode::from(vec![0x00]);
        let with = AccountInfo::default().with_code(code);
        let without = with.copy_without_code();
        assert_eq!(with, without);
        assert_eq!(with.code_hash, keccak256([0x00]));
    }

    #[test]
    fn emptiness() {
        assert!(AccountInfo::default().is_empty());
        assert!(!AccountInfo::from_balance(U256::from(1)).is_empty());
        assert!(!AccountInfo::default().with_nonce(1).has_no_code_and_nonce());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_keeps_code() {
        let info = AccountInfo::default().with_code(Bytecode::from(vec![0x60, 0x00]));
        let json = serde_json::to_string(&info).unwrap();
        let back: AccountInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, info.code);
    }
}
