use core::fmt;
use primitives::{keccak256, Bytes, B256, KECCAK_EMPTY};

/// Immutable contract code.
///
/// Cloning is cheap: the underlying buffer is reference counted, so two accounts with the
/// same code hash share one allocation when the store hands out clones of the same value.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "Bytes", into = "Bytes")
)]
pub struct Bytecode(Bytes);

impl Bytecode {
    /// Creates a new bytecode from raw bytes.
    #[inline]
    pub fn new_raw(bytes: Bytes) -> Self {
        Self(bytes)
    }

    /// Calculates the hash of the code. Returns [`KECCAK_EMPTY`] for empty code.
    pub fn hash_slow(&self) -> B256 {
        if self.is_empty() {
            KECCAK_EMPTY
        } else {
            keccak256(&self.0)
        }
    }

    /// Returns a reference to the code bytes.
    #[inline]
    pub fn bytes_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns a shared handle to the code bytes.
    #[inline]
    pub fn original_bytes(&self) -> Bytes {
        self.0.clone()
    }

    /// Code length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there is no code.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if both values point into the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.0.as_ptr() == other.0.as_ptr() && self.len() == other.len()
    }
}

impl fmt::Debug for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytecode({:?})", self.0)
    }
}

impl From<Bytes> for Bytecode {
    fn from(bytes: Bytes) -> Self {
        Self::new_raw(bytes)
    }
}

impl From<Bytecode> for Bytes {
    fn from(code: Bytecode) -> Self {
        code.0
    }
}

impl From<Vec<u8>> for Bytecode {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new_raw(bytes.into())
    }
}

impl From<&'static [u8]> for Bytecode {
    fn from(bytes: &'static [u8]) -> Self {
        Self::new_raw(Bytes::from_static(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_code_hashes_to_sentinel() {
        assert_eq!(Bytecode::default().hash_slow(), KECCAK_EMPTY);
    }

    #[test]
    fn clones_share_buffer() {
        let code = Bytecode::from(vec![0x60, 0x01, 0x00]);
        let other = code.clone();
        assert!(code.ptr_eq(&other));
        assert_eq!(code.hash_slow(), keccak256([0x60, 0x01, 0x00]));
    }
}
