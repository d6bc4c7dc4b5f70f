use primitives::{B256, BLOCK_HASH_HISTORY};

const RING_LEN: usize = BLOCK_HASH_HISTORY as usize;

/// Fixed-size ring of recent block hashes, indexed by `number % BLOCK_HASH_HISTORY`.
///
/// Each slot remembers which block it holds, so a stale slot never answers for a newer number.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockHashRing {
    slots: Vec<Option<(u64, B256)>>,
}

impl Default for BlockHashRing {
    fn default() -> Self {
        Self {
            slots: vec![None; RING_LEN],
        }
    }
}

impl BlockHashRing {
    /// Stores `hash` for block `number`, evicting whatever occupied its slot.
    pub fn insert(&mut self, number: u64, hash: B256) {
        self.slots[Self::index(number)] = Some((number, hash));
    }

    /// Returns the hash of block `number` if it is held.
    pub fn get(&self, number: u64) -> Option<B256> {
        match self.slots[Self::index(number)] {
            Some((held, hash)) if held == number => Some(hash),
            _ => None,
        }
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Returns `true` if no hash is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn index(number: u64) -> usize {
        (number % BLOCK_HASH_HISTORY) as usize
    }
}
