use core::cmp::min;
use primitives::U256;

/// Byte-addressed, word-aligned frame memory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Creates empty memory.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current size in bytes, always a multiple of 32.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing has been touched.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Grows memory to `new_size` bytes, zero filled. Never shrinks.
    #[inline]
    pub fn resize(&mut self, new_size: usize) {
        if new_size > self.data.len() {
            self.data.resize(new_size, 0);
        }
    }

    /// Returns a byte slice of the memory region at the given offset.
    ///
    /// # Panics
    ///
    /// Panics on out of bounds; callers resize first.
    #[inline]
    pub fn slice_len(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    /// Reads a 32-byte word.
    #[inline]
    pub fn get_u256(&self, offset: usize) -> U256 {
        U256::from_be_slice(self.slice_len(offset, 32))
    }

    /// Writes a byte.
    #[inline]
    pub fn set_byte(&mut self, offset: usize, byte: u8) {
        self.data[offset] = byte;
    }

    /// Writes a 32-byte word.
    #[inline]
    pub fn set_u256(&mut self, offset: usize, value: U256) {
        self.set(offset, &value.to_be_bytes::<32>());
    }

    /// Copies `value` into memory at `offset`.
    #[inline]
    pub fn set(&mut self, offset: usize, value: &[u8]) {
        if !value.is_empty() {
            self.data[offset..offset + value.len()].copy_from_slice(value);
        }
    }

    /// Copies `len` bytes of `data` starting at `data_offset` into memory at `memory_offset`.
    ///
    /// Bytes past the end of `data` are written as zero.
    #[inline]
    pub fn set_data(&mut self, memory_offset: usize, data_offset: usize, len: usize, data: &[u8]) {
        if len == 0 {
            return;
        }
        let start = min(data_offset, data.len());
        let end = min(data_offset.saturating_add(len), data.len());
        let available = end - start;
        self.data[memory_offset..memory_offset + available].copy_from_slice(&data[start..end]);
        self.data[memory_offset + available..memory_offset + len].fill(0);
    }

    /// Copies `len` bytes within memory, handling overlap.
    #[inline]
    pub fn copy(&mut self, dst: usize, src: usize, len: usize) {
        self.data.copy_within(src..src + len, dst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_data_pads_with_zero() {
        let mut memory = Memory::new();
        memory.resize(32);
        memory.set(0, &[0xff; 32]);
        memory.set_data(0, 1, 4, &[1, 2, 3]);
        assert_eq!(memory.slice_len(0, 5), &[2, 3, 0, 0, 0xff]);
    }

    #[test]
    fn words_round_trip() {
        let mut memory = Memory::new();
        memory.resize(64);
        memory.set_u256(16, U256::from(0xabcdu64));
        assert_eq!(memory.get_u256(16), U256::from(0xabcdu64));
        memory.copy(0, 16, 32);
        assert_eq!(memory.get_u256(0), U256::from(0xabcdu64));
    }
}
