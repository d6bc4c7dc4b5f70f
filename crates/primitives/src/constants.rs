use alloy_primitives::{b256, B256};

/// Number of block hashes that EVM can access in the past.
pub const BLOCK_HASH_HISTORY: u64 = 256;

/// Maximum call depth. A frame deeper than this halts with `CallTooDeep`.
pub const CALL_STACK_LIMIT: usize = 1024;

/// Default maximum size of a frame's memory in bytes.
pub const MEMORY_LIMIT: u64 = (1 << 32) - 1;

/// Hash of empty bytecode, `keccak256([])`.
pub const KECCAK_EMPTY: B256 =
    b256!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470");

/// Maximum number of items on the operand stack.
pub const STACK_LIMIT: usize = 1024;
