//! EIP-170: Contract code size limit

/// Maximum size of deployed code, `0x6000` (24576 bytes).
pub const MAX_CODE_SIZE: usize = 0x6000;
