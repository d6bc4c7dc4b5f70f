//! EIP-4844 constants and blob gas pricing.

/// Gas consumption of a single data blob (== blob byte size).
pub const GAS_PER_BLOB: u64 = 1 << 17;

/// Min blob gas price.
pub const MIN_BLOB_GASPRICE: u64 = 1;

/// Max number of blobs per block (Cancun).
pub const MAX_BLOB_NUMBER_PER_BLOCK_CANCUN: u64 = 6;

/// Max number of blobs per block (Prague).
pub const MAX_BLOB_NUMBER_PER_BLOCK_PRAGUE: u64 = 9;

/// Controls the maximum rate of change for blob gas price (Cancun).
pub const BLOB_BASE_FEE_UPDATE_FRACTION_CANCUN: u64 = 3_338_477;

/// Controls the maximum rate of change for blob gas price (Prague).
pub const BLOB_BASE_FEE_UPDATE_FRACTION_PRAGUE: u64 = 5_007_716;

/// First version of the blob versioned hash.
pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

/// Calculates the blob gas price from the header's excess blob gas field.
///
/// See the definition in [EIP-4844](https://eips.ethereum.org/EIPS/eip-4844#helpers).
#[inline]
pub fn calc_blob_gasprice(excess_blob_gas: u64, is_prague: bool) -> u128 {
    let update_fraction = if is_prague {
        BLOB_BASE_FEE_UPDATE_FRACTION_PRAGUE
    } else {
        BLOB_BASE_FEE_UPDATE_FRACTION_CANCUN
    };
    fake_exponential(MIN_BLOB_GASPRICE, excess_blob_gas, update_fraction)
}

/// Approximates `factor * e ** (numerator / denominator)` using Taylor expansion.
///
/// # Panics
///
/// Panics if `denominator` is zero.
#[inline]
pub fn fake_exponential(factor: u64, numerator: u64, denominator: u64) -> u128 {
    assert_ne!(denominator, 0, "attempt to divide by zero");
    let factor = factor as u128;
    let numerator = numerator as u128;
    let denominator = denominator as u128;

    let mut i = 1;
    let mut output = 0;
    let mut numerator_accum = factor * denominator;
    while numerator_accum > 0 {
        output += numerator_accum;

        // Denominator is asserted as not zero at the start of the function.
        numerator_accum = (numerator_accum * numerator) / (denominator * i);
        i += 1;
    }
    output / denominator
}
