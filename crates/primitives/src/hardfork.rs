//! Hardfork identifiers.
#![allow(non_camel_case_types)]

use core::str::FromStr;
pub use SpecId::*;

/// Specification IDs, ordered by activation.
///
/// Gas schedule and validation rules are keyed on these with [`SpecId::is_enabled_in`].
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpecId {
    /// Frontier, block 0.
    FRONTIER = 0,
    /// Homestead, block 1150000.
    HOMESTEAD,
    /// Tangerine Whistle, block 2463000.
    TANGERINE,
    /// Spurious Dragon, block 2675000.
    SPURIOUS_DRAGON,
    /// Byzantium, block 4370000.
    BYZANTIUM,
    /// Petersburg, block 7280000.
    PETERSBURG,
    /// Istanbul, block 9069000.
    ISTANBUL,
    /// Berlin, block 12244000.
    BERLIN,
    /// London, block 12965000.
    LONDON,
    /// Paris/Merge, block 15537394.
    MERGE,
    /// Shanghai, timestamp 1681338455.
    SHANGHAI,
    /// Cancun, timestamp 1710338135.
    #[default]
    CANCUN,
    /// Prague, timestamp 1746612311.
    PRAGUE,
}

impl SpecId {
    /// Returns `true` if the given specification ID is enabled in this spec.
    #[inline]
    pub const fn is_enabled_in(self, other: Self) -> bool {
        self as u8 >= other as u8
    }

    /// Name used in traces and parsed by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            FRONTIER => "Frontier",
            HOMESTEAD => "Homestead",
            TANGERINE => "Tangerine",
            SPURIOUS_DRAGON => "Spurious",
            BYZANTIUM => "Byzantium",
            PETERSBURG => "Petersburg",
            ISTANBUL => "Istanbul",
            BERLIN => "Berlin",
            LONDON => "London",
            MERGE => "Merge",
            SHANGHAI => "Shanghai",
            CANCUN => "Cancun",
            PRAGUE => "Prague",
        }
    }
}

/// Error type for unknown hardfork names. Returned by [`SpecId::from_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnknownHardfork;

impl core::fmt::Display for UnknownHardfork {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("unknown hardfork")
    }
}

impl std::error::Error for UnknownHardfork {}

impl FromStr for SpecId {
    type Err = UnknownHardfork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            FRONTIER,
            HOMESTEAD,
            TANGERINE,
            SPURIOUS_DRAGON,
            BYZANTIUM,
            PETERSBURG,
            ISTANBUL,
            BERLIN,
            LONDON,
            MERGE,
            SHANGHAI,
            CANCUN,
            PRAGUE,
        ]
        .into_iter()
        .find(|spec| spec.name().eq_ignore_ascii_case(s))
        .ok_or(UnknownHardfork)
    }
}

impl core::fmt::Display for SpecId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        assert!(CANCUN.is_enabled_in(LONDON));
        assert!(CANCUN.is_enabled_in(CANCUN));
        assert!(!BERLIN.is_enabled_in(LONDON));
    }

    #[test]
    fn parse_names() {
        assert_eq!("cancun".parse::<SpecId>(), Ok(CANCUN));
        assert_eq!(PRAGUE.to_string().parse::<SpecId>(), Ok(PRAGUE));
        assert_eq!("Osaka".parse::<SpecId>(), Err(UnknownHardfork));
    }
}
