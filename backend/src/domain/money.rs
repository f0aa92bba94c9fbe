//! Monetary amounts in the smallest currency unit.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Non-negative amount expressed in the smallest currency unit.
///
/// Prices and invoice totals never pass through floating point; the wire
/// format is a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw minor-unit value.
    #[must_use]
    pub const fn new(minor_units: u64) -> Self {
        Self(minor_units)
    }

    /// Raw minor-unit value.
    #[must_use]
    pub const fn minor_units(self) -> u64 {
        self.0
    }

    /// True when the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Amount {
    fn from(minor_units: u64) -> Self {
        Self(minor_units)
    }
}
