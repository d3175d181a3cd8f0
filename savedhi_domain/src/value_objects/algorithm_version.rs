// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Algorithm Version Value Object
//!
//! This module defines the algorithm version value object for the savedhi
//! engine. Versions form a closed, ordered set; every derivation and every
//! marshalled record pins one, and credentials only reproduce when re-derived
//! at the version they were created with.
//!
//! ## Version History
//!
//! - **V0**: the original release. Length prefixes in salts count UTF-8
//!   codepoints, and the template seed bytes are widened to big-endian u16
//!   values before modular reduction.
//! - **V1**: template seed bytes are used as plain bytes.
//! - **V2**: the site name and key context are measured in UTF-8 bytes.
//! - **V3** (current): the user name is measured in UTF-8 bytes as well.
//!
//! The divergences are implemented by the versioned algorithm engines; this
//! value object only identifies a version and validates the range.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::SavedhiError;

/// Version of the derivation algorithm, pinned per operation.
///
/// Immutable once attached to a key or a marshalled record. The numeric
/// values are contractual: they appear in both wire shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum AlgorithmVersion {
    V0 = 0,
    V1 = 1,
    V2 = 2,
    V3 = 3,
}

impl AlgorithmVersion {
    /// The oldest supported version.
    pub const FIRST: AlgorithmVersion = AlgorithmVersion::V0;

    /// The newest supported version; the default for new users and sites.
    pub const CURRENT: AlgorithmVersion = AlgorithmVersion::V3;

    /// Numeric wire value of this version.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// The version this one inherits unchanged behavior from, if any.
    pub fn previous(self) -> Option<AlgorithmVersion> {
        match self {
            AlgorithmVersion::V0 => None,
            AlgorithmVersion::V1 => Some(AlgorithmVersion::V0),
            AlgorithmVersion::V2 => Some(AlgorithmVersion::V1),
            AlgorithmVersion::V3 => Some(AlgorithmVersion::V2),
        }
    }
}

impl Default for AlgorithmVersion {
    fn default() -> Self {
        AlgorithmVersion::CURRENT
    }
}

impl TryFrom<u32> for AlgorithmVersion {
    type Error = SavedhiError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AlgorithmVersion::V0),
            1 => Ok(AlgorithmVersion::V1),
            2 => Ok(AlgorithmVersion::V2),
            3 => Ok(AlgorithmVersion::V3),
            other => Err(SavedhiError::UnsupportedVersion(format!(
                "algorithm version {} outside {}..={}",
                other,
                AlgorithmVersion::FIRST.as_u32(),
                AlgorithmVersion::CURRENT.as_u32()
            ))),
        }
    }
}

impl Display for AlgorithmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests the numeric round trip over the full version range.
    #[test]
    fn test_version_numeric_round_trip() {
        for value in 0u32..=3 {
            let version = AlgorithmVersion::try_from(value).unwrap();
            assert_eq!(version.as_u32(), value);
        }
    }

    /// Tests that out-of-range versions are rejected with the
    /// unsupported-version error kind.
    #[test]
    fn test_version_out_of_range() {
        assert!(matches!(
            AlgorithmVersion::try_from(4),
            Err(SavedhiError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            AlgorithmVersion::try_from(u32::MAX),
            Err(SavedhiError::UnsupportedVersion(_))
        ));
    }

    /// Tests the delegation chain V3 -> V2 -> V1 -> V0.
    #[test]
    fn test_version_previous_chain() {
        assert_eq!(AlgorithmVersion::V3.previous(), Some(AlgorithmVersion::V2));
        assert_eq!(AlgorithmVersion::V2.previous(), Some(AlgorithmVersion::V1));
        assert_eq!(AlgorithmVersion::V1.previous(), Some(AlgorithmVersion::V0));
        assert_eq!(AlgorithmVersion::V0.previous(), None);
    }

    /// Tests that the default version is the current one.
    #[test]
    fn test_version_default_is_current() {
        assert_eq!(AlgorithmVersion::default(), AlgorithmVersion::V3);
    }
}
