// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Site Key Value Object
//!
//! The site key is the 32-byte secret a site descriptor yields under a user
//! key. It is the seed every materialized result reads from and follows the
//! same ownership and wipe rules as the user key.

use zeroize::Zeroize;

use crate::crypto::SITE_KEY_SIZE;

use super::{AlgorithmVersion, KeyId};

/// The derived 32-byte site key, its fingerprint, and the algorithm version
/// it was derived at.
#[derive(Clone)]
pub struct SiteKey {
    bytes: [u8; SITE_KEY_SIZE],
    key_id: KeyId,
    algorithm: AlgorithmVersion,
}

impl SiteKey {
    /// Takes ownership of freshly derived key material, stamping its
    /// fingerprint in the same step.
    pub fn new(bytes: [u8; SITE_KEY_SIZE], algorithm: AlgorithmVersion) -> SiteKey {
        let key_id = KeyId::of(&bytes);
        SiteKey {
            bytes,
            key_id,
            algorithm,
        }
    }

    pub fn bytes(&self) -> &[u8; SITE_KEY_SIZE] {
        &self.bytes
    }

    pub fn key_id(&self) -> KeyId {
        self.key_id
    }

    pub fn algorithm(&self) -> AlgorithmVersion {
        self.algorithm
    }
}

impl Drop for SiteKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SiteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteKey")
            .field("key_id", &self.key_id.as_hex())
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests fingerprint stamping at construction.
    #[test]
    fn test_site_key_fingerprint() {
        let bytes = [0x11u8; SITE_KEY_SIZE];
        let key = SiteKey::new(bytes, AlgorithmVersion::V2);
        assert_eq!(key.key_id(), KeyId::of(&bytes));
        assert_eq!(key.algorithm(), AlgorithmVersion::V2);
    }
}
