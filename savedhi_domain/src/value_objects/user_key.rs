// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # User Key Value Object
//!
//! The user key is the 64-byte root secret stretched from a user's name and
//! personal secret. Everything else the engine produces hangs off it, so its
//! handling rules are strict:
//!
//! - constructed in one step with its fingerprint and algorithm; never
//!   mutated afterwards
//! - owned by its creator and moved or cloned by value when shared
//! - wiped on drop, including drops on error and panic unwind paths
//!
//! The fingerprint doubles as the stored `keyID` that authenticates a user
//! file against a presented secret.

use zeroize::Zeroize;

use crate::crypto::USER_KEY_SIZE;

use super::{AlgorithmVersion, KeyId};

/// The stretched 64-byte user key, its fingerprint, and the algorithm
/// version it was derived at.
#[derive(Clone)]
pub struct UserKey {
    bytes: [u8; USER_KEY_SIZE],
    key_id: KeyId,
    algorithm: AlgorithmVersion,
}

impl UserKey {
    /// Takes ownership of freshly derived key material, stamping its
    /// fingerprint in the same step.
    pub fn new(bytes: [u8; USER_KEY_SIZE], algorithm: AlgorithmVersion) -> UserKey {
        let key_id = KeyId::of(&bytes);
        UserKey {
            bytes,
            key_id,
            algorithm,
        }
    }

    pub fn bytes(&self) -> &[u8; USER_KEY_SIZE] {
        &self.bytes
    }

    pub fn key_id(&self) -> KeyId {
        self.key_id
    }

    pub fn algorithm(&self) -> AlgorithmVersion {
        self.algorithm
    }
}

impl Drop for UserKey {
    fn drop(&mut self) {
        // Guaranteed wipe, also on unwind.
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for UserKey {
    /// Key bytes never reach log output; only the fingerprint does.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserKey")
            .field("key_id", &self.key_id.as_hex())
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests that the fingerprint is stamped from the key bytes at
    /// construction.
    #[test]
    fn test_user_key_fingerprint() {
        let bytes = [0xabu8; USER_KEY_SIZE];
        let key = UserKey::new(bytes, AlgorithmVersion::V3);
        assert_eq!(key.key_id(), KeyId::of(&bytes));
        assert_eq!(key.algorithm(), AlgorithmVersion::V3);
    }

    /// Tests that clones carry identical material and fingerprint.
    #[test]
    fn test_user_key_clone_by_value() {
        let key = UserKey::new([7u8; USER_KEY_SIZE], AlgorithmVersion::V1);
        let clone = key.clone();
        assert_eq!(key.bytes(), clone.bytes());
        assert_eq!(key.key_id(), clone.key_id());
    }

    /// Tests that Debug output exposes the fingerprint but not the key
    /// bytes.
    #[test]
    fn test_user_key_debug_redacts_bytes() {
        let key = UserKey::new([0x55u8; USER_KEY_SIZE], AlgorithmVersion::V3);
        let rendered = format!("{:?}", key);
        assert!(rendered.contains(&key.key_id().as_hex()));
        assert!(!rendered.contains("85, 85"));
    }
}
