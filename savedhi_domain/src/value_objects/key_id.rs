// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Key Fingerprint Value Object
//!
//! A key identity is the SHA-256 digest of the key's bytes, carried as 64
//! lowercase hex characters in both wire shapes. It lets a stored user
//! record verify that a presented secret is the one it was written under
//! without the record ever containing the secret.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::crypto;

/// SHA-256 fingerprint of key material.
///
/// Equality is byte equality; the hex form is normalization-insensitive on
/// parse and lowercase on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId([u8; 32]);

impl KeyId {
    /// Fingerprints a buffer of key material.
    pub fn of(material: &[u8]) -> KeyId {
        KeyId(crypto::sha256(material))
    }

    /// Parses a fingerprint from its 64-character hex form.
    pub fn from_hex(encoded: &str) -> Option<KeyId> {
        let bytes = hex::decode(encoded).ok()?;
        let bytes: [u8; 32] = bytes.try_into().ok()?;
        Some(KeyId(bytes))
    }

    /// Lowercase hex form, 64 characters.
    pub fn as_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests that the fingerprint is the SHA-256 of the material, hex
    /// encoded in lowercase.
    #[test]
    fn test_key_id_is_sha256_hex() {
        let id = KeyId::of(b"");
        assert_eq!(
            id.as_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(id.as_hex().len(), 64);
    }

    /// Tests hex parsing in both cases and rejection of malformed input.
    #[test]
    fn test_key_id_hex_round_trip() {
        let id = KeyId::of(b"some key material");
        let reparsed = KeyId::from_hex(&id.as_hex()).unwrap();
        assert_eq!(id, reparsed);

        let upper = id.as_hex().to_ascii_uppercase();
        assert_eq!(KeyId::from_hex(&upper).unwrap(), id);

        assert!(KeyId::from_hex("abcd").is_none());
        assert!(KeyId::from_hex("zz").is_none());
    }
}
