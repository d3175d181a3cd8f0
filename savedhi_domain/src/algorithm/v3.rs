// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Algorithm V3
//!
//! The current version. V3 measures the user name in UTF-8 **bytes** when
//! building the user-key salt, completing the byte-count migration V2
//! started for site names. Everything else delegates to V2.

use zeroize::Zeroize;

use crate::crypto::{self, SITE_KEY_SIZE, USER_KEY_SIZE};
use crate::value_objects::{KeyCounter, KeyPurpose, ResultType, UserKey};
use crate::SavedhiError;

use super::{user_key_salt, v2::V2, VersionedAlgorithm};

pub(crate) struct V3 {
    pub(crate) previous: V2,
}

impl VersionedAlgorithm for V3 {
    fn user_key_bytes(&self, user_name: &str, user_secret: &str) -> Result<[u8; USER_KEY_SIZE], SavedhiError> {
        let mut salt = user_key_salt(user_name, crypto::utf8_byte_count);
        let key = crypto::scrypt_stretch(user_secret.as_bytes(), &salt);
        salt.zeroize();
        key
    }

    fn site_key_bytes(
        &self,
        user_key: &UserKey,
        site_name: &str,
        counter: KeyCounter,
        purpose: KeyPurpose,
        context: Option<&str>,
    ) -> Result<[u8; SITE_KEY_SIZE], SavedhiError> {
        self.previous.site_key_bytes(user_key, site_name, counter, purpose, context)
    }

    fn template_result(&self, seed: &[u8; SITE_KEY_SIZE], result_type: ResultType) -> Result<String, SavedhiError> {
        self.previous.template_result(seed, result_type)
    }

    fn state_decrypt(&self, user_key: &UserKey, state: &str) -> Result<String, SavedhiError> {
        self.previous.state_decrypt(user_key, state)
    }

    fn state_encrypt(&self, user_key: &UserKey, plaintext: &str) -> Result<String, SavedhiError> {
        self.previous.state_encrypt(user_key, plaintext)
    }
}

#[cfg(test)]
mod tests {
    use crate::algorithm::{site_result, user_key};
    use crate::value_objects::{AlgorithmVersion, KeyCounter, KeyPurpose, ResultType};

    /// Tests the V3 user key against a published reference vector.
    ///
    /// This pins the scrypt parameters, the authentication scope and the
    /// byte-count length prefix all at once; any drift in any of them
    /// changes these bytes.
    #[test]
    fn test_v3_user_key_reference_vector() {
        let key = user_key("John Doe", "password", AlgorithmVersion::V3).unwrap();
        let expected: [u8; 64] = [
            27, 177, 181, 88, 106, 115, 177, 174, 150, 213, 214, 9, 53, 44, 141, 132, 20, 254, 89, 228, 224, 58, 95,
            52, 226, 174, 130, 64, 244, 84, 216, 6, 136, 210, 95, 208, 201, 115, 81, 48, 112, 177, 183, 129, 50, 44,
            115, 10, 86, 114, 44, 225, 160, 170, 250, 210, 194, 87, 12, 220, 20, 36, 120, 232,
        ];
        assert_eq!(&key.bytes()[..], &expected[..]);
    }

    /// Tests the canonical V3 identity: the published key fingerprint and
    /// long-template result for the reference user.
    #[test]
    fn test_v3_canonical_identity_vector() {
        let key = user_key("Robert Lee Mitchell", "banana colored duckling", AlgorithmVersion::V3).unwrap();
        assert_eq!(
            key.key_id().as_hex(),
            "98eef4d1df46d849574a82a03c3177056b15dff2c72db4b0bcb6a1839e10bcdf"
        );

        let result = site_result(
            &key,
            "masterpasswordapp.com",
            ResultType::TEMPLATE_LONG,
            None,
            KeyCounter::INITIAL,
            KeyPurpose::Authentication,
            None,
        )
        .unwrap();
        assert_eq!(result, "Jejr5[RepuSosp");
    }

    /// Tests a V3 long result against a published reference vector.
    #[test]
    fn test_v3_long_result_reference_vector() {
        let key = user_key("John Doe", "password", AlgorithmVersion::V3).unwrap();
        let result = site_result(
            &key,
            "google.com",
            ResultType::TEMPLATE_LONG,
            None,
            KeyCounter::INITIAL,
            KeyPurpose::Authentication,
            None,
        )
        .unwrap();
        assert_eq!(result, "QubnJuvaMoke2~");
    }

    /// Tests V3 with a multi-byte user name: the byte-count prefix is what
    /// makes this vector come out.
    #[test]
    fn test_v3_multibyte_user_name_reference_vector() {
        let key = user_key("Max Müller", "passwort", AlgorithmVersion::V3).unwrap();
        let result = site_result(
            &key,
            "de.wikipedia.org",
            ResultType::TEMPLATE_LONG,
            None,
            KeyCounter::INITIAL,
            KeyPurpose::Authentication,
            None,
        )
        .unwrap();
        assert_eq!(result, "DaknJezb6,Zula");
    }

    /// Tests V3 with a multi-byte site name.
    #[test]
    fn test_v3_multibyte_site_name_reference_vector() {
        let key = user_key("Zhang Wei", "password", AlgorithmVersion::V3).unwrap();
        let result = site_result(
            &key,
            "山东大学.cn",
            ResultType::TEMPLATE_LONG,
            None,
            KeyCounter::INITIAL,
            KeyPurpose::Authentication,
            None,
        )
        .unwrap();
        assert_eq!(result, "ZajmGabl0~Zoza");
    }

    /// Tests that V0 and V3 keys diverge for a multi-byte user name but the
    /// derivation stays deterministic within each version.
    #[test]
    fn test_v0_v3_divergence_on_multibyte_name() {
        let v0_a = user_key("Max Müller", "passwort", AlgorithmVersion::V0).unwrap();
        let v0_b = user_key("Max Müller", "passwort", AlgorithmVersion::V0).unwrap();
        let v3 = user_key("Max Müller", "passwort", AlgorithmVersion::V3).unwrap();

        assert_eq!(v0_a.key_id(), v0_b.key_id());
        assert_ne!(v0_a.key_id(), v3.key_id());
    }

    /// Tests that an ASCII-only name derives identically across V0 and V3:
    /// codepoint and byte counts agree, so the whole chain agrees.
    #[test]
    fn test_v0_v3_agree_on_ascii_name() {
        let v0 = user_key("John Doe", "password", AlgorithmVersion::V0).unwrap();
        let v3 = user_key("John Doe", "password", AlgorithmVersion::V3).unwrap();
        assert_eq!(v0.bytes()[..], v3.bytes()[..]);
    }
}
