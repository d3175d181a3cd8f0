// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Algorithm V2
//!
//! V2 measures the site name and key context in UTF-8 **bytes** when
//! building the site-key salt. The user name is still measured in
//! codepoints. Everything else delegates to V1.

use zeroize::Zeroize;

use crate::crypto::{self, SITE_KEY_SIZE, USER_KEY_SIZE};
use crate::value_objects::{KeyCounter, KeyPurpose, ResultType, UserKey};
use crate::SavedhiError;

use super::{site_key_salt, v1::V1, VersionedAlgorithm};

pub(crate) struct V2 {
    pub(crate) previous: V1,
}

impl VersionedAlgorithm for V2 {
    fn user_key_bytes(&self, user_name: &str, user_secret: &str) -> Result<[u8; USER_KEY_SIZE], SavedhiError> {
        self.previous.user_key_bytes(user_name, user_secret)
    }

    fn site_key_bytes(
        &self,
        user_key: &UserKey,
        site_name: &str,
        counter: KeyCounter,
        purpose: KeyPurpose,
        context: Option<&str>,
    ) -> Result<[u8; SITE_KEY_SIZE], SavedhiError> {
        let mut salt = site_key_salt(site_name, counter.effective(), purpose, context, crypto::utf8_byte_count);
        let key = crypto::hmac_sha256(user_key.bytes(), &salt);
        salt.zeroize();
        Ok(key)
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
    use super::*;
    use crate::value_objects::AlgorithmVersion;

    /// Tests that V1 and V2 site keys diverge exactly when the site name
    /// contains multi-byte UTF-8.
    #[test]
    fn test_v2_site_salt_divergence_on_multibyte_names() {
        let user_key = UserKey::new([0x10u8; USER_KEY_SIZE], AlgorithmVersion::V2);
        let v1 = V1 {
            previous: super::super::v0::V0,
        };
        let v2 = V2 {
            previous: V1 {
                previous: super::super::v0::V0,
            },
        };

        let ascii_v1 = v1
            .site_key_bytes(&user_key, "plain.example", KeyCounter::INITIAL, KeyPurpose::Authentication, None)
            .unwrap();
        let ascii_v2 = v2
            .site_key_bytes(&user_key, "plain.example", KeyCounter::INITIAL, KeyPurpose::Authentication, None)
            .unwrap();
        assert_eq!(ascii_v1, ascii_v2);

        // U+2192: one codepoint, three bytes. Length prefixes differ, so
        // the salts and therefore the keys differ.
        let arrow_v1 = v1
            .site_key_bytes(&user_key, "\u{2192}", KeyCounter::INITIAL, KeyPurpose::Authentication, None)
            .unwrap();
        let arrow_v2 = v2
            .site_key_bytes(&user_key, "\u{2192}", KeyCounter::INITIAL, KeyPurpose::Authentication, None)
            .unwrap();
        assert_ne!(arrow_v1, arrow_v2);
    }
}
