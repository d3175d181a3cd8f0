// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Algorithm V1
//!
//! V1 drops the V0 seed widening: template seed bytes index inventories as
//! plain bytes. Everything else delegates to V0.

use crate::crypto::{SITE_KEY_SIZE, USER_KEY_SIZE};
use crate::value_objects::{KeyCounter, KeyPurpose, ResultType, UserKey};
use crate::SavedhiError;

use super::{encode_with_templates, v0::V0, VersionedAlgorithm};

pub(crate) struct V1 {
    pub(crate) previous: V0,
}

/// Plain byte indexing, used by V1 and every later version.
pub(crate) fn byte_index(seed_byte: u8, inventory_len: usize) -> usize {
    seed_byte as usize % inventory_len
}

impl VersionedAlgorithm for V1 {
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
        self.previous.site_key_bytes(user_key, site_name, counter, purpose, context)
    }

    fn template_result(&self, seed: &[u8; SITE_KEY_SIZE], result_type: ResultType) -> Result<String, SavedhiError> {
        encode_with_templates(seed, result_type, byte_index)
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
    use crate::algorithm::templates_for;

    /// Tests that V1 selects templates by plain byte value.
    #[test]
    fn test_v1_template_selection_by_byte() {
        let mut seed = [0u8; SITE_KEY_SIZE];
        seed[0] = 22;

        let v1 = V1 { previous: V0 };
        // Byte 22 mod 21 templates picks index 1; every position byte is 0,
        // so each output character is the first of its class inventory.
        let result = v1.template_result(&seed, ResultType::TEMPLATE_LONG).unwrap();
        let templates = templates_for(ResultType::TEMPLATE_LONG).unwrap();
        assert_eq!(result.len(), templates[1].len());
    }

    /// Tests byte indexing over inventory bounds.
    #[test]
    fn test_byte_index() {
        assert_eq!(byte_index(0, 21), 0);
        assert_eq!(byte_index(21, 21), 0);
        assert_eq!(byte_index(22, 21), 1);
        assert_eq!(byte_index(255, 10), 5);
    }
}
