// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Algorithm V0
//!
//! The original derivation rules, and the base every later version
//! delegates to:
//!
//! - all salt length prefixes count UTF-8 **codepoints**
//! - template seed bytes are widened to big-endian u16 values (low byte
//!   zero) before modular reduction
//! - state encoding is base64 over AES-128-CBC under the first 16 bytes of
//!   the user key
//!
//! The seed widening is reproduced bit-exactly. It changes the modular
//! result for non-prime inventory sizes, and V0-era credentials depend on
//! it.

use zeroize::Zeroize;

use crate::crypto::{self, SITE_KEY_SIZE, USER_KEY_SIZE};
use crate::value_objects::{KeyCounter, KeyPurpose, ResultType, UserKey};
use crate::SavedhiError;

use super::{encode_with_templates, site_key_salt, user_key_salt, VersionedAlgorithm};

pub(crate) struct V0;

/// V0 widens each seed byte to a big-endian u16 with a zero low byte.
fn widened_index(seed_byte: u8, inventory_len: usize) -> usize {
    u16::from_be_bytes([seed_byte, 0]) as usize % inventory_len
}

impl VersionedAlgorithm for V0 {
    fn user_key_bytes(&self, user_name: &str, user_secret: &str) -> Result<[u8; USER_KEY_SIZE], SavedhiError> {
        let mut salt = user_key_salt(user_name, crypto::utf8_char_count);
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
        let mut salt = site_key_salt(site_name, counter.effective(), purpose, context, crypto::utf8_char_count);
        let key = crypto::hmac_sha256(user_key.bytes(), &salt);
        salt.zeroize();
        Ok(key)
    }

    fn template_result(&self, seed: &[u8; SITE_KEY_SIZE], result_type: ResultType) -> Result<String, SavedhiError> {
        encode_with_templates(seed, result_type, widened_index)
    }

    fn state_decrypt(&self, user_key: &UserKey, state: &str) -> Result<String, SavedhiError> {
        // Legacy unredacted state was stored in the clear; anything that is
        // not base64 passes through verbatim.
        let cipher = match crypto::b64_decode(state) {
            Ok(cipher) => cipher,
            Err(_) => return Ok(state.to_string()),
        };

        let mut plain = crypto::aes128_cbc_decrypt(user_key.bytes(), &cipher)
            .map_err(|e| SavedhiError::MalformedState(format!("stored state does not decrypt: {}", e)))?;

        // The wire contract pads with zero bytes; the stored secret ends at
        // the first of them.
        let end = plain.iter().position(|&b| b == 0).unwrap_or(plain.len());
        let result = String::from_utf8_lossy(&plain[..end]).into_owned();
        plain.zeroize();
        Ok(result)
    }

    fn state_encrypt(&self, user_key: &UserKey, plaintext: &str) -> Result<String, SavedhiError> {
        let mut cipher = crypto::aes128_cbc_encrypt(user_key.bytes(), plaintext.as_bytes())?;
        let encoded = crypto::b64_encode(&cipher);
        cipher.zeroize();
        Ok(encoded)
    }
}
