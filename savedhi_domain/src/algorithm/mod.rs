// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Versioned Derivation Algorithm
//!
//! This module implements the credential derivation pipeline and its version
//! dispatcher. The pipeline is a pure function of its inputs:
//!
//! ```text
//! (userName, userSecret) --scrypt--> userKey
//! (userKey, site descriptor) --HMAC-SHA256--> siteKey
//! (siteKey, resultType) --materializer--> password / login / answer /
//!                                          subkey / state blob
//! ```
//!
//! ## Versioning
//!
//! Four algorithm versions exist. Each versioned operation (user-key
//! stretching, site-key derivation, template encoding, state encoding) is a
//! method on the [`VersionedAlgorithm`] trait with one implementation per
//! version; V1, V2 and V3 hold their predecessor and delegate every
//! operation they do not change. That keeps per-version behavior a closed
//! set of overrides instead of four parallel copies:
//!
//! - **V0**: length prefixes count UTF-8 codepoints; template seed bytes
//!   are widened to big-endian u16 values before modular reduction.
//! - **V1**: template seed bytes are plain bytes. (Overrides template
//!   encoding.)
//! - **V2**: site name and context lengths count UTF-8 bytes. (Overrides
//!   site-key derivation.)
//! - **V3**: the user name length counts UTF-8 bytes as well. (Overrides
//!   user-key stretching.)
//!
//! The V0 seed widening is preserved bit-exactly, quirk and all; it is part
//! of the credential contract for V0-era sites.
//!
//! ## Determinism
//!
//! Apart from the TOTP counter sentinel (which folds the wall clock into a
//! five-minute bucket before it enters the salt), nothing in this module
//! reads ambient state. The same inputs produce the same outputs on any
//! platform, forever.

mod templates;
mod v0;
mod v1;
mod v2;
mod v3;

use crate::crypto::{self, SITE_KEY_SIZE, USER_KEY_SIZE};
use crate::value_objects::{AlgorithmVersion, KeyCounter, KeyPurpose, ResultType, SiteKey, UserKey};
use crate::SavedhiError;

pub(crate) use templates::{class_characters, templates_for};

/// The four versioned operations of the derivation pipeline.
///
/// Implementations must be pure: no ambient reads, no interior mutability.
pub(crate) trait VersionedAlgorithm: Sync {
    /// Stretches a user identity into 64 bytes of user-key material.
    fn user_key_bytes(&self, user_name: &str, user_secret: &str) -> Result<[u8; USER_KEY_SIZE], SavedhiError>;

    /// Derives 32 bytes of site-key material under a user key.
    fn site_key_bytes(
        &self,
        user_key: &UserKey,
        site_name: &str,
        counter: KeyCounter,
        purpose: KeyPurpose,
        context: Option<&str>,
    ) -> Result<[u8; SITE_KEY_SIZE], SavedhiError>;

    /// Encodes a site-key seed through a result template.
    fn template_result(&self, seed: &[u8; SITE_KEY_SIZE], result_type: ResultType) -> Result<String, SavedhiError>;

    /// Recovers plaintext state from a stored ciphertext.
    fn state_decrypt(&self, user_key: &UserKey, state: &str) -> Result<String, SavedhiError>;

    /// Encrypts plaintext state for persistence.
    fn state_encrypt(&self, user_key: &UserKey, plaintext: &str) -> Result<String, SavedhiError>;
}

static V0_ENGINE: v0::V0 = v0::V0;
static V1_ENGINE: v1::V1 = v1::V1 { previous: v0::V0 };
static V2_ENGINE: v2::V2 = v2::V2 {
    previous: v1::V1 { previous: v0::V0 },
};
static V3_ENGINE: v3::V3 = v3::V3 {
    previous: v2::V2 {
        previous: v1::V1 { previous: v0::V0 },
    },
};

/// Resolves the engine for an algorithm version.
pub(crate) fn engine(algorithm: AlgorithmVersion) -> &'static dyn VersionedAlgorithm {
    match algorithm {
        AlgorithmVersion::V0 => &V0_ENGINE,
        AlgorithmVersion::V1 => &V1_ENGINE,
        AlgorithmVersion::V2 => &V2_ENGINE,
        AlgorithmVersion::V3 => &V3_ENGINE,
    }
}

/// Derives the user key for an identity at an algorithm version.
///
/// # Errors
///
/// `MissingInput` when the name or secret is empty; `PrimitiveFailure` when
/// scrypt fails.
pub fn user_key(user_name: &str, user_secret: &str, algorithm: AlgorithmVersion) -> Result<UserKey, SavedhiError> {
    if user_name.is_empty() {
        return Err(SavedhiError::MissingInput("userName".to_string()));
    }
    if user_secret.is_empty() {
        return Err(SavedhiError::MissingInput("userSecret".to_string()));
    }

    let bytes = engine(algorithm).user_key_bytes(user_name, user_secret)?;
    Ok(UserKey::new(bytes, algorithm))
}

/// Derives the site key for a site descriptor under a user key.
///
/// The algorithm version is the one the user key was derived at. A counter
/// of zero selects the TOTP window (see [`KeyCounter`]).
pub fn site_key(
    user_key: &UserKey,
    site_name: &str,
    counter: KeyCounter,
    purpose: KeyPurpose,
    context: Option<&str>,
) -> Result<SiteKey, SavedhiError> {
    if site_name.is_empty() {
        return Err(SavedhiError::MissingInput("siteName".to_string()));
    }

    let algorithm = user_key.algorithm();
    let bytes = engine(algorithm).site_key_bytes(user_key, site_name, counter, purpose, context)?;
    Ok(SiteKey::new(bytes, algorithm))
}

/// Materializes the result for a site descriptor: a template-encoded
/// credential, a decrypted stateful secret, or a derived binary subkey.
///
/// `result_param` is branch-specific: ignored by the template branch, the
/// ciphertext for the stateful branch, the decimal bit size for the derive
/// branch.
pub fn site_result(
    user_key: &UserKey,
    site_name: &str,
    result_type: ResultType,
    result_param: Option<&str>,
    counter: KeyCounter,
    purpose: KeyPurpose,
    context: Option<&str>,
) -> Result<String, SavedhiError> {
    let algorithm = user_key.algorithm();

    if result_type.is_template() {
        let site_key = site_key(user_key, site_name, counter, purpose, context)?;
        return engine(algorithm).template_result(site_key.bytes(), result_type);
    }

    if result_type.is_stateful() {
        let state = result_param
            .filter(|p| !p.is_empty())
            .ok_or_else(|| SavedhiError::MissingInput("resultParam (stored state)".to_string()))?;
        return engine(algorithm).state_decrypt(user_key, state);
    }

    if result_type.is_derive() {
        let site_key = site_key(user_key, site_name, counter, purpose, context)?;
        return derived_key(&site_key, result_param);
    }

    Err(SavedhiError::UnsupportedResultType(format!(
        "result type {} has no materializer",
        result_type
    )))
}

/// Encrypts a user-supplied secret into its persistable state form.
pub fn site_state(
    user_key: &UserKey,
    site_name: &str,
    _result_type: ResultType,
    result_param: &str,
    _counter: KeyCounter,
    _purpose: KeyPurpose,
    _context: Option<&str>,
) -> Result<String, SavedhiError> {
    if site_name.is_empty() {
        return Err(SavedhiError::MissingInput("siteName".to_string()));
    }
    if result_param.is_empty() {
        return Err(SavedhiError::MissingInput("resultParam (plaintext)".to_string()));
    }

    engine(user_key.algorithm()).state_encrypt(user_key, result_param)
}

/// The derive branch: a blake2b subkey of the requested bit size, base64
/// encoded. Empty parameter defaults to 512 bits.
fn derived_key(site_key: &SiteKey, result_param: Option<&str>) -> Result<String, SavedhiError> {
    let bits: u32 = match result_param.map(str::trim).filter(|p| !p.is_empty()) {
        None => 512,
        Some(p) => p
            .parse()
            .map_err(|_| SavedhiError::FormatIllegal(format!("derive key size {:?} is not a number", p)))?,
    };

    if !(128..=512).contains(&bits) || bits % 8 != 0 {
        return Err(SavedhiError::FormatIllegal(format!(
            "derive key size {} outside 128..=512 or not a multiple of 8",
            bits
        )));
    }

    let subkey = crypto::blake2b_subkey(site_key.bytes(), (bits / 8) as usize, None, 0, None)?;
    Ok(crypto::b64_encode(&subkey))
}

/// Assembles the user-key salt: authentication scope, length prefix, name.
pub(crate) fn user_key_salt(user_name: &str, length_of: fn(&str) -> usize) -> Vec<u8> {
    let scope = KeyPurpose::Authentication.scope().as_bytes();
    let name = user_name.as_bytes();

    let mut salt = Vec::with_capacity(scope.len() + 4 + name.len());
    salt.extend_from_slice(scope);
    salt.extend_from_slice(&(length_of(user_name) as u32).to_be_bytes());
    salt.extend_from_slice(name);
    salt
}

/// Assembles the site-key salt: purpose scope, length-prefixed site name,
/// counter, and the length-prefixed context when one is present.
pub(crate) fn site_key_salt(
    site_name: &str,
    effective_counter: u32,
    purpose: KeyPurpose,
    context: Option<&str>,
    length_of: fn(&str) -> usize,
) -> Vec<u8> {
    let scope = purpose.scope().as_bytes();
    let name = site_name.as_bytes();

    let mut salt = Vec::with_capacity(scope.len() + 4 + name.len() + 4 + 4 + 32);
    salt.extend_from_slice(scope);
    salt.extend_from_slice(&(length_of(site_name) as u32).to_be_bytes());
    salt.extend_from_slice(name);
    salt.extend_from_slice(&effective_counter.to_be_bytes());

    if let Some(context) = context.filter(|c| !c.is_empty()) {
        salt.extend_from_slice(&(length_of(context) as u32).to_be_bytes());
        salt.extend_from_slice(context.as_bytes());
    }

    salt
}

/// Encodes a seed through the template inventory of a result type, picking
/// the template and every character with the version's index function.
pub(crate) fn encode_with_templates(
    seed: &[u8; SITE_KEY_SIZE],
    result_type: ResultType,
    index: fn(u8, usize) -> usize,
) -> Result<String, SavedhiError> {
    let templates = templates_for(result_type).ok_or_else(|| {
        SavedhiError::UnsupportedResultType(format!("result type {} has no template inventory", result_type))
    })?;

    let template = templates[index(seed[0], templates.len())];
    if template.len() > seed.len() - 1 {
        return Err(SavedhiError::Internal(format!(
            "template length {} exceeds seed capacity {}",
            template.len(),
            seed.len() - 1
        )));
    }

    let mut result = String::with_capacity(template.len());
    for (position, class) in template.chars().enumerate() {
        let characters = class_characters(class)
            .ok_or_else(|| SavedhiError::Internal(format!("unknown template class {:?}", class)))?;
        let choice = index(seed[position + 1], characters.len());
        // Class inventories are ASCII; byte indexing is character indexing.
        result.push(characters.as_bytes()[choice] as char);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user_key() -> UserKey {
        UserKey::new([0x42u8; USER_KEY_SIZE], AlgorithmVersion::V3)
    }

    /// Tests that empty identity parts are rejected before any stretching.
    #[test]
    fn test_user_key_rejects_empty_inputs() {
        assert!(matches!(
            user_key("", "secret", AlgorithmVersion::V3),
            Err(SavedhiError::MissingInput(_))
        ));
        assert!(matches!(
            user_key("name", "", AlgorithmVersion::V3),
            Err(SavedhiError::MissingInput(_))
        ));
    }

    /// Tests that an empty site name is rejected.
    #[test]
    fn test_site_key_rejects_empty_site() {
        let key = test_user_key();
        assert!(matches!(
            site_key(&key, "", KeyCounter::INITIAL, KeyPurpose::Authentication, None),
            Err(SavedhiError::MissingInput(_))
        ));
    }

    /// Tests the user-key salt layout: scope, big-endian length, raw name
    /// bytes.
    #[test]
    fn test_user_key_salt_layout() {
        let salt = user_key_salt("ab", crypto::utf8_byte_count);
        let scope = b"com.lyndir.masterpassword";
        assert_eq!(&salt[..scope.len()], scope);
        assert_eq!(&salt[scope.len()..scope.len() + 4], &[0, 0, 0, 2]);
        assert_eq!(&salt[scope.len() + 4..], b"ab");
    }

    /// Tests the site-key salt layout with and without a context segment.
    #[test]
    fn test_site_key_salt_layout() {
        let bare = site_key_salt("x.com", 1, KeyPurpose::Recovery, None, crypto::utf8_byte_count);
        let scope = b"com.lyndir.masterpassword.answer";
        assert_eq!(&bare[..scope.len()], scope);
        assert_eq!(&bare[scope.len()..scope.len() + 4], &[0, 0, 0, 5]);
        assert_eq!(&bare[scope.len() + 4..scope.len() + 9], b"x.com");
        assert_eq!(&bare[scope.len() + 9..], &[0, 0, 0, 1]);

        let with_context = site_key_salt("x.com", 1, KeyPurpose::Recovery, Some("pet"), crypto::utf8_byte_count);
        assert_eq!(&with_context[..bare.len()], &bare[..]);
        assert_eq!(&with_context[bare.len()..bare.len() + 4], &[0, 0, 0, 3]);
        assert_eq!(&with_context[bare.len() + 4..], b"pet");

        // An empty context contributes no segment at all.
        let empty_context = site_key_salt("x.com", 1, KeyPurpose::Recovery, Some(""), crypto::utf8_byte_count);
        assert_eq!(empty_context, bare);
    }

    /// Tests materializer dispatch errors: type none has no result, and a
    /// stateful request without stored state is a missing input.
    #[test]
    fn test_site_result_dispatch_errors() {
        let key = test_user_key();
        assert!(matches!(
            site_result(
                &key,
                "x.com",
                ResultType::NONE,
                None,
                KeyCounter::INITIAL,
                KeyPurpose::Authentication,
                None
            ),
            Err(SavedhiError::UnsupportedResultType(_))
        ));
        assert!(matches!(
            site_result(
                &key,
                "x.com",
                ResultType::STATE_PERSONAL,
                None,
                KeyCounter::INITIAL,
                KeyPurpose::Authentication,
                None
            ),
            Err(SavedhiError::MissingInput(_))
        ));
    }

    /// Tests derive-branch parameter validation: bounds, granularity, and
    /// the 512-bit default.
    #[test]
    fn test_derived_key_parameter_validation() {
        let key = test_user_key();
        let derive = |param: Option<&str>| {
            site_result(
                &key,
                "x.com",
                ResultType::DERIVE_KEY,
                param,
                KeyCounter::INITIAL,
                KeyPurpose::Authentication,
                None,
            )
        };

        assert!(derive(Some("127")).is_err());
        assert!(derive(Some("513")).is_err());
        assert!(derive(Some("129")).is_err());
        assert!(derive(Some("abc")).is_err());

        // Default is 512 bits: 64 subkey bytes.
        let default = derive(None).unwrap();
        assert_eq!(crypto::b64_decode(&default).unwrap().len(), 64);

        let sized = derive(Some("256")).unwrap();
        assert_eq!(crypto::b64_decode(&sized).unwrap().len(), 32);
    }

    /// Tests the stateful round trip: persist a secret, then materialize it
    /// back.
    #[test]
    fn test_stateful_state_round_trip() {
        let key = test_user_key();
        let state = site_state(
            &key,
            "x.com",
            ResultType::STATE_PERSONAL,
            "hunter2 is my password",
            KeyCounter::INITIAL,
            KeyPurpose::Authentication,
            None,
        )
        .unwrap();

        // Stored state is base64 ciphertext, not the plaintext.
        assert!(crypto::b64_decode(&state).is_ok());
        assert!(!state.contains("hunter2"));

        let recovered = site_result(
            &key,
            "x.com",
            ResultType::STATE_PERSONAL,
            Some(&state),
            KeyCounter::INITIAL,
            KeyPurpose::Authentication,
            None,
        )
        .unwrap();
        assert_eq!(recovered, "hunter2 is my password");
    }

    /// Tests the legacy pass-through: a stored login that was never
    /// encrypted comes back verbatim.
    #[test]
    fn test_stateful_legacy_passthrough() {
        let key = test_user_key();
        let result = site_result(
            &key,
            "x.com",
            ResultType::STATE_PERSONAL,
            Some("plain-legacy-login!"),
            KeyCounter::INITIAL,
            KeyPurpose::Identification,
            None,
        )
        .unwrap();
        assert_eq!(result, "plain-legacy-login!");
    }
}
