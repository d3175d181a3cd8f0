// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cryptographic Primitives Facade
//!
//! This module provides the thin, contract-stating wrappers over the crypto
//! crates that the rest of the engine builds on. Everything above this module
//! treats these functions as trusted leaf operations; everything below this
//! module is a third-party implementation.
//!
//! ## Overview
//!
//! The facade exposes:
//!
//! - **scrypt**: user-key stretching with the fixed cost parameters
//!   N=32768, r=8, p=2 and a 64-byte output
//! - **HMAC-SHA256**: site-key derivation and identicon seeding
//! - **SHA-256**: key fingerprinting
//! - **AES-128-CBC**: stateful result encryption under a legacy wire
//!   contract (zero IV, zero padding to the block boundary, no PKCS#7)
//! - **blake2b**: binary subkey derivation with a runtime output length
//! - **base64**: standard alphabet, no URL variant
//! - **UTF-8 counting**: codepoint and byte lengths, both of which the
//!   versioned salts need
//!
//! ## Contracts
//!
//! All operations are deterministic. The scrypt cost parameters are part of
//! the credential contract and must not be weakened: every derived
//! credential in every user file depends on them.
//!
//! The AES path intentionally reproduces a legacy byte-level contract (see
//! the marshalling layer): the IV is all zeroes and plaintexts are padded
//! with zero bytes to the cipher block boundary rather than PKCS#7. Changing
//! either would silently corrupt every stored stateful credential, so both
//! are pinned here and covered by tests.

use aes::Aes128;
use base64::engine::general_purpose;
use base64::Engine as _;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use scrypt::Params;
use sha2::{Digest, Sha256};

use crate::SavedhiError;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// AES cipher block size in bytes.
pub const AES_BLOCK_SIZE: usize = 16;

/// Size of a stretched user key in bytes.
pub const USER_KEY_SIZE: usize = 64;

/// Size of a derived site key in bytes.
pub const SITE_KEY_SIZE: usize = 32;

/// scrypt CPU/memory cost: 2^15 = 32768.
const SCRYPT_LOG_N: u8 = 15;
/// scrypt block size.
const SCRYPT_R: u32 = 8;
/// scrypt parallelization.
const SCRYPT_P: u32 = 2;

/// Stretches a user secret over a salt into 64 bytes of user-key material.
///
/// Deterministic; fails only on parameter or allocation errors inside the
/// scrypt implementation.
pub fn scrypt_stretch(secret: &[u8], salt: &[u8]) -> Result<[u8; USER_KEY_SIZE], SavedhiError> {
    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, USER_KEY_SIZE)
        .map_err(|e| SavedhiError::PrimitiveFailure(format!("scrypt parameters: {}", e)))?;

    let mut key = [0u8; USER_KEY_SIZE];
    scrypt::scrypt(secret, salt, &params, &mut key)
        .map_err(|e| SavedhiError::PrimitiveFailure(format!("scrypt: {}", e)))?;
    Ok(key)
}

/// Computes HMAC-SHA256 over `message` under `key`.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; SITE_KEY_SIZE] {
    // HMAC-SHA256 accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// Computes SHA-256 over `buf`.
pub fn sha256(buf: &[u8]) -> [u8; 32] {
    Sha256::digest(buf).into()
}

/// Encrypts `plaintext` with AES-128-CBC under the first 16 bytes of
/// `key`, zero IV, zero padding to the block boundary.
///
/// The ciphertext length equals the plaintext length rounded up to the
/// cipher block size; an exact multiple gains no extra block.
pub fn aes128_cbc_encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, SavedhiError> {
    let key = aes_key(key)?;
    let iv = [0u8; AES_BLOCK_SIZE];

    let mut buf = plaintext.to_vec();
    let remainder = buf.len() % AES_BLOCK_SIZE;
    if remainder != 0 {
        buf.resize(buf.len() + AES_BLOCK_SIZE - remainder, 0);
    }

    let len = buf.len();
    Aes128CbcEnc::new(&key.into(), &iv.into())
        .encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .map_err(|e| SavedhiError::PrimitiveFailure(format!("AES-CBC encrypt: {}", e)))?;
    Ok(buf)
}

/// Decrypts `ciphertext` with AES-128-CBC under the first 16 bytes of
/// `key`, zero IV, no unpadding.
///
/// The plaintext is returned at ciphertext length; any zero padding the
/// encryption side appended is still present and is the caller's to trim.
pub fn aes128_cbc_decrypt(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, SavedhiError> {
    let key = aes_key(key)?;
    let iv = [0u8; AES_BLOCK_SIZE];

    if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_SIZE != 0 {
        return Err(SavedhiError::PrimitiveFailure(format!(
            "AES-CBC decrypt: ciphertext length {} is not a positive multiple of {}",
            ciphertext.len(),
            AES_BLOCK_SIZE
        )));
    }

    let mut buf = ciphertext.to_vec();
    Aes128CbcDec::new(&key.into(), &iv.into())
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|e| SavedhiError::PrimitiveFailure(format!("AES-CBC decrypt: {}", e)))?;
    Ok(buf)
}

fn aes_key(key: &[u8]) -> Result<[u8; AES_BLOCK_SIZE], SavedhiError> {
    if key.len() < AES_BLOCK_SIZE {
        return Err(SavedhiError::PrimitiveFailure(format!(
            "AES key material too short: {} < {}",
            key.len(),
            AES_BLOCK_SIZE
        )));
    }
    let mut out = [0u8; AES_BLOCK_SIZE];
    out.copy_from_slice(&key[..AES_BLOCK_SIZE]);
    Ok(out)
}

/// Derives `out_len` bytes of subkey from `material` with blake2b.
///
/// `out_len` must lie in `16..=64`. `id` and `context` select a salted,
/// personalized variant; with all three optionals at their defaults this is
/// a plain blake2b hash of the material, which is the mode the engine's
/// derive branch uses.
pub fn blake2b_subkey(
    material: &[u8],
    out_len: usize,
    personal: Option<&[u8]>,
    id: u64,
    context: Option<&[u8]>,
) -> Result<Vec<u8>, SavedhiError> {
    if !(16..=64).contains(&out_len) {
        return Err(SavedhiError::PrimitiveFailure(format!(
            "blake2b output length {} outside 16..=64",
            out_len
        )));
    }

    let mut params = blake2b_simd::Params::new();
    params.hash_length(out_len);

    if personal.is_none() && id == 0 && context.is_none() {
        return Ok(params.hash(material).as_bytes().to_vec());
    }

    let mut salt = [0u8; 16];
    salt[..8].copy_from_slice(&id.to_le_bytes());
    params.salt(&salt);

    if let Some(personal) = personal {
        if personal.len() > 16 {
            return Err(SavedhiError::PrimitiveFailure(
                "blake2b personalization longer than 16 bytes".to_string(),
            ));
        }
        params.personal(personal);
    }

    params.key(material);
    Ok(params.hash(context.unwrap_or_default()).as_bytes().to_vec())
}

/// Encodes `buf` as standard-alphabet base64.
pub fn b64_encode(buf: &[u8]) -> String {
    general_purpose::STANDARD.encode(buf)
}

/// Decodes standard-alphabet base64.
pub fn b64_decode(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(encoded)
}

/// Counts UTF-8 codepoints in `s`.
pub fn utf8_char_count(s: &str) -> usize {
    s.chars().count()
}

/// Counts UTF-8 bytes in `s`.
pub fn utf8_byte_count(s: &str) -> usize {
    s.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests the SHA-256 wrapper against the FIPS empty-message vector.
    #[test]
    fn test_sha256_empty_vector() {
        let digest = sha256(b"");
        assert_eq!(
            hex::encode(digest),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    /// Tests the HMAC-SHA256 wrapper against RFC 4231 test case 1.
    #[test]
    fn test_hmac_sha256_rfc4231_case1() {
        let key = [0x0bu8; 20];
        let tag = hmac_sha256(&key, b"Hi There");
        assert_eq!(
            hex::encode(tag),
            "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7"
        );
    }

    /// Tests that AES encryption rounds the ciphertext up to the block
    /// boundary and that an exact multiple gains no extra block.
    #[test]
    fn test_aes_ciphertext_length() {
        let key = [7u8; USER_KEY_SIZE];

        let short = aes128_cbc_encrypt(&key, b"secret").unwrap();
        assert_eq!(short.len(), AES_BLOCK_SIZE);

        let exact = aes128_cbc_encrypt(&key, &[0x42u8; 32]).unwrap();
        assert_eq!(exact.len(), 32);

        let over = aes128_cbc_encrypt(&key, &[0x42u8; 33]).unwrap();
        assert_eq!(over.len(), 48);
    }

    /// Tests the encrypt/decrypt round trip: the decrypted buffer equals
    /// the plaintext followed by its zero padding.
    #[test]
    fn test_aes_round_trip() {
        let key = [3u8; USER_KEY_SIZE];
        let plaintext = b"correct horse battery staple";

        let ciphertext = aes128_cbc_encrypt(&key, plaintext).unwrap();
        let decrypted = aes128_cbc_decrypt(&key, &ciphertext).unwrap();

        assert_eq!(&decrypted[..plaintext.len()], plaintext);
        assert!(decrypted[plaintext.len()..].iter().all(|&b| b == 0));
    }

    /// Tests that a ciphertext off the block boundary is rejected rather
    /// than silently truncated.
    #[test]
    fn test_aes_rejects_partial_block() {
        let key = [3u8; USER_KEY_SIZE];
        assert!(aes128_cbc_decrypt(&key, &[1u8; 17]).is_err());
        assert!(aes128_cbc_decrypt(&key, &[]).is_err());
    }

    /// Tests that encryption is deterministic under the zero-IV contract.
    /// Stored states must be byte-stable across exports.
    #[test]
    fn test_aes_deterministic() {
        let key = [9u8; USER_KEY_SIZE];
        let a = aes128_cbc_encrypt(&key, b"same plaintext").unwrap();
        let b = aes128_cbc_encrypt(&key, b"same plaintext").unwrap();
        assert_eq!(a, b);
    }

    /// Tests blake2b output sizing and the 16..=64 bounds.
    #[test]
    fn test_blake2b_output_length() {
        let material = [5u8; SITE_KEY_SIZE];
        for len in [16usize, 32, 48, 64] {
            let subkey = blake2b_subkey(&material, len, None, 0, None).unwrap();
            assert_eq!(subkey.len(), len);
        }
        assert!(blake2b_subkey(&material, 15, None, 0, None).is_err());
        assert!(blake2b_subkey(&material, 65, None, 0, None).is_err());
    }

    /// Tests that distinct materials produce distinct subkeys.
    #[test]
    fn test_blake2b_distinct_materials() {
        let a = blake2b_subkey(&[1u8; 32], 32, None, 0, None).unwrap();
        let b = blake2b_subkey(&[2u8; 32], 32, None, 0, None).unwrap();
        assert_ne!(a, b);
    }

    /// Tests base64 round trip with the standard alphabet.
    #[test]
    fn test_base64_round_trip() {
        assert_eq!(b64_encode(b"hello"), "aGVsbG8=");
        assert_eq!(b64_decode("aGVsbG8=").unwrap(), b"hello");
        assert!(b64_decode("not valid!").is_err());
    }

    /// Tests the codepoint/byte divergence the versioned salts depend on.
    #[test]
    fn test_utf8_counts_diverge() {
        // U+2192 RIGHTWARDS ARROW: one codepoint, three bytes.
        let arrow = "\u{2192}";
        assert_eq!(utf8_char_count(arrow), 1);
        assert_eq!(utf8_byte_count(arrow), 3);

        assert_eq!(utf8_char_count("abc"), 3);
        assert_eq!(utf8_byte_count("abc"), 3);
    }
}
