// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! This module provides the closed, hierarchical error set for the savedhi
//! credential engine. Each variant represents one failure kind from the
//! engine's contract; the set is deliberately small so that the CLI and
//! other callers can map failures onto exit codes and user messages
//! without inspecting message text.
//!
//! ## Error Categories
//!
//! ### Input Errors
//! - **MissingInput**: a required parameter was absent or empty
//! - **UnsupportedVersion**: algorithm version outside `V0..=V3`
//! - **UnsupportedResultType**: result-type class bits ambiguous or unknown
//!
//! ### Cryptographic Errors
//! - **PrimitiveFailure**: scrypt/HMAC/AES/blake2b/base64 failed; carries
//!   the underlying detail
//! - **MalformedState**: stored ciphertext that decodes but does not
//!   decrypt (legacy non-base64 state is *not* an error; it passes through
//!   with a warning)
//!
//! ### Marshalling Errors
//! - **FormatStructure**: input shape invalid (bad header, unknown format)
//! - **FormatMissing**: a required field is absent
//! - **FormatIllegal**: a field is present but out of range
//! - **UserSecretMismatch**: the derived user-key fingerprint does not
//!   match the stored one
//!
//! ### System Errors
//! - **Internal**: invariant violation; never expected in normal operation
//!
//! ## Propagation Policy
//!
//! Partial outputs are never returned alongside an error, and any sensitive
//! buffer allocated before the failure is wiped before the error leaves the
//! engine. No error is recovered silently except the legacy-state
//! pass-through noted above.

use thiserror::Error;

/// Domain-specific errors for the savedhi credential engine.
///
/// Each variant carries a descriptive message. Messages identify the field
/// or primitive at fault but never include key material or secrets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SavedhiError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Unsupported algorithm version: {0}")]
    UnsupportedVersion(String),

    #[error("Unsupported result type: {0}")]
    UnsupportedResultType(String),

    #[error("Primitive failure: {0}")]
    PrimitiveFailure(String),

    #[error("Malformed state: {0}")]
    MalformedState(String),

    #[error("Invalid marshal structure: {0}")]
    FormatStructure(String),

    #[error("Missing marshal field: {0}")]
    FormatMissing(String),

    #[error("Illegal marshal value: {0}")]
    FormatIllegal(String),

    #[error("User secret mismatch: {0}")]
    UserSecretMismatch(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SavedhiError {
    /// Creates a new missing-input error
    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput(msg.into())
    }

    /// Creates a new primitive-failure error
    pub fn primitive_failure(msg: impl Into<String>) -> Self {
        Self::PrimitiveFailure(msg.into())
    }

    /// Creates a new format-structure error
    pub fn format_structure(msg: impl Into<String>) -> Self {
        Self::FormatStructure(msg.into())
    }

    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Checks if the error indicates bad caller input rather than an
    /// engine malfunction
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SavedhiError::MissingInput(_)
                | SavedhiError::UnsupportedVersion(_)
                | SavedhiError::UnsupportedResultType(_)
                | SavedhiError::FormatStructure(_)
                | SavedhiError::FormatMissing(_)
                | SavedhiError::FormatIllegal(_)
                | SavedhiError::UserSecretMismatch(_)
        )
    }

    /// Gets the error category
    pub fn category(&self) -> &'static str {
        match self {
            SavedhiError::MissingInput(_) => "input",
            SavedhiError::UnsupportedVersion(_) => "version",
            SavedhiError::UnsupportedResultType(_) => "result-type",
            SavedhiError::PrimitiveFailure(_) => "crypto",
            SavedhiError::MalformedState(_) => "state",
            SavedhiError::FormatStructure(_) => "marshal",
            SavedhiError::FormatMissing(_) => "marshal",
            SavedhiError::FormatIllegal(_) => "marshal",
            SavedhiError::UserSecretMismatch(_) => "auth",
            SavedhiError::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for SavedhiError {
    fn from(err: serde_json::Error) -> Self {
        SavedhiError::FormatStructure(err.to_string())
    }
}

impl From<base64::DecodeError> for SavedhiError {
    fn from(err: base64::DecodeError) -> Self {
        SavedhiError::PrimitiveFailure(format!("base64: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests that error messages carry the variant prefix and detail.
    #[test]
    fn test_error_display() {
        let err = SavedhiError::MissingInput("userName".to_string());
        assert_eq!(err.to_string(), "Missing input: userName");

        let err = SavedhiError::UserSecretMismatch("key mismatch".to_string());
        assert!(err.to_string().contains("User secret mismatch"));
    }

    /// Tests the input-vs-malfunction split used for exit-code mapping.
    #[test]
    fn test_error_classification() {
        assert!(SavedhiError::MissingInput("x".into()).is_input_error());
        assert!(SavedhiError::FormatIllegal("x".into()).is_input_error());
        assert!(!SavedhiError::PrimitiveFailure("x".into()).is_input_error());
        assert!(!SavedhiError::Internal("x".into()).is_input_error());
    }

    /// Tests category names used in structured log fields.
    #[test]
    fn test_error_category() {
        assert_eq!(SavedhiError::PrimitiveFailure("x".into()).category(), "crypto");
        assert_eq!(SavedhiError::FormatMissing("x".into()).category(), "marshal");
        assert_eq!(SavedhiError::UserSecretMismatch("x".into()).category(), "auth");
    }
}
