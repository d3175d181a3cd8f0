// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Key Purpose Value Object
//!
//! The purpose scopes a derivation: the same identity and site descriptor
//! produce unrelated keys for authentication, identification and recovery
//! because the purpose's scope string prefixes every salt.
//!
//! The scope strings are contractual and must never change; they are the
//! domain separator baked into every credential ever derived.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// What a derived key will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyPurpose {
    /// An authentication token such as a site password.
    Authentication,
    /// An identification token such as a login name.
    Identification,
    /// A recovery token such as a security answer.
    Recovery,
}

impl KeyPurpose {
    /// The salt scope prefix for this purpose.
    pub fn scope(self) -> &'static str {
        match self {
            KeyPurpose::Authentication => "com.lyndir.masterpassword",
            KeyPurpose::Identification => "com.lyndir.masterpassword.login",
            KeyPurpose::Recovery => "com.lyndir.masterpassword.answer",
        }
    }

    /// Parses a purpose from its CLI name or abbreviation.
    pub fn from_name(name: &str) -> Option<KeyPurpose> {
        match name.to_ascii_lowercase().as_str() {
            "a" | "auth" | "authentication" => Some(KeyPurpose::Authentication),
            "i" | "ident" | "identification" => Some(KeyPurpose::Identification),
            "r" | "rec" | "recovery" => Some(KeyPurpose::Recovery),
            _ => None,
        }
    }
}

impl Display for KeyPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyPurpose::Authentication => "authentication",
            KeyPurpose::Identification => "identification",
            KeyPurpose::Recovery => "recovery",
        };
        write!(f, "{}", name)
    }
}
