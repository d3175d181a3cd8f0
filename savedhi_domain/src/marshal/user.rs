// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Marshalled User Records
//!
//! The in-memory shape of a user file: a user, their sites, and each site's
//! recovery questions. State fields (`result_state`, `login_state`,
//! question `state`) always hold the *stored* form: base64 ciphertext for
//! current files, or the legacy cleartext a very old unredacted file may
//! still carry. A file's clear form is only a wire shape; reading one
//! re-encrypts every state under the local user key.
//!
//! ## Key Providers
//!
//! Reading or writing cleartext needs user keys, possibly at several
//! algorithm versions (each site pins its own). The [`UserKeyProvider`]
//! trait injects that capability; [`CachingKeyProvider`] is the standard
//! implementation, holding the user secret for the life of one operation
//! and re-running scrypt only when the requested version changes.

use chrono::{DateTime, Utc};
use zeroize::Zeroize;

use crate::algorithm;
use crate::value_objects::{AlgorithmVersion, Identicon, KeyCounter, KeyId, ResultType, UserKey};
use crate::SavedhiError;

/// A recovery question attached to a site.
#[derive(Debug, Clone, PartialEq)]
pub struct MarshalledQuestion {
    /// Most significant word of the security question; may be empty for a
    /// site's single unnamed question.
    pub keyword: String,
    pub result_type: ResultType,
    pub state: Option<String>,
}

impl MarshalledQuestion {
    pub fn new(keyword: impl Into<String>) -> MarshalledQuestion {
        MarshalledQuestion {
            keyword: keyword.into(),
            result_type: ResultType::TEMPLATE_PHRASE,
            state: None,
        }
    }
}

/// A site record of a user file.
#[derive(Debug, Clone, PartialEq)]
pub struct MarshalledSite {
    pub site_name: String,
    pub algorithm: AlgorithmVersion,
    pub counter: KeyCounter,
    pub result_type: ResultType,
    pub result_state: Option<String>,
    /// `NONE` inherits the user-level login.
    pub login_type: ResultType,
    pub login_state: Option<String>,
    pub url: Option<String>,
    pub uses: u32,
    pub last_used: DateTime<Utc>,
    pub questions: Vec<MarshalledQuestion>,
}

impl MarshalledSite {
    /// Creates a fresh site record.
    ///
    /// # Errors
    ///
    /// `MissingInput` when the site name is empty.
    pub fn new(
        site_name: impl Into<String>,
        result_type: ResultType,
        counter: KeyCounter,
        algorithm: AlgorithmVersion,
    ) -> Result<MarshalledSite, SavedhiError> {
        let site_name = site_name.into();
        if site_name.is_empty() {
            return Err(SavedhiError::MissingInput("siteName".to_string()));
        }

        Ok(MarshalledSite {
            site_name,
            algorithm,
            counter,
            result_type,
            result_state: None,
            login_type: ResultType::NONE,
            login_state: None,
            url: None,
            uses: 0,
            last_used: DateTime::UNIX_EPOCH,
            questions: Vec::new(),
        })
    }

    /// Finds the question matching a keyword; an absent context matches the
    /// unnamed question.
    pub fn find_question(&self, keyword: Option<&str>) -> Option<usize> {
        let wanted = keyword.unwrap_or("");
        self.questions.iter().position(|q| q.keyword == wanted)
    }
}

/// A user record: the root of a user file.
#[derive(Debug, Clone, PartialEq)]
pub struct MarshalledUser {
    pub user_name: String,
    pub algorithm: AlgorithmVersion,
    pub avatar: u32,
    pub identicon: Option<Identicon>,
    pub key_id: Option<KeyId>,
    pub default_type: ResultType,
    pub login_type: ResultType,
    pub login_state: Option<String>,
    pub last_used: DateTime<Utc>,
    pub redacted: bool,
    pub sites: Vec<MarshalledSite>,
}

impl MarshalledUser {
    /// Creates a fresh user record with the standard defaults.
    ///
    /// # Errors
    ///
    /// `MissingInput` when the user name is empty.
    pub fn new(user_name: impl Into<String>, algorithm: AlgorithmVersion) -> Result<MarshalledUser, SavedhiError> {
        let user_name = user_name.into();
        if user_name.is_empty() {
            return Err(SavedhiError::MissingInput("userName".to_string()));
        }

        Ok(MarshalledUser {
            user_name,
            algorithm,
            avatar: 0,
            identicon: None,
            key_id: None,
            default_type: ResultType::TEMPLATE_LONG,
            login_type: ResultType::TEMPLATE_NAME,
            login_state: None,
            last_used: DateTime::UNIX_EPOCH,
            redacted: true,
            sites: Vec::new(),
        })
    }

    /// Finds a site by name.
    pub fn find_site(&self, site_name: &str) -> Option<usize> {
        self.sites.iter().position(|s| s.site_name == site_name)
    }
}

/// Capability to produce a user key at a requested algorithm version.
///
/// Injected into the marshal entry points; the engine never holds a user
/// secret of its own.
pub trait UserKeyProvider {
    fn user_key(&mut self, algorithm: AlgorithmVersion, user_name: &str) -> Result<UserKey, SavedhiError>;
}

impl<F> UserKeyProvider for F
where
    F: FnMut(AlgorithmVersion, &str) -> Result<UserKey, SavedhiError>,
{
    fn user_key(&mut self, algorithm: AlgorithmVersion, user_name: &str) -> Result<UserKey, SavedhiError> {
        self(algorithm, user_name)
    }
}

/// The standard provider: owns the user secret for the life of one marshal
/// operation and caches the last-derived key, re-running scrypt only when
/// the requested algorithm changes.
pub struct CachingKeyProvider {
    user_secret: String,
    cached: Option<UserKey>,
}

impl CachingKeyProvider {
    pub fn new(user_secret: impl Into<String>) -> CachingKeyProvider {
        CachingKeyProvider {
            user_secret: user_secret.into(),
            cached: None,
        }
    }

    /// Drops the cached key; its bytes are wiped by its drop.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

impl UserKeyProvider for CachingKeyProvider {
    fn user_key(&mut self, algorithm: AlgorithmVersion, user_name: &str) -> Result<UserKey, SavedhiError> {
        if let Some(cached) = &self.cached {
            if cached.algorithm() == algorithm {
                return Ok(cached.clone());
            }
        }

        let key = algorithm::user_key(user_name, &self.user_secret, algorithm)?;
        self.cached = Some(key.clone());
        Ok(key)
    }
}

impl Drop for CachingKeyProvider {
    fn drop(&mut self) {
        self.user_secret.zeroize();
    }
}
