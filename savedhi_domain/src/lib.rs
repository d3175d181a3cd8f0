// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Savedhi Domain
//!
//! The savedhi domain implements a deterministic credential derivation
//! engine: given a user identity (a name and a secret phrase) and a site
//! descriptor (a name, a counter, a purpose and a result type), it computes
//! a reproducible credential — a human-typeable password, a login handle, a
//! recovery answer, a symmetric key, or an encrypted stateful blob. The same
//! inputs always produce the same output, on any platform, forever, and no
//! credential is ever stored unless the user elects the stateful path.
//!
//! This crate is the pure core: no file I/O, no terminal, no network, no
//! ambient configuration. The CLI and its storage live in the application
//! crates.
//!
//! ## Module Structure
//!
//! - [`crypto`]: the primitives facade — scrypt, HMAC-SHA256, SHA-256,
//!   AES-128-CBC, blake2b, base64, UTF-8 counting
//! - [`value_objects`]: algorithm versions, purposes, result types,
//!   counters, fingerprints, key material, identicons
//! - [`algorithm`]: the versioned derivation pipeline and its dispatcher
//! - [`marshal`]: the data tree and the two on-disk wire shapes
//! - [`error`]: the closed failure set
//!
//! ## Dataflow
//!
//! ```text
//! identity --(scrypt)--> UserKey --(HMAC over site salt)--> SiteKey
//!     SiteKey --(template | stateful | derive branch)--> result
//! ```
//!
//! Marshal read parses a file into a data tree, authenticates the user-key
//! fingerprint, and rehydrates a user record; marshal write reverses this,
//! redacted (secrets omitted or ciphertext-only) or cleartext.
//!
//! ## Concurrency Model
//!
//! Single-threaded and synchronous: nothing in the engine suspends, and a
//! batch over N sites costs one scrypt per distinct (user, algorithm) pair
//! plus N cheap HMAC derivations. Key material wipes itself on drop.

pub mod algorithm;
pub mod crypto;
pub mod error;
pub mod marshal;
pub mod value_objects;

// Re-export commonly used types for convenient access
// These exports provide a clean API surface for consumers of the domain layer
pub use algorithm::{site_key, site_result, site_state, user_key};
pub use error::SavedhiError;
pub use marshal::{
    marshal_auth, marshal_read, marshal_write, CachingKeyProvider, MarshalFormat, MarshalledFile, MarshalledInfo,
    MarshalledQuestion, MarshalledSite, MarshalledUser, UserKeyProvider,
};
pub use value_objects::{
    AlgorithmVersion, Identicon, IdenticonColor, KeyCounter, KeyId, KeyPurpose, ResultType, SiteKey, UserKey,
};
