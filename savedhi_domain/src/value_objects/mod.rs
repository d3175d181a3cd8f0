// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Value Objects
//!
//! Immutable, self-validating values of the credential domain. Two value
//! objects with the same attributes are the same value; none of them has an
//! identity of its own.
//!
//! - [`AlgorithmVersion`]: which generation of the derivation rules applies
//! - [`KeyPurpose`]: what a derived key is for, and its salt scope
//! - [`ResultType`]: how a site key materializes, and its export features
//! - [`KeyCounter`]: the per-site rotation counter with its TOTP sentinel
//! - [`KeyId`]: SHA-256 fingerprint of key material
//! - [`UserKey`] / [`SiteKey`]: owned key material with wipe-on-drop rules
//! - [`Identicon`]: the deterministic avatar of an identity

mod algorithm_version;
mod identicon;
mod key_counter;
mod key_id;
mod key_purpose;
mod result_type;
mod site_key;
mod user_key;

pub use algorithm_version::AlgorithmVersion;
pub use identicon::{Identicon, IdenticonColor};
pub use key_counter::KeyCounter;
pub use key_id::KeyId;
pub use key_purpose::KeyPurpose;
pub use result_type::ResultType;
pub use site_key::SiteKey;
pub use user_key::UserKey;
