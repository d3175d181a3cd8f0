// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error Module
//!
//! This module provides the error types for the savedhi domain layer. The
//! error set is closed: every failure the engine can produce maps onto
//! exactly one variant, so callers can dispatch on failure kind without
//! string matching.
//!
//! ## Overview
//!
//! The error module defines domain-specific errors that:
//!
//! - **Express Derivation Failures**: missing inputs, unsupported versions
//!   or result classes, primitive-level failures
//! - **Express Marshalling Failures**: structural, missing-field and
//!   out-of-range conditions in the two wire shapes
//! - **Maintain Type Safety**: strongly-typed variants for compile-time
//!   exhaustiveness
//! - **Support Redaction**: messages never carry secret material
//!
//! ## Error Handling Patterns
//!
//! Errors propagate with `?` inside the engine. On marshal paths they are
//! additionally surfaced through the [`crate::marshal::MarshalledFile`]
//! error channel so a caller holding a partially-parsed file can still read
//! its metadata.

mod savedhi_error;

pub use savedhi_error::SavedhiError;
