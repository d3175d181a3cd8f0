// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Savedhi CLI Application
//!
//! The command-line front end of the savedhi credential engine. One
//! invocation performs one operation: resolve the identity, load the user's
//! configuration file, select the site and purpose, materialize the
//! credential onto stdout, and save the updated configuration.
//!
//! ## Architecture
//!
//! - **Application layer** ([`application`]): the operation flow — the
//!   ordered, fallible steps from validated arguments to a printed result
//! - **Infrastructure layer** ([`infrastructure`]): the user-file store
//!   under `~/.savedhi.d` with cross-format discovery
//! - The domain engine and the bootstrap (argument, terminal, logging)
//!   concerns live in their own crates

pub mod application;
pub mod infrastructure;

pub use application::operation::{AppError, Operation};
