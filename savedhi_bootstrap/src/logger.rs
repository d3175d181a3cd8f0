// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging Initialization
//!
//! Sets up the tracing subscriber for the CLI. Diagnostics go to stderr —
//! stdout carries exactly one thing, the generated credential. The level
//! follows the accumulated `-v`/`-q` count, and `RUST_LOG` overrides it
//! when set.

use tracing_subscriber::EnvFilter;

/// Initializes the global subscriber for a verbosity offset: 0 is warn,
/// each -v steps towards trace, each -q towards silence.
pub fn init(verbosity: i8) {
    let level = match verbosity {
        i8::MIN..=-2 => "off",
        -1 => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
