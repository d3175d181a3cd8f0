// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Savedhi CLI Entry Point
//!
//! Wires the bootstrap layer (arguments, logging, exit codes) to the
//! application's operation flow. The process does exactly one operation per
//! invocation and exits with the CLI contract's sysexits code.

use savedhi_bootstrap::{logger, parse_and_validate, ExitCode};

fn main() {
    let args = match parse_and_validate() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("savedhi: {}", error);
            ExitCode::UsageError.exit();
        }
    };

    logger::init(args.verbosity);

    if let Err(error) = savedhi::application::operation::run(args) {
        eprintln!("savedhi: {}", error);
        error.exit_code().exit();
    }
}
