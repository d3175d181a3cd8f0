// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Management
//!
//! Provides the standardized Unix exit codes of the CLI contract, following
//! BSD `sysexits.h` conventions:
//!
//! - **0**: success
//! - **64**: command line usage error
//! - **65**: invalid input data (bad parameter, secret mismatch,
//!   unparseable user file)
//! - **70**: internal software error (crypto or key failure)

use std::fmt;

/// Exit codes of the savedhi CLI (BSD sysexits.h subset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful termination (0)
    #[default]
    Success = 0,

    /// Command line usage error (64)
    /// - Invalid arguments
    /// - Unknown flags or flag values
    UsageError = 64,

    /// Data format error (65)
    /// - Invalid input data
    /// - Personal secret does not match the configuration
    /// - Unparseable configuration file
    DataError = 65,

    /// Internal software error (70)
    /// - Key derivation failure
    /// - Cryptographic primitive failure
    Software = 70,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Terminates the process with this code.
    pub fn exit(self) -> ! {
        std::process::exit(self.as_i32())
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExitCode::Success => "success",
            ExitCode::UsageError => "usage error",
            ExitCode::DataError => "data error",
            ExitCode::Software => "software error",
        };
        write!(f, "{} ({})", name, self.as_i32())
    }
}
