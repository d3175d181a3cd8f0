// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling: clap parses the raw flags, a validation
//! layer range-checks every numeric value, and the application receives a
//! [`ValidatedCli`] it can trust.
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. Cli::parse()                    │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validate()                      │  Range/value validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated arguments
//! └─────────────────────────────────────┘
//! ```
//!
//! Type, purpose and format names stay strings here; mapping them onto
//! domain values is the application's concern.

use clap::Parser;
use thiserror::Error;

/// Validation failures of the argument layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid value for -{arg}: {reason}")]
    InvalidValue { arg: String, reason: String },
}

/// The raw savedhi argument surface.
#[derive(Parser, Debug)]
#[command(
    name = "savedhi",
    version,
    about = "Deterministic credential engine - derives site passwords, logins, answers and keys from one personal secret",
    after_help = "ENVIRONMENT:\n  \
        SAVEDHI_USERNAME   The user name of the user (see -u).\n  \
        SAVEDHI_ALGORITHM  The default algorithm version (see -a).\n  \
        SAVEDHI_FORMAT     The default file format (see -f)."
)]
pub struct Cli {
    /// User name of the user; the personal secret is checked against the
    /// user's configuration
    #[arg(short = 'u', value_name = "user-name", env = "SAVEDHI_USERNAME")]
    pub user_name: Option<String>,

    /// Like -u, but allows updating the configuration to a new personal
    /// secret
    #[arg(short = 'U', value_name = "user-name", conflicts_with = "user_name")]
    pub user_name_updating: Option<String>,

    /// Read the personal secret from a file descriptor (prefer printf over
    /// echo: no stray newline)
    #[arg(short = 's', value_name = "fd", allow_negative_numbers = true)]
    pub user_secret_fd: Option<i32>,

    /// Personal secret as an argument; unsafe, for testing only
    #[arg(short = 'S', value_name = "secret", hide = true)]
    pub user_secret: Option<String>,

    /// Result template: x/maximum, l/long, m/medium, b/basic, s/short,
    /// i/pin, n/name, p/phrase, K/key, P/personal
    #[arg(short = 't', value_name = "pw-type")]
    pub result_type: Option<String>,

    /// Parameter value: login name (-p i), key bit size (-t K), or the
    /// personal password to encrypt (-t P)
    #[arg(short = 'P', value_name = "value")]
    pub result_param: Option<String>,

    /// Counter value, defaults to 1; 0 selects time-based results
    #[arg(short = 'c', value_name = "counter", allow_negative_numbers = true)]
    pub key_counter: Option<String>,

    /// Algorithm version to use, 0 - 3
    #[arg(short = 'a', value_name = "version", env = "SAVEDHI_ALGORITHM")]
    pub algorithm: Option<String>,

    /// Purpose of the generated token: a/auth, i/ident, r/rec
    #[arg(short = 'p', value_name = "purpose")]
    pub purpose: Option<String>,

    /// Purpose-specific context; for -p r, the most significant word of the
    /// security question
    #[arg(short = 'C', value_name = "context")]
    pub key_context: Option<String>,

    /// Preferred file format (n/none, f/flat, j/json); reads fall back
    /// across formats and saves use the default format
    #[arg(short = 'f', value_name = "format", env = "SAVEDHI_FORMAT")]
    pub file_format: Option<String>,

    /// Pinned file format: read and write only this format
    #[arg(short = 'F', value_name = "format", conflicts_with = "file_format")]
    pub file_format_fixed: Option<String>,

    /// Whether to save the file redacted (1, default) or in the clear (0)
    #[arg(short = 'R', value_name = "redacted")]
    pub file_redacted: Option<String>,

    /// Increase output verbosity (can be repeated)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease output verbosity (can be repeated)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Omit the trailing newline in the result output
    #[arg(short = 'n')]
    pub omit_newline: bool,

    /// Name of the site for which to generate a token
    #[arg(value_name = "site-name")]
    pub site_name: Option<String>,
}

/// Validated CLI arguments: every numeric value is range-checked.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub user_name: Option<String>,
    pub allow_secret_update: bool,
    pub user_secret_fd: Option<i32>,
    pub user_secret: Option<String>,
    pub result_type: Option<String>,
    pub result_param: Option<String>,
    pub key_counter: Option<u32>,
    pub algorithm: Option<u32>,
    pub purpose: Option<String>,
    pub key_context: Option<String>,
    pub file_format: Option<String>,
    pub file_format_fixed: bool,
    pub file_redacted: Option<bool>,
    pub verbosity: i8,
    pub omit_newline: bool,
    pub site_name: Option<String>,
}

/// Parses and validates the argument surface.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    validate(Cli::parse())
}

fn validate(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let key_counter = match &cli.key_counter {
        None => None,
        Some(raw) => Some(raw.parse::<u32>().map_err(|_| ParseError::InvalidValue {
            arg: "c".to_string(),
            reason: format!("counter {:?} is not in 0..=4294967295", raw),
        })?),
    };

    let algorithm = match &cli.algorithm {
        None => None,
        Some(raw) => {
            let version = raw.parse::<u32>().ok().filter(|v| *v <= 3);
            Some(version.ok_or_else(|| ParseError::InvalidValue {
                arg: "a".to_string(),
                reason: format!("algorithm version {:?} is not in 0..=3", raw),
            })?)
        }
    };

    let file_redacted = match cli.file_redacted.as_deref() {
        None => None,
        Some("0") | Some("false") | Some("no") => Some(false),
        Some("1") | Some("true") | Some("yes") => Some(true),
        Some(other) => {
            return Err(ParseError::InvalidValue {
                arg: "R".to_string(),
                reason: format!("redacted flag {:?} is not 0 or 1", other),
            })
        }
    };

    if let Some(fd) = cli.user_secret_fd {
        if fd < 0 {
            return Err(ParseError::InvalidValue {
                arg: "s".to_string(),
                reason: format!("file descriptor {} is negative", fd),
            });
        }
    }

    let allow_secret_update = cli.user_name_updating.is_some();
    Ok(ValidatedCli {
        user_name: cli.user_name_updating.or(cli.user_name),
        allow_secret_update,
        user_secret_fd: cli.user_secret_fd,
        user_secret: cli.user_secret,
        result_type: cli.result_type,
        result_param: cli.result_param,
        key_counter,
        algorithm,
        purpose: cli.purpose,
        key_context: cli.key_context,
        file_format: cli.file_format_fixed.clone().or(cli.file_format),
        file_format_fixed: cli.file_format_fixed.is_some(),
        file_redacted,
        verbosity: cli.verbose as i8 - cli.quiet as i8,
        omit_newline: cli.omit_newline,
        site_name: cli.site_name,
    })
}
