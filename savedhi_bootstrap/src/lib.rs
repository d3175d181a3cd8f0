// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Savedhi Bootstrap
//!
//! Entry-point concerns for the savedhi CLI, kept apart from both the
//! engine and the application flow:
//!
//! - `cli`: clap argument surface and its validation layer
//! - `exit_code`: BSD `sysexits.h` exit codes the CLI contract fixes
//! - `terminal`: line and no-echo secret prompting, file-descriptor input
//! - `logger`: tracing initialization driven by `-v`/`-q`

pub mod cli;
pub mod exit_code;
pub mod logger;
pub mod terminal;

pub use cli::{parse_and_validate, Cli, ParseError, ValidatedCli};
pub use exit_code::ExitCode;
