// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Terminal Input
//!
//! Interactive prompting for the pieces of an operation the arguments did
//! not supply. Prompts go to stderr so stdout stays clean for the generated
//! credential; the secret prompt disables terminal echo on Unix.

use std::io::{self, BufRead, Write};

/// Prompts for one line of input. `None` on end of input.
pub fn prompt_line(prompt: &str) -> io::Result<Option<String>> {
    eprint!("{} ", prompt);
    io::stderr().flush()?;
    read_stdin_line()
}

/// Prompts for a secret without echoing it back. `None` on end of input.
#[cfg(unix)]
pub fn prompt_secret(prompt: &str) -> io::Result<Option<String>> {
    eprint!("{} ", prompt);
    io::stderr().flush()?;

    let fd = libc::STDIN_FILENO;
    let mut term: libc::termios = unsafe { std::mem::zeroed() };
    let is_tty = unsafe { libc::tcgetattr(fd, &mut term) } == 0;

    if !is_tty {
        // Piped input; nothing to hide.
        return read_stdin_line();
    }

    let original = term;
    term.c_lflag &= !libc::ECHO;
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &term) } != 0 {
        return Err(io::Error::last_os_error());
    }

    let line = read_stdin_line();

    // Echo must come back even when the read failed.
    unsafe { libc::tcsetattr(fd, libc::TCSANOW, &original) };
    eprintln!();
    line
}

/// Prompts for a secret; echo suppression is unavailable off-Unix.
#[cfg(not(unix))]
pub fn prompt_secret(prompt: &str) -> io::Result<Option<String>> {
    prompt_line(prompt)
}

/// Reads the full content of an inherited file descriptor.
#[cfg(unix)]
pub fn read_fd(fd: i32) -> io::Result<String> {
    let mut content = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let count = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        if count < 0 {
            return Err(io::Error::last_os_error());
        }
        if count == 0 {
            break;
        }
        content.extend_from_slice(&buf[..count as usize]);
    }
    String::from_utf8(content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// File descriptors cannot be inherited portably off-Unix.
#[cfg(not(unix))]
pub fn read_fd(_fd: i32) -> io::Result<String> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "secret file descriptors are only supported on Unix",
    ))
}

fn read_stdin_line() -> io::Result<Option<String>> {
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}
