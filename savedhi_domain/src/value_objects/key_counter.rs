// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Key Counter Value Object
//!
//! The counter lets a user roll a site credential forward without changing
//! the site name: bumping it produces an unrelated result. The zero value is
//! a sentinel selecting time-based results: the salt then carries the wall
//! clock floored to a five-minute window, so the credential rotates every
//! 300 seconds.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::time::{SystemTime, UNIX_EPOCH};

/// Width of the time-based window, in seconds.
const TOTP_WINDOW_SECONDS: u64 = 5 * 60;

/// The per-site credential counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyCounter(u32);

impl KeyCounter {
    /// Sentinel: derive a time-based credential.
    pub const TOTP: KeyCounter = KeyCounter(0);

    /// The first counter value of a fresh site; the default.
    pub const INITIAL: KeyCounter = KeyCounter(1);

    pub fn new(value: u32) -> KeyCounter {
        KeyCounter(value)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn is_totp(self) -> bool {
        self.0 == 0
    }

    /// The counter value that actually enters the site-key salt.
    ///
    /// A fixed counter passes through unchanged; the TOTP sentinel is
    /// replaced with the current time bucket.
    pub fn effective(self) -> u32 {
        if self.is_totp() {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            Self::totp_bucket(now)
        } else {
            self.0
        }
    }

    /// Floors a wall-clock second count to its five-minute window.
    ///
    /// Pure so the window math is testable without a clock.
    pub fn totp_bucket(wall_clock_seconds: u64) -> u32 {
        (wall_clock_seconds / TOTP_WINDOW_SECONDS * TOTP_WINDOW_SECONDS) as u32
    }
}

impl Default for KeyCounter {
    fn default() -> Self {
        KeyCounter::INITIAL
    }
}

impl From<u32> for KeyCounter {
    fn from(value: u32) -> Self {
        KeyCounter(value)
    }
}

impl Display for KeyCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests that fixed counters enter the salt unchanged.
    #[test]
    fn test_fixed_counter_passthrough() {
        assert_eq!(KeyCounter::new(1).effective(), 1);
        assert_eq!(KeyCounter::new(42).effective(), 42);
        assert_eq!(KeyCounter::new(u32::MAX).effective(), u32::MAX);
    }

    /// Tests the five-minute window floor: stable inside a window, changed
    /// across its boundary.
    #[test]
    fn test_totp_bucket_window() {
        assert_eq!(KeyCounter::totp_bucket(0), 0);
        assert_eq!(KeyCounter::totp_bucket(299), 0);
        assert_eq!(KeyCounter::totp_bucket(300), 300);
        assert_eq!(KeyCounter::totp_bucket(599), 300);
        assert_eq!(KeyCounter::totp_bucket(600), 600);

        // Two instants in one window agree; crossing the boundary differs.
        assert_eq!(
            KeyCounter::totp_bucket(1_000_000_013),
            KeyCounter::totp_bucket(1_000_000_014)
        );
        assert_ne!(KeyCounter::totp_bucket(1_000_000_199), KeyCounter::totp_bucket(1_000_000_200));
    }

    /// Tests sentinel and default values.
    #[test]
    fn test_counter_sentinels() {
        assert!(KeyCounter::TOTP.is_totp());
        assert!(!KeyCounter::INITIAL.is_totp());
        assert_eq!(KeyCounter::default(), KeyCounter::INITIAL);
        assert_eq!(KeyCounter::from(7u32).value(), 7);
    }
}
