// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Identicon Value Object
//!
//! The identicon is a deterministic textual avatar derived from a user's
//! name and secret. It gives the user early feedback while typing their
//! secret: a familiar figure means the secret was probably typed correctly,
//! long before any slow key stretching runs.
//!
//! The figure has four glyph slots (left arm, body, right arm, accessory)
//! drawn from small fixed inventories, plus a color. Inventory order is
//! contractual; indices are modular over the first five bytes of
//! HMAC-SHA256(secret, name).

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::crypto;

const LEFT_ARMS: [&str; 4] = ["╔", "╚", "╰", "═"];
const BODIES: [&str; 6] = ["█", "░", "▒", "▓", "☺", "☻"];
const RIGHT_ARMS: [&str; 4] = ["╗", "╝", "╯", "═"];
const ACCESSORIES: [&str; 57] = [
    "◈", "◎", "◐", "◑", "◒", "◓", "☀", "☁", "☂", "☃", "☄", "★", "☆", "☎", "☏", "⎈", "⌂", "☘", "☢",
    "☣", "☕", "⌚", "⌛", "⏰", "⚡", "⛄", "⛅", "☔", "♔", "♕", "♖", "♗", "♘", "♙", "♚", "♛", "♜",
    "♝", "♞", "♟", "♨", "♩", "♪", "♫", "⚐", "⚑", "⚔", "⚖", "⚙", "⚠", "⌘", "⏎", "✄", "✆", "✈",
    "✉", "✌",
];

/// Terminal color slot of an identicon, encoded 1 through 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum IdenticonColor {
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    Mono = 7,
}

impl IdenticonColor {
    fn from_index(value: u8) -> Option<IdenticonColor> {
        match value {
            1 => Some(IdenticonColor::Red),
            2 => Some(IdenticonColor::Green),
            3 => Some(IdenticonColor::Yellow),
            4 => Some(IdenticonColor::Blue),
            5 => Some(IdenticonColor::Magenta),
            6 => Some(IdenticonColor::Cyan),
            7 => Some(IdenticonColor::Mono),
            _ => None,
        }
    }
}

/// A deterministic four-glyph avatar with a color.
///
/// The glyph slots borrow from the fixed inventories; the wire form is
/// [`Identicon::encode`], not a serde shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identicon {
    pub left_arm: &'static str,
    pub body: &'static str,
    pub right_arm: &'static str,
    pub accessory: &'static str,
    pub color: IdenticonColor,
}

impl Identicon {
    /// Derives the identicon for an identity.
    pub fn of(user_name: &str, user_secret: &str) -> Identicon {
        let seed = crypto::hmac_sha256(user_secret.as_bytes(), user_name.as_bytes());

        Identicon {
            left_arm: LEFT_ARMS[seed[0] as usize % LEFT_ARMS.len()],
            body: BODIES[seed[1] as usize % BODIES.len()],
            right_arm: RIGHT_ARMS[seed[2] as usize % RIGHT_ARMS.len()],
            accessory: ACCESSORIES[seed[3] as usize % ACCESSORIES.len()],
            color: IdenticonColor::from_index(seed[4] % 7 + 1).expect("modular index is 1..=7"),
        }
    }

    /// Wire form: `{color}:{leftArm}{body}{rightArm}{accessory}`.
    pub fn encode(&self) -> String {
        format!(
            "{}:{}{}{}{}",
            self.color as u8, self.left_arm, self.body, self.right_arm, self.accessory
        )
    }

    /// Parses the wire form.
    ///
    /// Returns `None` on empty input, an out-of-range color, or any glyph
    /// that is not in its slot's inventory.
    pub fn decode(encoded: &str) -> Option<Identicon> {
        let (color, glyphs) = encoded.split_once(':')?;
        let color = IdenticonColor::from_index(color.trim().parse::<u8>().ok()?)?;

        let (left_arm, glyphs) = match_glyph(&LEFT_ARMS, glyphs)?;
        let (body, glyphs) = match_glyph(&BODIES, glyphs)?;
        let (right_arm, glyphs) = match_glyph(&RIGHT_ARMS, glyphs)?;
        let (accessory, glyphs) = match_glyph(&ACCESSORIES, glyphs)?;
        if !glyphs.is_empty() {
            return None;
        }

        Some(Identicon {
            left_arm,
            body,
            right_arm,
            accessory,
            color,
        })
    }
}

/// Greedy-matches the next glyph against an inventory, returning the match
/// and the remaining input.
fn match_glyph<'a>(inventory: &[&'static str], input: &'a str) -> Option<(&'static str, &'a str)> {
    inventory
        .iter()
        .find(|glyph| input.starts_with(**glyph))
        .map(|glyph| (*glyph, &input[glyph.len()..]))
}

impl Display for Identicon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests the contractual inventory sizes.
    #[test]
    fn test_inventory_sizes() {
        assert_eq!(LEFT_ARMS.len(), 4);
        assert_eq!(BODIES.len(), 6);
        assert_eq!(RIGHT_ARMS.len(), 4);
        assert_eq!(ACCESSORIES.len(), 57);
    }

    /// Tests glyph derivation against known identities.
    ///
    /// The arm/body/accessory picks pin the HMAC seeding and the modular
    /// indexing; a change to either would alter every user's avatar.
    #[test]
    fn test_identicon_known_identities() {
        let icon = Identicon::of("John Doe", "password");
        assert_eq!(icon.left_arm, "╔");
        assert_eq!(icon.body, "░");
        assert_eq!(icon.right_arm, "╝");
        assert_eq!(icon.accessory, "⌚");

        let icon = Identicon::of("Max Müller", "passwort");
        assert_eq!(icon.left_arm, "═");
        assert_eq!(icon.body, "▒");
        assert_eq!(icon.right_arm, "╝");
        assert_eq!(icon.accessory, "♚");
    }

    /// Tests determinism: same identity, same avatar.
    #[test]
    fn test_identicon_deterministic() {
        let a = Identicon::of("Robert Lee Mitchell", "banana colored duckling");
        let b = Identicon::of("Robert Lee Mitchell", "banana colored duckling");
        assert_eq!(a, b);
    }

    /// Tests the encode/decode round trip.
    #[test]
    fn test_identicon_encode_decode_round_trip() {
        let icon = Identicon::of("John Doe", "password");
        let decoded = Identicon::decode(&icon.encode()).unwrap();
        assert_eq!(icon, decoded);
    }

    /// Tests decode failure modes: empty input, bad color, foreign glyphs,
    /// trailing garbage.
    #[test]
    fn test_identicon_decode_rejects_malformed() {
        assert!(Identicon::decode("").is_none());
        assert!(Identicon::decode("8:╔█╗◈").is_none());
        assert!(Identicon::decode("0:╔█╗◈").is_none());
        assert!(Identicon::decode("1:xxxx").is_none());
        assert!(Identicon::decode("1:╔█╗◈!").is_none());
        assert!(Identicon::decode("╔█╗◈").is_none());
    }
}
