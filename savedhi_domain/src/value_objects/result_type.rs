// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Result Type Value Object
//!
//! This module defines the result type: a 32-bit tagged value that selects
//! how a site key materializes into an output, and what export rules govern
//! the stored state that may accompany it.
//!
//! ## Bit Layout
//!
//! - **bits 0–3**: selector within the class (which template, which state
//!   slot)
//! - **bit 4**: template class — the result is encoded from the site key
//!   through a character template
//! - **bit 5**: stateful class — the result is an AES-encrypted stored
//!   secret
//! - **bit 6**: derive class — the result is a binary subkey
//! - **bit 10**: `ExportContent` — the state may be exported even in
//!   redacted files
//! - **bit 11**: `DevicePrivate` — the state never leaves the device
//! - **bit 12**: `Alternate` — never chosen as a purpose's default
//!
//! Exactly one class bit is set for every type other than `None`. The
//! numeric values are contractual: both wire shapes store them.
//!
//! ## Canonical Instances
//!
//! | Name | Value | Class |
//! |------|-------|-------|
//! | `None` | 0 | — |
//! | `TemplateMaximum` | 0x10 | template |
//! | `TemplateLong` | 0x11 | template |
//! | `TemplateMedium` | 0x12 | template |
//! | `TemplateShort` | 0x13 | template |
//! | `TemplateBasic` | 0x14 | template |
//! | `TemplatePIN` | 0x15 | template |
//! | `TemplateName` | 0x1E | template |
//! | `TemplatePhrase` | 0x1F | template |
//! | `StatePersonal` | 0x420 | stateful, exportable |
//! | `StateDevice` | 0x821 | stateful, device-private |
//! | `DeriveKey` | 0x1040 | derive, alternate |

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::SavedhiError;

use super::KeyPurpose;

/// Class bit: result is generated from a character template.
const CLASS_TEMPLATE: u32 = 1 << 4;
/// Class bit: result is a stored, encrypted secret.
const CLASS_STATEFUL: u32 = 1 << 5;
/// Class bit: result is a derived binary subkey.
const CLASS_DERIVE: u32 = 1 << 6;

/// Feature bit: state may be exported in redacted form.
const FEATURE_EXPORT_CONTENT: u32 = 1 << 10;
/// Feature bit: state never leaves the device.
const FEATURE_DEVICE_PRIVATE: u32 = 1 << 11;
/// Feature bit: not a candidate default for any purpose.
const FEATURE_ALTERNATE: u32 = 1 << 12;

/// How a derived site key materializes into an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultType(u32);

impl ResultType {
    /// No result; identification falls back to the user-level login.
    pub const NONE: ResultType = ResultType(0);
    /// 20 characters, contains symbols.
    pub const TEMPLATE_MAXIMUM: ResultType = ResultType(0x10);
    /// Copy-friendly, 14 characters, symbols.
    pub const TEMPLATE_LONG: ResultType = ResultType(0x11);
    /// Copy-friendly, 8 characters, symbols.
    pub const TEMPLATE_MEDIUM: ResultType = ResultType(0x12);
    /// Copy-friendly, 4 characters, no symbols.
    pub const TEMPLATE_SHORT: ResultType = ResultType(0x13);
    /// 8 characters, no symbols.
    pub const TEMPLATE_BASIC: ResultType = ResultType(0x14);
    /// 4 numbers.
    pub const TEMPLATE_PIN: ResultType = ResultType(0x15);
    /// 9 letter name.
    pub const TEMPLATE_NAME: ResultType = ResultType(0x1E);
    /// 20 character sentence.
    pub const TEMPLATE_PHRASE: ResultType = ResultType(0x1F);
    /// Custom saved password, exportable as ciphertext.
    pub const STATE_PERSONAL: ResultType = ResultType(0x420);
    /// Custom saved password, restricted to this device.
    pub const STATE_DEVICE: ResultType = ResultType(0x821);
    /// Derived encryption key.
    pub const DERIVE_KEY: ResultType = ResultType(0x1040);

    const ALL: [ResultType; 12] = [
        ResultType::NONE,
        ResultType::TEMPLATE_MAXIMUM,
        ResultType::TEMPLATE_LONG,
        ResultType::TEMPLATE_MEDIUM,
        ResultType::TEMPLATE_SHORT,
        ResultType::TEMPLATE_BASIC,
        ResultType::TEMPLATE_PIN,
        ResultType::TEMPLATE_NAME,
        ResultType::TEMPLATE_PHRASE,
        ResultType::STATE_PERSONAL,
        ResultType::STATE_DEVICE,
        ResultType::DERIVE_KEY,
    ];

    /// Numeric wire value of this type.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Whether the template class bit is set.
    pub fn is_template(self) -> bool {
        self.0 & CLASS_TEMPLATE != 0
    }

    /// Whether the stateful class bit is set.
    pub fn is_stateful(self) -> bool {
        self.0 & CLASS_STATEFUL != 0
    }

    /// Whether the derive class bit is set.
    pub fn is_derive(self) -> bool {
        self.0 & CLASS_DERIVE != 0
    }

    /// Whether stored state for this type may appear in redacted exports.
    pub fn exports_content(self) -> bool {
        self.0 & FEATURE_EXPORT_CONTENT != 0
    }

    /// Whether stored state for this type must never be exported.
    pub fn is_device_private(self) -> bool {
        self.0 & FEATURE_DEVICE_PRIVATE != 0
    }

    /// Whether this type is excluded from being a purpose default.
    pub fn is_alternate(self) -> bool {
        self.0 & FEATURE_ALTERNATE != 0
    }

    /// The default result type for a purpose.
    pub fn default_for(purpose: KeyPurpose) -> ResultType {
        match purpose {
            KeyPurpose::Authentication => ResultType::TEMPLATE_LONG,
            KeyPurpose::Identification => ResultType::TEMPLATE_NAME,
            KeyPurpose::Recovery => ResultType::TEMPLATE_PHRASE,
        }
    }

    /// Short display name for logs and usage text.
    pub fn short_name(self) -> &'static str {
        match self {
            ResultType::NONE => "none",
            ResultType::TEMPLATE_MAXIMUM => "maximum",
            ResultType::TEMPLATE_LONG => "long",
            ResultType::TEMPLATE_MEDIUM => "medium",
            ResultType::TEMPLATE_SHORT => "short",
            ResultType::TEMPLATE_BASIC => "basic",
            ResultType::TEMPLATE_PIN => "pin",
            ResultType::TEMPLATE_NAME => "name",
            ResultType::TEMPLATE_PHRASE => "phrase",
            ResultType::STATE_PERSONAL => "personal",
            ResultType::STATE_DEVICE => "device",
            ResultType::DERIVE_KEY => "key",
            _ => "unknown",
        }
    }

    /// Parses a type from its CLI name.
    ///
    /// Single letters are matched case-sensitively (`p` is phrase, `P` is
    /// personal); full names are matched case-insensitively.
    pub fn from_name(name: &str) -> Option<ResultType> {
        if name.chars().count() == 1 {
            return match name.chars().next().unwrap() {
                'x' => Some(ResultType::TEMPLATE_MAXIMUM),
                'l' => Some(ResultType::TEMPLATE_LONG),
                'm' => Some(ResultType::TEMPLATE_MEDIUM),
                'b' => Some(ResultType::TEMPLATE_BASIC),
                's' => Some(ResultType::TEMPLATE_SHORT),
                'i' => Some(ResultType::TEMPLATE_PIN),
                'n' => Some(ResultType::TEMPLATE_NAME),
                'p' => Some(ResultType::TEMPLATE_PHRASE),
                'P' => Some(ResultType::STATE_PERSONAL),
                'D' => Some(ResultType::STATE_DEVICE),
                'K' => Some(ResultType::DERIVE_KEY),
                _ => None,
            };
        }

        match name.to_ascii_lowercase().as_str() {
            "none" => Some(ResultType::NONE),
            "max" | "maximum" => Some(ResultType::TEMPLATE_MAXIMUM),
            "long" => Some(ResultType::TEMPLATE_LONG),
            "med" | "medium" => Some(ResultType::TEMPLATE_MEDIUM),
            "basic" => Some(ResultType::TEMPLATE_BASIC),
            "short" => Some(ResultType::TEMPLATE_SHORT),
            "pin" => Some(ResultType::TEMPLATE_PIN),
            "name" => Some(ResultType::TEMPLATE_NAME),
            "phrase" => Some(ResultType::TEMPLATE_PHRASE),
            "personal" => Some(ResultType::STATE_PERSONAL),
            "device" => Some(ResultType::STATE_DEVICE),
            "key" => Some(ResultType::DERIVE_KEY),
            _ => None,
        }
    }
}

impl TryFrom<u32> for ResultType {
    type Error = SavedhiError;

    /// Validates against the closed set of canonical instances.
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ResultType::ALL
            .into_iter()
            .find(|t| t.as_u32() == value)
            .ok_or_else(|| SavedhiError::UnsupportedResultType(format!("result type {:#x} unrecognized", value)))
    }
}

impl Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}
