// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # JSON Wire Shape
//!
//! The structured export: `export.*` metadata, `user.*` fields, and a
//! `sites` object keyed by site name, each site carrying its settings,
//! state fields, `questions` and the `_ext_savedhi` extension block.
//!
//! Writes emit sub-version 2; reads accept 1 and 2. Sub-version 1 stored
//! the then-default login type explicitly on every site; on read it is
//! nulled out so those sites inherit the user-level login again.

use crate::value_objects::ResultType;
use crate::SavedhiError;

use super::data::MarshalledData;

/// Parses a JSON export into the unified data tree.
pub(crate) fn read_json(input: &str) -> Result<MarshalledData, SavedhiError> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    let mut tree = MarshalledData::from_json(&value);

    let format = tree.get_num(&["export", "format"]);
    if format.is_nan() {
        return Err(SavedhiError::FormatMissing("export.format".to_string()));
    }
    if format != 1.0 && format != 2.0 {
        return Err(SavedhiError::FormatStructure(format!(
            "unsupported JSON format: {}",
            format
        )));
    }

    // Format 1 wrote the era's default login type on every site; null it
    // out so those sites inherit from the user.
    if format == 1.0 {
        let site_names: Vec<String> = tree
            .find(&["sites"])
            .map(|sites| {
                sites
                    .children()
                    .iter()
                    .filter_map(|s| s.obj_key().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        for name in site_names {
            let login_type = tree.get_num(&["sites", &name, "login_type"]);
            if login_type == ResultType::TEMPLATE_NAME.as_u32() as f64 {
                tree.set_null(&["sites", &name, "login_type"]);
            }
        }
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests parsing of a minimal format-2 export.
    #[test]
    fn test_read_json_format2() {
        let input = r#"{
            "export": {"format": 2, "redacted": true},
            "user": {"full_name": "Tester", "algorithm": 3},
            "sites": {"x.com": {"type": 17, "counter": 2}}
        }"#;
        let tree = read_json(input).unwrap();
        assert_eq!(tree.get_str(&["user", "full_name"]), Some("Tester"));
        assert_eq!(tree.get_num(&["sites", "x.com", "counter"]), 2.0);
    }

    /// Tests the format-1 login-type fix-up: the legacy default (30) is
    /// nulled so the site inherits, while explicit other types survive.
    #[test]
    fn test_read_json_format1_login_fixup() {
        let input = r#"{
            "export": {"format": 1, "redacted": true},
            "user": {"full_name": "Tester", "algorithm": 3},
            "sites": {
                "inherits.example": {"type": 17, "login_type": 30},
                "explicit.example": {"type": 17, "login_type": 31}
            }
        }"#;
        let tree = read_json(input).unwrap();
        assert!(tree.is_null(&["sites", "inherits.example", "login_type"]));
        assert_eq!(tree.get_num(&["sites", "explicit.example", "login_type"]), 31.0);
    }

    /// Tests structural rejection: missing and unknown format versions.
    #[test]
    fn test_read_json_rejects_bad_formats() {
        assert!(matches!(
            read_json(r#"{"user": {"full_name": "X"}}"#),
            Err(SavedhiError::FormatMissing(_))
        ));
        assert!(matches!(
            read_json(r#"{"export": {"format": 3}}"#),
            Err(SavedhiError::FormatStructure(_))
        ));
        assert!(matches!(
            read_json("{ not json"),
            Err(SavedhiError::FormatStructure(_))
        ));
    }
}
