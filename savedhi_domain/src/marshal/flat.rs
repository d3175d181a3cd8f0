// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Flat Wire Shape
//!
//! The line-based ASCII export. Free comments precede the first `##`;
//! `# Key: Value` headers sit between the first and second `##`; site
//! records follow, one per line. Two record sub-versions exist, selected by
//! the `# Format: N` header:
//!
//! ```text
//! format 0:  lastUsed uses type:algorithm siteName<TAB>resultState
//! format 1:  lastUsed uses type:algorithm:counter loginState<TAB>siteName<TAB>resultState
//! ```
//!
//! The reader accepts both `User Name` and `Full Name` headers as synonyms;
//! the writer emits both, `Full Name` being the current-era spelling.

use chrono::DateTime;

use crate::value_objects::{AlgorithmVersion, ResultType};
use crate::SavedhiError;

use super::data::MarshalledData;

/// Parses a flat export into the unified data tree.
pub(crate) fn read_flat(input: &str) -> Result<MarshalledData, SavedhiError> {
    let mut tree = MarshalledData::new();
    let mut format: u32 = 0;
    let mut delimiters_seen = 0;

    for line in input.lines() {
        if delimiters_seen < 2 {
            if line.starts_with("##") {
                delimiters_seen += 1;
                continue;
            }
            let Some(rest) = line.strip_prefix('#') else {
                continue;
            };
            if delimiters_seen == 0 {
                // Free leading comments.
                continue;
            }
            let Some((key, value)) = rest.split_once(':') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            read_header(&mut tree, &mut format, key, value)?;
            continue;
        }

        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        read_site_record(&mut tree, format, line)?;
    }

    if delimiters_seen < 2 {
        return Err(SavedhiError::FormatStructure(
            "flat header is not terminated by a second ## delimiter".to_string(),
        ));
    }

    Ok(tree)
}

fn read_header(tree: &mut MarshalledData, format: &mut u32, key: &str, value: &str) -> Result<(), SavedhiError> {
    match key {
        "Format" => {
            *format = value
                .parse()
                .ok()
                .filter(|f| *f <= 1)
                .ok_or_else(|| SavedhiError::FormatStructure(format!("unsupported flat format: {:?}", value)))?;
        }
        "Date" => tree.set_str(value, &["export", "date"]),
        "Passwords" => tree.set_bool(value != "VISIBLE", &["export", "redacted"]),
        "User Name" | "Full Name" => tree.set_str(value, &["user", "full_name"]),
        "Avatar" => {
            let avatar: u32 = value
                .parse()
                .map_err(|_| SavedhiError::FormatIllegal(format!("Avatar: {:?}", value)))?;
            tree.set_num(avatar as f64, &["user", "avatar"]);
        }
        "Identicon" => tree.set_str(value, &["user", "identicon"]),
        "Key ID" => tree.set_str(value, &["user", "key_id"]),
        "Algorithm" => {
            let version: u32 = value
                .parse()
                .map_err(|_| SavedhiError::FormatIllegal(format!("Algorithm: {:?}", value)))?;
            AlgorithmVersion::try_from(version)
                .map_err(|_| SavedhiError::FormatIllegal(format!("Algorithm: {:?}", value)))?;
            tree.set_num(version as f64, &["user", "algorithm"]);
        }
        "Default Type" => {
            let result_type: u32 = value
                .parse()
                .map_err(|_| SavedhiError::FormatIllegal(format!("Default Type: {:?}", value)))?;
            ResultType::try_from(result_type)
                .map_err(|_| SavedhiError::FormatIllegal(format!("Default Type: {:?}", value)))?;
            tree.set_num(result_type as f64, &["user", "default_type"]);
        }
        // Unknown headers are tolerated for forward compatibility.
        _ => {}
    }
    Ok(())
}

fn read_site_record(tree: &mut MarshalledData, format: u32, line: &str) -> Result<(), SavedhiError> {
    let mut columns = line.split('\t');
    let head = columns.next().unwrap_or_default();

    let (last_used, head) = take_token(head);
    let (uses, head) = take_token(head);
    let (type_and_version, head) = take_token(head);
    let tail = head.trim();

    // Validate the record fields up front; a bad record poisons the file.
    DateTime::parse_from_rfc3339(last_used)
        .map_err(|_| SavedhiError::FormatIllegal(format!("site lastUsed: {:?}", last_used)))?;
    let uses: u32 = uses
        .parse()
        .map_err(|_| SavedhiError::FormatIllegal(format!("site uses: {:?}", uses)))?;

    let mut tav = type_and_version.split(':');
    let result_type = parse_record_num(tav.next(), "site type")?;
    ResultType::try_from(result_type)
        .map_err(|_| SavedhiError::FormatIllegal(format!("site type: {}", result_type)))?;
    let algorithm = parse_record_num(tav.next(), "site algorithm")?;
    AlgorithmVersion::try_from(algorithm)
        .map_err(|_| SavedhiError::FormatIllegal(format!("site algorithm: {}", algorithm)))?;

    let (counter, login_state, site_name, result_state) = match format {
        0 => {
            let site_name = tail;
            let result_state = columns.next().unwrap_or_default().trim();
            (1u32, "", site_name, result_state)
        }
        _ => {
            let counter = parse_record_num(tav.next(), "site counter")?;
            let site_name = columns.next().unwrap_or_default().trim();
            let result_state = columns.next().unwrap_or_default().trim();
            (counter, tail, site_name, result_state)
        }
    };

    if site_name.is_empty() {
        return Err(SavedhiError::FormatMissing("site name in flat record".to_string()));
    }

    tree.set_str(last_used, &["sites", site_name, "last_used"]);
    tree.set_num(uses as f64, &["sites", site_name, "uses"]);
    tree.set_num(result_type as f64, &["sites", site_name, "type"]);
    tree.set_num(algorithm as f64, &["sites", site_name, "algorithm"]);
    tree.set_num(counter as f64, &["sites", site_name, "counter"]);
    if !login_state.is_empty() {
        tree.set_str(login_state, &["sites", site_name, "login_name"]);
    }
    if !result_state.is_empty() {
        tree.set_str(result_state, &["sites", site_name, "password"]);
    }
    Ok(())
}

/// Splits the next whitespace-delimited token off a record head.
fn take_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    (&s[..end], &s[end..])
}

fn parse_record_num(field: Option<&str>, what: &str) -> Result<u32, SavedhiError> {
    field
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| SavedhiError::FormatIllegal(format!("{}: {:?}", what, field.unwrap_or(""))))
}

/// Serializes the unified data tree as a format-1 flat export.
pub(crate) fn write_flat(tree: &MarshalledData) -> Result<String, SavedhiError> {
    let redacted = tree.get_bool(&["export", "redacted"]);
    let user_name = tree
        .get_str(&["user", "full_name"])
        .ok_or_else(|| SavedhiError::FormatMissing("user.full_name".to_string()))?;

    let mut out = String::with_capacity(1024);
    out.push_str("# savedhi site export\n");
    if redacted {
        out.push_str("#     Export of site names and stored passwords (unless device-private) encrypted with the user key.\n");
    } else {
        out.push_str("#     Export of site names and passwords in clear-text.\n");
    }
    out.push_str("# \n");
    out.push_str("##\n");
    out.push_str("# Format: 1\n");

    if let Some(date) = tree.get_str(&["export", "date"]) {
        out.push_str(&format!("# Date: {}\n", date));
    }
    out.push_str(&format!("# User Name: {}\n", user_name));
    out.push_str(&format!("# Full Name: {}\n", user_name));
    out.push_str(&format!("# Avatar: {}\n", tree_num(tree, &["user", "avatar"], 0)));
    if let Some(identicon) = tree.get_str(&["user", "identicon"]) {
        out.push_str(&format!("# Identicon: {}\n", identicon));
    }
    if let Some(key_id) = tree.get_str(&["user", "key_id"]) {
        out.push_str(&format!("# Key ID: {}\n", key_id));
    }
    out.push_str(&format!("# Algorithm: {}\n", tree_num(tree, &["user", "algorithm"], 3)));
    out.push_str(&format!(
        "# Default Type: {}\n",
        tree_num(tree, &["user", "default_type"], ResultType::TEMPLATE_LONG.as_u32() as u64)
    ));
    out.push_str(&format!("# Passwords: {}\n", if redacted { "PROTECTED" } else { "VISIBLE" }));
    out.push_str("##\n");
    out.push_str("#\n");
    out.push_str("#               Last     Times  Password                      Login\t                     Site\tSite\n");
    out.push_str("#               used      used      type                       name\t                     name\tpassword\n");

    let empty = MarshalledData::new();
    let sites = tree.find(&["sites"]).unwrap_or(&empty);
    for site in sites.children() {
        let Some(site_name) = site.obj_key() else {
            continue;
        };
        let type_and_version = format!(
            "{}:{}:{}",
            tree_num(site, &["type"], 0),
            tree_num(site, &["algorithm"], 0),
            tree_num(site, &["counter"], 1)
        );
        out.push_str(&format!(
            "{}  {:>8}  {:>8}  {:>25}\t{:>25}\t{}\n",
            site.get_str(&["last_used"]).unwrap_or("1970-01-01T00:00:00Z"),
            tree_num(site, &["uses"], 0),
            type_and_version,
            site.get_str(&["login_name"]).unwrap_or(""),
            site_name,
            site.get_str(&["password"]).unwrap_or(""),
        ));
    }

    Ok(out)
}

/// An integral tree number for flat emission; the flat shape never uses
/// scientific notation.
fn tree_num(tree: &MarshalledData, path: &[&str], fallback: u64) -> u64 {
    let value = tree.get_num(path);
    if value.is_nan() {
        fallback
    } else {
        value as u64
    }
}
