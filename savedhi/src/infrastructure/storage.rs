// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # User File Store
//!
//! User configurations live at `~/.savedhi.d/<userName>.<ext>`, path
//! separators in the user name replaced by `_`. Each wire shape has its
//! extension (`mpsites` flat, `mpjson` JSON); discovery tries the preferred
//! shape first and falls back across the others unless the caller pinned
//! one.
//!
//! Read failures are not fatal to an operation — a missing or unreadable
//! file simply means a fresh user — and save failures only cost
//! persistence, never the already-printed credential.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use savedhi_domain::MarshalFormat;

/// Directory name of the store, under the user's home.
const STORE_DIR: &str = ".savedhi.d";

/// The store root for the current environment.
pub fn store_dir() -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    home.join(STORE_DIR)
}

/// The file path of a user's configuration in a given shape, inside an
/// explicit store root.
pub fn user_file_in(root: &Path, user_name: &str, format: MarshalFormat) -> PathBuf {
    root.join(format!("{}.{}", sanitize_file_name(user_name), format.extension()))
}

/// The file path of a user's configuration in a given shape.
pub fn user_file(user_name: &str, format: MarshalFormat) -> PathBuf {
    user_file_in(&store_dir(), user_name, format)
}

/// Replaces path separators in a user name so it stays one file name.
fn sanitize_file_name(user_name: &str) -> String {
    user_name
        .chars()
        .map(|c| if std::path::is_separator(c) { '_' } else { c })
        .collect()
}

/// Locates a user's configuration file inside an explicit store root.
///
/// The preferred shape is tried first; unless pinned, the remaining shapes
/// are tried in discovery order (newest first).
pub fn find_user_file_in(
    root: &Path,
    user_name: &str,
    preferred: Option<MarshalFormat>,
    pinned: bool,
) -> Option<(MarshalFormat, PathBuf)> {
    let mut candidates: Vec<MarshalFormat> = Vec::new();
    if let Some(preferred) = preferred {
        candidates.push(preferred);
    }
    if !pinned {
        for format in MarshalFormat::DISCOVERY_ORDER {
            if !candidates.contains(&format) {
                candidates.push(format);
            }
        }
    }

    for format in candidates {
        let path = user_file_in(root, user_name, format);
        if path.is_file() {
            return Some((format, path));
        }
    }
    None
}

/// Locates a user's configuration file in the store.
pub fn find_user_file(
    user_name: &str,
    preferred: Option<MarshalFormat>,
    pinned: bool,
) -> Option<(MarshalFormat, PathBuf)> {
    find_user_file_in(&store_dir(), user_name, preferred, pinned)
}

/// Reads a configuration file.
pub fn read_user_file(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}

/// Writes a configuration file inside an explicit store root, creating the
/// store directory as needed.
pub fn save_user_file_in(
    root: &Path,
    user_name: &str,
    format: MarshalFormat,
    content: &str,
) -> io::Result<PathBuf> {
    fs::create_dir_all(root)?;
    let path = user_file_in(root, user_name, format);
    fs::write(&path, content)?;
    Ok(path)
}

/// Writes a configuration file into the store.
pub fn save_user_file(user_name: &str, format: MarshalFormat, content: &str) -> io::Result<PathBuf> {
    save_user_file_in(&store_dir(), user_name, format, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests separator sanitization in store file names.
    #[test]
    fn test_sanitize_user_name_in_path() {
        let path = user_file_in(Path::new("/tmp/store"), "a/b", MarshalFormat::Flat);
        assert_eq!(path, PathBuf::from("/tmp/store/a_b.mpsites"));

        let path = user_file_in(Path::new("/tmp/store"), "Robert Lee Mitchell", MarshalFormat::Json);
        assert_eq!(path, PathBuf::from("/tmp/store/Robert Lee Mitchell.mpjson"));
    }

    /// Tests discovery: preferred shape wins, fall-back finds the other
    /// shape, pinning disables fall-back.
    #[test]
    fn test_find_user_file_discovery() {
        let store = tempfile::tempdir().unwrap();
        let root = store.path();

        assert!(find_user_file_in(root, "Nobody", None, false).is_none());

        save_user_file_in(root, "Tester", MarshalFormat::Flat, "# flat\n").unwrap();
        let (format, path) = find_user_file_in(root, "Tester", Some(MarshalFormat::Json), false).unwrap();
        assert_eq!(format, MarshalFormat::Flat);
        assert!(path.ends_with("Tester.mpsites"));

        // Pinned to JSON, the flat file is invisible.
        assert!(find_user_file_in(root, "Tester", Some(MarshalFormat::Json), true).is_none());

        // Once a JSON file exists, discovery prefers it over flat.
        save_user_file_in(root, "Tester", MarshalFormat::Json, "{}\n").unwrap();
        let (format, _) = find_user_file_in(root, "Tester", None, false).unwrap();
        assert_eq!(format, MarshalFormat::Json);
    }

    /// Tests the save/read round trip and directory creation.
    #[test]
    fn test_save_and_read_user_file() {
        let store = tempfile::tempdir().unwrap();
        let root = store.path().join("nested").join(".savedhi.d");

        let path = save_user_file_in(&root, "Tester", MarshalFormat::Json, "{\"x\": 1}\n").unwrap();
        assert_eq!(read_user_file(&path).unwrap(), "{\"x\": 1}\n");
    }
}
