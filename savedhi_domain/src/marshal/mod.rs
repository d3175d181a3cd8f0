// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Marshal Reader and Writer
//!
//! This module moves user records across the two on-disk wire shapes: the
//! line-based flat format (`.mpsites`, sub-versions 0 and 1) and the JSON
//! format (`.mpjson`, sub-versions 1 and 2). Both shapes funnel through the
//! same [`MarshalledData`] tree:
//!
//! ```text
//! read:   input --(flat|json parser)--> data tree --auth--> MarshalledUser
//! write:  MarshalledUser --(redaction policy)--> data tree --(emitter)--> output
//! ```
//!
//! ## Redaction
//!
//! A *redacted* file carries secrets only as AES ciphertext, and only for
//! result types whose `ExportContent` feature allows it; device-private
//! state never leaves its host record. A *cleartext* file carries every
//! derivable and stored secret in the clear — writing one recomputes every
//! credential, and reading one immediately re-encrypts every received state
//! under the local user key, so the in-memory record never holds a
//! cleartext wire shape.
//!
//! ## Authentication
//!
//! Files carry the fingerprint of the user key they were written under.
//! Reading with a key provider re-derives the key and compares
//! fingerprints; a mismatch surfaces as `UserSecretMismatch` through the
//! [`MarshalledFile`] error channel without discarding the parsed metadata.

mod data;
mod flat;
mod json;
mod user;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::algorithm;
use crate::value_objects::{AlgorithmVersion, Identicon, KeyCounter, KeyId, KeyPurpose, ResultType};
use crate::SavedhiError;

pub use data::{DataValue, MarshalledData};
pub use user::{CachingKeyProvider, MarshalledQuestion, MarshalledSite, MarshalledUser, UserKeyProvider};

/// An on-disk wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarshalFormat {
    /// Line-based ASCII, `.mpsites`.
    Flat,
    /// JSON tree, `.mpjson`.
    Json,
}

impl MarshalFormat {
    /// The format new files are written in unless the caller pins one.
    pub const DEFAULT: MarshalFormat = MarshalFormat::Flat;

    /// Formats in fall-back discovery order: newest first.
    pub const DISCOVERY_ORDER: [MarshalFormat; 2] = [MarshalFormat::Json, MarshalFormat::Flat];

    pub fn name(self) -> &'static str {
        match self {
            MarshalFormat::Flat => "flat",
            MarshalFormat::Json => "json",
        }
    }

    /// The file extension of this shape.
    pub fn extension(self) -> &'static str {
        match self {
            MarshalFormat::Flat => "mpsites",
            MarshalFormat::Json => "mpjson",
        }
    }

    pub fn from_name(name: &str) -> Option<MarshalFormat> {
        match name.to_ascii_lowercase().as_str() {
            "f" | "flat" => Some(MarshalFormat::Flat),
            "j" | "json" => Some(MarshalFormat::Json),
            _ => None,
        }
    }

    /// Detects the shape of an input from its first byte: `#` is flat, `{`
    /// is JSON, anything else is no recognizable shape.
    pub fn detect(input: &str) -> Option<MarshalFormat> {
        match input.as_bytes().first() {
            Some(b'#') => Some(MarshalFormat::Flat),
            Some(b'{') => Some(MarshalFormat::Json),
            _ => None,
        }
    }
}

/// File metadata parseable without the user secret.
#[derive(Debug, Clone, PartialEq)]
pub struct MarshalledInfo {
    pub format: Option<MarshalFormat>,
    pub export_date: Option<DateTime<Utc>>,
    pub redacted: bool,
    pub algorithm: AlgorithmVersion,
    pub avatar: u32,
    pub user_name: Option<String>,
    pub identicon: Option<Identicon>,
    pub key_id: Option<KeyId>,
    pub last_used: Option<DateTime<Utc>>,
}

/// The outcome of reading a user file: parsed metadata, the raw data tree,
/// and the error channel.
///
/// The file is the single channel carrying both parse state and structured
/// failures: a caller holding a file whose `error` is set can still show
/// its `info` to the user.
#[derive(Debug, Default)]
pub struct MarshalledFile {
    pub info: Option<MarshalledInfo>,
    pub data: Option<MarshalledData>,
    pub error: Option<SavedhiError>,
}

impl MarshalledFile {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Parses a user file into its data tree and metadata.
///
/// Failures land in the returned file's error channel; whatever metadata
/// parsed before the failure is retained.
pub fn marshal_read(input: &str) -> MarshalledFile {
    let mut file = MarshalledFile::default();

    let Some(format) = MarshalFormat::detect(input) else {
        // No recognizable shape; an empty file is not an error, it is the
        // absence of data.
        return file;
    };

    let parsed = match format {
        MarshalFormat::Flat => flat::read_flat(input),
        MarshalFormat::Json => json::read_json(input),
    };

    match parsed {
        Ok(tree) => {
            file.info = Some(extract_info(&tree, format));
            file.data = Some(tree);
        }
        Err(error) => file.error = Some(error),
    }
    file
}

/// Rehydrates the user record from a parsed file, authenticating it against
/// the provider's secret when one is supplied.
///
/// Every received state field of a cleartext file is re-encrypted under the
/// local user key, so the returned record never holds cleartext state. The
/// outcome is mirrored into the file's error channel.
pub fn marshal_auth(
    file: &mut MarshalledFile,
    provider: Option<&mut dyn UserKeyProvider>,
) -> Result<MarshalledUser, SavedhiError> {
    let result = match &file.data {
        None => Err(SavedhiError::FormatMissing("no user data in file".to_string())),
        Some(tree) => tree_to_user(tree, provider),
    };
    file.error = result.as_ref().err().cloned();
    result
}

/// Serializes a user record into a wire shape.
///
/// A cleartext export (`user.redacted == false`) requires a provider: every
/// credential is recomputed into its clear form. A redacted export copies
/// state fields verbatim, and only for types that allow export.
pub fn marshal_write(
    format: MarshalFormat,
    user: &MarshalledUser,
    provider: Option<&mut dyn UserKeyProvider>,
) -> Result<String, SavedhiError> {
    let format_version = match format {
        MarshalFormat::Flat => 1,
        MarshalFormat::Json => 2,
    };
    let tree = user_to_tree(format_version, user, provider)?;

    match format {
        MarshalFormat::Flat => flat::write_flat(&tree),
        MarshalFormat::Json => Ok(tree.to_json_string()),
    }
}

/// Extracts the secret-free metadata block from a data tree.
fn extract_info(tree: &MarshalledData, format: MarshalFormat) -> MarshalledInfo {
    MarshalledInfo {
        format: Some(format),
        export_date: tree
            .get_str(&["export", "date"])
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc)),
        redacted: redacted_of(tree),
        algorithm: num_to_u32(tree.get_num(&["user", "algorithm"]), "user.algorithm")
            .ok()
            .flatten()
            .and_then(|v| AlgorithmVersion::try_from(v).ok())
            .unwrap_or(AlgorithmVersion::CURRENT),
        avatar: num_to_u32(tree.get_num(&["user", "avatar"]), "user.avatar")
            .ok()
            .flatten()
            .unwrap_or(0),
        user_name: tree.get_str(&["user", "full_name"]).map(str::to_string),
        identicon: tree.get_str(&["user", "identicon"]).and_then(Identicon::decode),
        key_id: tree.get_str(&["user", "key_id"]).and_then(KeyId::from_hex),
        last_used: tree
            .get_str(&["user", "last_used"])
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc)),
    }
}

/// Redaction flag of a tree; an absent flag means redacted.
fn redacted_of(tree: &MarshalledData) -> bool {
    match tree.find(&["export", "redacted"]) {
        None => true,
        Some(_) => tree.get_bool(&["export", "redacted"]),
    }
}

// ---------------------------------------------------------------------------
// user record -> data tree (write direction)
// ---------------------------------------------------------------------------

fn user_to_tree(
    format_version: u32,
    user: &MarshalledUser,
    mut provider: Option<&mut dyn UserKeyProvider>,
) -> Result<MarshalledData, SavedhiError> {
    let mut tree = MarshalledData::new();

    tree.set_num(format_version as f64, &["export", "format"]);
    tree.set_str(
        &Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        &["export", "date"],
    );
    tree.set_bool(user.redacted, &["export", "redacted"]);

    tree.set_num(user.avatar as f64, &["user", "avatar"]);
    tree.set_str(&user.user_name, &["user", "full_name"]);
    if let Some(identicon) = &user.identicon {
        tree.set_str(&identicon.encode(), &["user", "identicon"]);
    }
    tree.set_num(user.algorithm.as_u32() as f64, &["user", "algorithm"]);

    // A cleartext export derives the user key anyway; use it to stamp (and
    // cross-check) the fingerprint.
    let mut key_id = user.key_id;
    if !user.redacted {
        let provider = provider
            .as_mut()
            .ok_or_else(|| SavedhiError::MissingInput("userKeyProvider (cleartext export)".to_string()))?;
        let user_key = provider.user_key(user.algorithm, &user.user_name)?;
        if let Some(stored) = key_id {
            if stored != user_key.key_id() {
                return Err(SavedhiError::UserSecretMismatch(
                    "user key does not match the record's key ID".to_string(),
                ));
            }
        }
        key_id = Some(user_key.key_id());
    }
    if let Some(key_id) = key_id {
        tree.set_str(&key_id.as_hex(), &["user", "key_id"]);
    }

    tree.set_num(user.default_type.as_u32() as f64, &["user", "default_type"]);
    tree.set_num(user.login_type.as_u32() as f64, &["user", "login_type"]);
    if let Some(login) = export_state(
        user,
        &mut provider,
        user.algorithm,
        &user.user_name,
        user.login_type,
        user.login_state.as_deref(),
        KeyCounter::INITIAL,
        KeyPurpose::Identification,
        None,
    )? {
        tree.set_str(&login, &["user", "login_name"]);
    }
    tree.set_str(&rfc3339(user.last_used), &["user", "last_used"]);

    for site in &user.sites {
        let name = site.site_name.as_str();

        tree.set_num(site.counter.value() as f64, &["sites", name, "counter"]);
        tree.set_num(site.algorithm.as_u32() as f64, &["sites", name, "algorithm"]);
        tree.set_num(site.result_type.as_u32() as f64, &["sites", name, "type"]);

        if let Some(password) = export_state(
            user,
            &mut provider,
            site.algorithm,
            name,
            site.result_type,
            site.result_state.as_deref(),
            site.counter,
            KeyPurpose::Authentication,
            None,
        )? {
            tree.set_str(&password, &["sites", name, "password"]);
        }

        if site.login_type != ResultType::NONE {
            tree.set_num(site.login_type.as_u32() as f64, &["sites", name, "login_type"]);
        }
        if let Some(login) = export_state(
            user,
            &mut provider,
            site.algorithm,
            name,
            site.login_type,
            site.login_state.as_deref(),
            KeyCounter::INITIAL,
            KeyPurpose::Identification,
            None,
        )? {
            tree.set_str(&login, &["sites", name, "login_name"]);
        }

        tree.set_num(site.uses as f64, &["sites", name, "uses"]);
        tree.set_str(&rfc3339(site.last_used), &["sites", name, "last_used"]);

        for question in &site.questions {
            let keyword = question.keyword.as_str();
            tree.set_num(
                question.result_type.as_u32() as f64,
                &["sites", name, "questions", keyword, "type"],
            );
            if let Some(answer) = export_state(
                user,
                &mut provider,
                site.algorithm,
                name,
                question.result_type,
                question.state.as_deref(),
                KeyCounter::INITIAL,
                KeyPurpose::Recovery,
                context_of(keyword),
            )? {
                tree.set_str(&answer, &["sites", name, "questions", keyword, "answer"]);
            }
        }

        if let Some(url) = &site.url {
            tree.set_str(url, &["sites", name, "_ext_savedhi", "url"]);
        }
    }

    Ok(tree)
}

/// Produces the exported form of one state field.
///
/// Redacted: the stored state verbatim, and only when the type allows
/// export. Cleartext: the recomputed credential.
#[allow(clippy::too_many_arguments)]
fn export_state(
    user: &MarshalledUser,
    provider: &mut Option<&mut dyn UserKeyProvider>,
    algorithm: AlgorithmVersion,
    site_name: &str,
    result_type: ResultType,
    state: Option<&str>,
    counter: KeyCounter,
    purpose: KeyPurpose,
    context: Option<&str>,
) -> Result<Option<String>, SavedhiError> {
    let state = state.filter(|s| !s.is_empty());

    if user.redacted {
        if result_type.exports_content() {
            return Ok(state.map(str::to_string));
        }
        return Ok(None);
    }

    if result_type.is_none() {
        return Ok(None);
    }
    if result_type.is_stateful() && state.is_none() {
        // Nothing was ever saved for this slot.
        return Ok(None);
    }

    let provider = provider
        .as_mut()
        .ok_or_else(|| SavedhiError::MissingInput("userKeyProvider (cleartext export)".to_string()))?;
    let user_key = provider.user_key(algorithm, &user.user_name)?;
    let result = algorithm::site_result(&user_key, site_name, result_type, state, counter, purpose, context)?;
    Ok(Some(result))
}

// ---------------------------------------------------------------------------
// data tree -> user record (read direction)
// ---------------------------------------------------------------------------

fn tree_to_user(
    tree: &MarshalledData,
    mut provider: Option<&mut dyn UserKeyProvider>,
) -> Result<MarshalledUser, SavedhiError> {
    let user_name = tree
        .get_str(&["user", "full_name"])
        .ok_or_else(|| SavedhiError::FormatMissing("user.full_name".to_string()))?
        .to_string();

    let algorithm = num_to_algorithm(tree.get_num(&["user", "algorithm"]), "user.algorithm")?
        .unwrap_or(AlgorithmVersion::CURRENT);
    let redacted = redacted_of(tree);

    let stored_key_id = match tree.get_str(&["user", "key_id"]) {
        None => None,
        Some(encoded) => Some(
            KeyId::from_hex(encoded)
                .ok_or_else(|| SavedhiError::FormatIllegal(format!("user.key_id: {:?}", encoded)))?,
        ),
    };

    // Authenticate the record against the provider's secret.
    let mut key_id = stored_key_id;
    if let Some(p) = provider.as_mut() {
        let user_key = p.user_key(algorithm, &user_name)?;
        if let Some(stored) = stored_key_id {
            if stored != user_key.key_id() {
                return Err(SavedhiError::UserSecretMismatch(
                    "derived user key does not match the file's key ID".to_string(),
                ));
            }
        }
        key_id = Some(user_key.key_id());
    } else if !redacted {
        return Err(SavedhiError::MissingInput(
            "userKeyProvider (cleartext import)".to_string(),
        ));
    }

    let mut user = MarshalledUser::new(user_name.clone(), algorithm)?;
    user.redacted = redacted;
    user.key_id = key_id;
    user.avatar = num_to_u32(tree.get_num(&["user", "avatar"]), "user.avatar")?.unwrap_or(0);
    user.identicon = tree.get_str(&["user", "identicon"]).and_then(Identicon::decode);
    user.default_type = num_to_result_type(tree.get_num(&["user", "default_type"]), "user.default_type")?
        .unwrap_or(ResultType::TEMPLATE_LONG);
    user.login_type = num_to_result_type(tree.get_num(&["user", "login_type"]), "user.login_type")?
        .unwrap_or(ResultType::TEMPLATE_NAME);
    user.login_state = import_state(
        redacted,
        &mut provider,
        algorithm,
        &user_name,
        &user_name,
        user.login_type,
        tree.get_str(&["user", "login_name"]),
        KeyCounter::INITIAL,
        KeyPurpose::Identification,
        None,
    )?;
    user.last_used = opt_date(tree.get_str(&["user", "last_used"]), "user.last_used")?.unwrap_or(DateTime::UNIX_EPOCH);

    let empty = MarshalledData::new();
    let sites = tree.find(&["sites"]).unwrap_or(&empty);
    for site_node in sites.children() {
        let Some(site_name) = site_node.obj_key().filter(|n| !n.is_empty()) else {
            continue;
        };

        let counter: KeyCounter = num_to_u32(site_node.get_num(&["counter"]), "site.counter")?
            .unwrap_or(1)
            .into();
        let site_algorithm =
            num_to_algorithm(site_node.get_num(&["algorithm"]), "site.algorithm")?.unwrap_or(algorithm);
        let result_type =
            num_to_result_type(site_node.get_num(&["type"]), "site.type")?.unwrap_or(user.default_type);
        let login_type =
            num_to_result_type(site_node.get_num(&["login_type"]), "site.login_type")?.unwrap_or(ResultType::NONE);

        let mut site = MarshalledSite::new(site_name, result_type, counter, site_algorithm)?;
        site.login_type = login_type;
        site.uses = num_to_u32(site_node.get_num(&["uses"]), "site.uses")?.unwrap_or(0);
        site.last_used =
            opt_date(site_node.get_str(&["last_used"]), "site.last_used")?.unwrap_or(DateTime::UNIX_EPOCH);
        site.url = site_node.get_str(&["_ext_savedhi", "url"]).map(str::to_string);

        site.result_state = import_state(
            redacted,
            &mut provider,
            site_algorithm,
            &user_name,
            site_name,
            result_type,
            site_node.get_str(&["password"]),
            counter,
            KeyPurpose::Authentication,
            None,
        )?;
        site.login_state = import_state(
            redacted,
            &mut provider,
            site_algorithm,
            &user_name,
            site_name,
            login_type,
            site_node.get_str(&["login_name"]),
            KeyCounter::INITIAL,
            KeyPurpose::Identification,
            None,
        )?;

        if let Some(questions) = site_node.find(&["questions"]) {
            for question_node in questions.children() {
                let Some(keyword) = question_node.obj_key() else {
                    continue;
                };
                let mut question = MarshalledQuestion::new(keyword);
                question.result_type = num_to_result_type(question_node.get_num(&["type"]), "question.type")?
                    .unwrap_or(ResultType::TEMPLATE_PHRASE);
                question.state = import_state(
                    redacted,
                    &mut provider,
                    site_algorithm,
                    &user_name,
                    site_name,
                    question.result_type,
                    question_node.get_str(&["answer"]),
                    KeyCounter::INITIAL,
                    KeyPurpose::Recovery,
                    context_of(keyword),
                )?;
                site.questions.push(question);
            }
        }

        user.sites.push(site);
    }

    Ok(user)
}

/// Produces the in-memory form of one received state field.
///
/// Redacted files carry state in its stored form already; cleartext files
/// carry secrets in the clear, which are re-encrypted under the local user
/// key on the spot.
#[allow(clippy::too_many_arguments)]
fn import_state(
    redacted: bool,
    provider: &mut Option<&mut dyn UserKeyProvider>,
    algorithm: AlgorithmVersion,
    user_name: &str,
    site_name: &str,
    result_type: ResultType,
    received: Option<&str>,
    counter: KeyCounter,
    purpose: KeyPurpose,
    context: Option<&str>,
) -> Result<Option<String>, SavedhiError> {
    let Some(received) = received.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if redacted {
        return Ok(Some(received.to_string()));
    }

    let provider = provider
        .as_mut()
        .ok_or_else(|| SavedhiError::MissingInput("userKeyProvider (cleartext import)".to_string()))?;
    let user_key = provider.user_key(algorithm, user_name)?;
    let state = algorithm::site_state(&user_key, site_name, result_type, received, counter, purpose, context)?;
    Ok(Some(state))
}

// ---------------------------------------------------------------------------
// field validation helpers
// ---------------------------------------------------------------------------

fn context_of(keyword: &str) -> Option<&str> {
    if keyword.is_empty() {
        None
    } else {
        Some(keyword)
    }
}

fn rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A tree number as a u32: absent is `None`, anything non-integral or out
/// of range is illegal.
fn num_to_u32(value: f64, field: &str) -> Result<Option<u32>, SavedhiError> {
    if value.is_nan() {
        return Ok(None);
    }
    if value < 0.0 || value > u32::MAX as f64 || value.fract() != 0.0 {
        return Err(SavedhiError::FormatIllegal(format!("{}: {}", field, value)));
    }
    Ok(Some(value as u32))
}

fn num_to_algorithm(value: f64, field: &str) -> Result<Option<AlgorithmVersion>, SavedhiError> {
    match num_to_u32(value, field)? {
        None => Ok(None),
        Some(v) => AlgorithmVersion::try_from(v)
            .map(Some)
            .map_err(|_| SavedhiError::FormatIllegal(format!("{}: {}", field, v))),
    }
}

fn num_to_result_type(value: f64, field: &str) -> Result<Option<ResultType>, SavedhiError> {
    match num_to_u32(value, field)? {
        None => Ok(None),
        Some(v) => ResultType::try_from(v)
            .map(Some)
            .map_err(|_| SavedhiError::FormatIllegal(format!("{}: {:#x}", field, v))),
    }
}

fn opt_date(value: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>, SavedhiError> {
    match value.filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|d| Some(d.with_timezone(&Utc)))
            .map_err(|_| SavedhiError::FormatIllegal(format!("{}: {:?}", field, s))),
    }
}
