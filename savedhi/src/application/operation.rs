// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # The Credential Operation
//!
//! One CLI invocation is one operation, resolved in a fixed step sequence:
//!
//! 1. identity: user name, personal secret, site name (arguments, file
//!    descriptor, environment, or prompts)
//! 2. the user's configuration file: discovery, parse, authentication
//! 3. site and question selection within the loaded record
//! 4. argument overrides: algorithm, type, counter, parameter, redaction
//! 5. materialization of the purpose's credential onto stdout
//! 6. save of the updated configuration
//!
//! Diagnostics and the identicon banner go to stderr; stdout carries the
//! credential and nothing else.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};
use zeroize::Zeroize;

use savedhi_bootstrap::{terminal, ExitCode, ValidatedCli};
use savedhi_domain::{
    marshal_auth, marshal_read, marshal_write, site_result, site_state, AlgorithmVersion, CachingKeyProvider,
    Identicon, IdenticonColor, KeyCounter, KeyPurpose, MarshalFormat, MarshalledQuestion, MarshalledSite,
    MarshalledUser, ResultType, SavedhiError, UserKeyProvider,
};

use crate::infrastructure::storage;

/// Application failures, partitioned by the exit code they map onto.
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad argument values (exit 64).
    #[error("{0}")]
    Usage(String),
    /// Bad input data: missing identity, secret mismatch, unparseable file
    /// (exit 65).
    #[error("{0}")]
    Data(String),
    /// Crypto or key failure (exit 70).
    #[error("{0}")]
    Software(String),
}

impl AppError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            AppError::Usage(_) => ExitCode::UsageError,
            AppError::Data(_) => ExitCode::DataError,
            AppError::Software(_) => ExitCode::Software,
        }
    }
}

impl From<SavedhiError> for AppError {
    fn from(err: SavedhiError) -> Self {
        if err.is_input_error() {
            AppError::Data(err.to_string())
        } else {
            AppError::Software(err.to_string())
        }
    }
}

/// Runs one credential operation from validated arguments.
pub fn run(args: ValidatedCli) -> Result<(), AppError> {
    Operation::prepare(args)?.run()
}

/// The resolved state of one operation.
pub struct Operation {
    user_secret: String,
    site_name: String,
    file_format: Option<MarshalFormat>,
    format_pinned: bool,
    purpose: KeyPurpose,
    key_context: Option<String>,
    user: MarshalledUser,
    provider: CachingKeyProvider,
    site_index: usize,
    question_index: Option<usize>,

    // The materialization parameters after overrides and fallbacks.
    result_purpose: &'static str,
    result_site: String,
    result_type: ResultType,
    result_state: Option<String>,
    result_param: Option<String>,
    key_counter: KeyCounter,
    algorithm: AlgorithmVersion,

    omit_newline: bool,
    verbosity: i8,
}

impl Operation {
    /// Resolves every operation parameter: identity, file, site, question,
    /// overrides.
    pub fn prepare(args: ValidatedCli) -> Result<Operation, AppError> {
        let user_name = resolve_user_name(&args)?;
        let user_secret = resolve_user_secret(&args)?;
        let site_name = resolve_site_name(&args)?;
        let (file_format, format_pinned) = resolve_file_format(&args)?;
        let purpose = resolve_purpose(&args)?;
        let mut key_context = args.key_context.clone().filter(|c| !c.is_empty());

        let mut provider = CachingKeyProvider::new(user_secret.clone());
        let mut user = load_user(&user_name, file_format, format_pinned, &mut provider, args.allow_secret_update)?;
        user.identicon = Some(Identicon::of(&user_name, &user_secret));

        // Select (or create) the site record.
        let site_index = match user.find_site(&site_name) {
            Some(index) => index,
            None => {
                let site = MarshalledSite::new(&site_name, user.default_type, KeyCounter::INITIAL, user.algorithm)?;
                user.sites.push(site);
                user.sites.len() - 1
            }
        };

        // Select (or create) the question record for recovery purposes.
        let question_index = match purpose {
            KeyPurpose::Recovery => Some(match user.sites[site_index].find_question(key_context.as_deref()) {
                Some(index) => index,
                None => {
                    let question = MarshalledQuestion::new(key_context.clone().unwrap_or_default());
                    user.sites[site_index].questions.push(question);
                    user.sites[site_index].questions.len() - 1
                }
            }),
            _ => None,
        };

        // -a pins the site's algorithm before anything derives from it.
        if let Some(version) = args.algorithm {
            user.sites[site_index].algorithm =
                AlgorithmVersion::try_from(version).map_err(|e| AppError::Usage(e.to_string()))?;
        }

        // The purpose decides where the result type and state come from.
        let site = &user.sites[site_index];
        let (mut result_purpose, mut result_type) = match purpose {
            KeyPurpose::Authentication => ("site password", site.result_type),
            KeyPurpose::Identification => ("site login", site.login_type),
            KeyPurpose::Recovery => (
                "site answer",
                question_index.map(|q| site.questions[q].result_type).unwrap_or(ResultType::TEMPLATE_PHRASE),
            ),
        };
        let mut algorithm = site.algorithm;

        // -t overrides the type, and sticks unless the type is alternate.
        if let Some(name) = &args.result_type {
            result_type = ResultType::from_name(name)
                .ok_or_else(|| AppError::Usage(format!("Invalid type: {}", name)))?;

            if !result_type.is_alternate() {
                match purpose {
                    KeyPurpose::Authentication => user.sites[site_index].result_type = result_type,
                    KeyPurpose::Identification => user.sites[site_index].login_type = result_type,
                    KeyPurpose::Recovery => {
                        if let Some(q) = question_index {
                            user.sites[site_index].questions[q].result_type = result_type;
                        }
                    }
                }
            }
        }

        // State, counter and the site the result keys on, per purpose.
        let site = &user.sites[site_index];
        let mut result_site = site_name.clone();
        let mut result_state = None;
        let mut key_counter = KeyCounter::INITIAL;
        match purpose {
            KeyPurpose::Authentication => {
                result_state = site.result_state.clone();
                key_counter = site.counter;
            }
            KeyPurpose::Identification => {
                if result_type != ResultType::NONE {
                    result_state = site.login_state.clone();
                } else {
                    // No site-level login; fall back to the user-level one.
                    result_purpose = "global login";
                    result_site = user.user_name.clone();
                    result_type = user.login_type;
                    result_state = user.login_state.clone();
                    algorithm = user.algorithm;
                }
            }
            KeyPurpose::Recovery => {
                if let Some(q) = question_index {
                    let question = &site.questions[q];
                    result_state = question.state.clone();
                    key_context = if question.keyword.is_empty() {
                        None
                    } else {
                        Some(question.keyword.clone())
                    };
                }
            }
        }

        // -c overrides the counter; only the authentication counter is
        // persisted.
        if let Some(counter) = args.key_counter {
            if purpose == KeyPurpose::Authentication {
                key_counter = KeyCounter::new(counter);
                user.sites[site_index].counter = key_counter;
            }
        }

        // -R sets the redaction mode for the save.
        if let Some(redacted) = args.file_redacted {
            user.redacted = redacted;
        } else if !user.redacted {
            warn!("User configuration file is not redacted.  Use -R 1 to change this.");
        }

        debug!(
            user = %user.user_name,
            site = %site_name,
            result_type = %result_type,
            counter = %key_counter,
            purpose = %purpose,
            algorithm = %algorithm,
            "operation prepared"
        );

        Ok(Operation {
            user_secret,
            site_name,
            file_format,
            format_pinned,
            purpose,
            key_context,
            user,
            provider,
            site_index,
            question_index,
            result_purpose,
            result_site,
            result_type,
            result_state,
            result_param: args.result_param.clone().filter(|p| !p.is_empty()),
            key_counter,
            algorithm,
            omit_newline: args.omit_newline,
            verbosity: args.verbosity,
        })
    }

    /// Materializes the credential, prints it, and saves the updated
    /// configuration.
    pub fn run(mut self) -> Result<(), AppError> {
        if self.verbosity >= 0 {
            let identicon = self.user.identicon.map(render_identicon).unwrap_or_default();
            eprint!(
                "{}'s {} for {}:\n[ {} ]: ",
                self.user.user_name, self.result_purpose, self.site_name, identicon
            );
        }

        // Authenticate the record: the derived fingerprint must match the
        // stored one, and a fresh record gets stamped.
        let user_key = self
            .provider
            .user_key(self.user.algorithm, &self.user.user_name)
            .map_err(|e| AppError::Software(format!("Couldn't derive user key: {}", e)))?;
        match self.user.key_id {
            None => self.user.key_id = Some(user_key.key_id()),
            Some(stored) if stored != user_key.key_id() => {
                return Err(AppError::Software("user key mismatch.".to_string()));
            }
            Some(_) => {}
        }

        // The key the result derives under follows the site's algorithm.
        let result_key = self
            .provider
            .user_key(self.algorithm, &self.user.user_name)
            .map_err(|e| AppError::Software(format!("Couldn't derive user key: {}", e)))?;

        // A stateful parameter is a new secret to encrypt and persist.
        if self.result_type.is_stateful() {
            if let Some(param) = self.result_param.take() {
                let state = site_state(
                    &result_key,
                    &self.result_site,
                    self.result_type,
                    &param,
                    self.key_counter,
                    self.purpose,
                    self.key_context.as_deref(),
                )
                .map_err(|e| AppError::Software(format!("Couldn't encrypt result: {}", e)))?;

                if self.verbosity >= 1 {
                    eprint!("(state) {} => ", state);
                }

                match self.purpose {
                    KeyPurpose::Authentication => {
                        self.user.sites[self.site_index].result_state = Some(state.clone());
                    }
                    KeyPurpose::Identification => {
                        if self.result_site == self.user.user_name {
                            self.user.login_state = Some(state.clone());
                        } else {
                            self.user.sites[self.site_index].login_state = Some(state.clone());
                        }
                    }
                    KeyPurpose::Recovery => {
                        if let Some(q) = self.question_index {
                            self.user.sites[self.site_index].questions[q].state = Some(state.clone());
                        }
                    }
                }
                self.result_state = Some(state);
            }
        }

        // The parameter defaults to the stored state.
        let param = self.result_param.clone().or_else(|| self.result_state.clone());
        let result = site_result(
            &result_key,
            &self.result_site,
            self.result_type,
            param.as_deref(),
            self.key_counter,
            self.purpose,
            self.key_context.as_deref(),
        )?;

        print!("{}", result);
        if !self.omit_newline {
            println!();
        }

        if self.verbosity >= 0 {
            if let Some(url) = &self.user.sites[self.site_index].url {
                eprintln!("See: {}", url);
            }
        }

        // Usage metadata.
        let now = Utc::now();
        self.user.sites[self.site_index].uses += 1;
        self.user.sites[self.site_index].last_used = now;
        self.user.last_used = now;

        self.save();
        Ok(())
    }

    /// Saves the updated configuration. Persistence failures are warnings:
    /// the credential was already delivered.
    fn save(&mut self) {
        let Some(preferred) = self.file_format else {
            return;
        };
        let format = if self.format_pinned { preferred } else { MarshalFormat::DEFAULT };

        let content = match marshal_write(format, &self.user, Some(&mut self.provider)) {
            Ok(content) => content,
            Err(e) => {
                warn!("Couldn't encode updated configuration file: {}", e);
                return;
            }
        };

        match storage::save_user_file(&self.user.user_name, format, &content) {
            Ok(path) => debug!("Updated: {} ({})", path.display(), format.name()),
            Err(e) => warn!("Couldn't write updated configuration file: {}", e),
        }
    }
}

impl Drop for Operation {
    fn drop(&mut self) {
        self.user_secret.zeroize();
    }
}

fn resolve_user_name(args: &ValidatedCli) -> Result<String, AppError> {
    if let Some(name) = args.user_name.clone().filter(|n| !n.is_empty()) {
        return Ok(name);
    }
    prompt_required("Your full name:").ok_or_else(|| AppError::Data("Missing full name.".to_string()))
}

fn resolve_user_secret(args: &ValidatedCli) -> Result<String, AppError> {
    if let Some(fd) = args.user_secret_fd {
        match terminal::read_fd(fd) {
            Ok(secret) if !secret.is_empty() => return Ok(secret),
            Ok(_) => {}
            Err(e) => warn!("Error reading personal secret from FD {}: {}", fd, e),
        }
    }

    if let Some(secret) = args.user_secret.clone().filter(|s| !s.is_empty()) {
        return Ok(secret);
    }

    loop {
        match terminal::prompt_secret("Your personal secret:") {
            Ok(Some(secret)) if !secret.is_empty() => return Ok(secret),
            Ok(Some(_)) => continue,
            _ => return Err(AppError::Data("Missing personal secret.".to_string())),
        }
    }
}

fn resolve_site_name(args: &ValidatedCli) -> Result<String, AppError> {
    if let Some(site) = args.site_name.clone().filter(|s| !s.is_empty()) {
        return Ok(site);
    }
    prompt_required("Site Domain:").ok_or_else(|| AppError::Data("Missing site name.".to_string()))
}

fn resolve_file_format(args: &ValidatedCli) -> Result<(Option<MarshalFormat>, bool), AppError> {
    let Some(name) = &args.file_format else {
        return Ok((Some(MarshalFormat::DEFAULT), false));
    };
    if matches!(name.to_ascii_lowercase().as_str(), "n" | "none") {
        return Ok((None, args.file_format_fixed));
    }
    let format = MarshalFormat::from_name(name)
        .ok_or_else(|| AppError::Data(format!("Invalid file format: {}", name)))?;
    Ok((Some(format), args.file_format_fixed))
}

fn resolve_purpose(args: &ValidatedCli) -> Result<KeyPurpose, AppError> {
    let Some(name) = &args.purpose else {
        return Ok(KeyPurpose::Authentication);
    };
    KeyPurpose::from_name(name).ok_or_else(|| AppError::Data(format!("Invalid purpose: {}", name)))
}

fn prompt_required(prompt: &str) -> Option<String> {
    loop {
        match terminal::prompt_line(prompt) {
            Ok(Some(line)) if !line.trim().is_empty() => return Some(line.trim().to_string()),
            Ok(Some(_)) => continue,
            _ => return None,
        }
    }
}

/// Loads the user's record from their configuration file, or starts a fresh
/// one when no file exists.
fn load_user(
    user_name: &str,
    file_format: Option<MarshalFormat>,
    format_pinned: bool,
    provider: &mut CachingKeyProvider,
    allow_secret_update: bool,
) -> Result<MarshalledUser, AppError> {
    if file_format.is_none() {
        return Ok(MarshalledUser::new(user_name, AlgorithmVersion::CURRENT)?);
    }

    let Some((_, path)) = storage::find_user_file(user_name, file_format, format_pinned) else {
        return Ok(MarshalledUser::new(user_name, AlgorithmVersion::CURRENT)?);
    };

    let content = match storage::read_user_file(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Error while reading configuration file:\n  {}: {}", path.display(), e);
            return Ok(MarshalledUser::new(user_name, AlgorithmVersion::CURRENT)?);
        }
    };

    let mut file = marshal_read(&content);
    if let Some(error) = &file.error {
        return Err(AppError::Data(format!(
            "Couldn't parse configuration file:\n  {}: {}",
            path.display(),
            error
        )));
    }
    if file.data.is_none() {
        return Ok(MarshalledUser::new(user_name, AlgorithmVersion::CURRENT)?);
    }

    match marshal_auth(&mut file, Some(provider)) {
        Ok(user) => Ok(user),
        Err(SavedhiError::UserSecretMismatch(_)) if allow_secret_update => {
            // The new secret doesn't open this file; confirm the old one,
            // then continue under the new secret.
            eprintln!("Given personal secret does not match configuration.");
            eprintln!("To update the configuration with this new personal secret, first confirm the old personal secret.");
            loop {
                let old_secret = match terminal::prompt_secret("Old personal secret:") {
                    Ok(Some(secret)) if !secret.is_empty() => secret,
                    Ok(Some(_)) => continue,
                    _ => return Err(AppError::Data("Missing old personal secret.".to_string())),
                };
                let mut old_provider = CachingKeyProvider::new(old_secret);
                match marshal_auth(&mut file, Some(&mut old_provider)) {
                    Ok(mut user) => {
                        // The record is re-keyed to the new secret on save.
                        user.key_id = None;
                        return Ok(user);
                    }
                    Err(SavedhiError::UserSecretMismatch(_)) => {
                        eprintln!("Given personal secret does not match configuration.");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Err(SavedhiError::UserSecretMismatch(msg)) => Err(AppError::Data(format!(
            "Incorrect personal secret according to configuration:\n  {}: {}",
            path.display(),
            msg
        ))),
        Err(e) => Err(AppError::Data(format!(
            "Couldn't parse configuration file:\n  {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Renders an identicon with its ANSI color for the stderr banner.
fn render_identicon(identicon: Identicon) -> String {
    let glyphs = format!(
        "{}{}{}{}",
        identicon.left_arm, identicon.body, identicon.right_arm, identicon.accessory
    );
    match identicon.color {
        IdenticonColor::Mono => glyphs,
        color => format!("\x1b[3{}m{}\x1b[0m", color as u8, glyphs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests the error-to-exit-code partition of the CLI contract.
    #[test]
    fn test_app_error_exit_codes() {
        assert_eq!(AppError::Usage("x".into()).exit_code(), ExitCode::UsageError);
        assert_eq!(AppError::Data("x".into()).exit_code(), ExitCode::DataError);
        assert_eq!(AppError::Software("x".into()).exit_code(), ExitCode::Software);
    }

    /// Tests the domain-error mapping: input faults are data errors, crypto
    /// faults are software errors.
    #[test]
    fn test_domain_error_mapping() {
        let data: AppError = SavedhiError::MissingInput("userName".into()).into();
        assert_eq!(data.exit_code(), ExitCode::DataError);

        let data: AppError = SavedhiError::UserSecretMismatch("bad".into()).into();
        assert_eq!(data.exit_code(), ExitCode::DataError);

        let software: AppError = SavedhiError::PrimitiveFailure("scrypt".into()).into();
        assert_eq!(software.exit_code(), ExitCode::Software);
    }

    /// Tests identicon rendering: colored figures wrap in ANSI escapes,
    /// mono figures don't.
    #[test]
    fn test_render_identicon() {
        let colored = Identicon {
            left_arm: "╔",
            body: "█",
            right_arm: "╗",
            accessory: "◈",
            color: IdenticonColor::Blue,
        };
        assert_eq!(render_identicon(colored), "\x1b[34m╔█╗◈\x1b[0m");

        let mono = Identicon {
            color: IdenticonColor::Mono,
            ..colored
        };
        assert_eq!(render_identicon(mono), "╔█╗◈");
    }
}
