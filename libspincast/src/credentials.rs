//! Account credential loading
//!
//! Credentials live in a small JSON file owned by the operator. The relay
//! only ever reads it; nothing in this codebase writes, logs, or echoes the
//! secret back out. The secret is wrapped in [`secrecy::SecretString`] so
//! accidental Debug output stays redacted.

use std::io::ErrorKind;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::AuthError;

/// Long-lived account credentials for the fallback password login.
#[derive(Debug)]
pub struct Credentials {
    pub account_identifier: String,
    secret: SecretString,
}

impl Credentials {
    pub fn new(account_identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            account_identifier: account_identifier.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// Expose the secret for the login call. Call sites should pass the
    /// value straight into the transport and not hold on to it.
    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

#[derive(Deserialize)]
struct RawCredentials {
    account_identifier: String,
    secret: String,
}

/// Reads the credentials file on demand.
///
/// The file is re-read per cold login rather than held in memory for the
/// process lifetime, so an operator can rotate the password without a
/// restart.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the credentials file.
    ///
    /// An absent file is `Ok(None)`; the session manager turns that into
    /// `AuthError::MissingCredentials`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::LoginFailed` when the file exists but cannot be
    /// read or parsed. The error carries the parse detail, never the secret.
    pub fn load(&self) -> Result<Option<Credentials>, AuthError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuthError::LoginFailed(format!(
                    "credentials file unreadable: {}",
                    e
                )))
            }
        };

        let raw: RawCredentials = serde_json::from_str(&content)
            .map_err(|e| AuthError::LoginFailed(format!("credentials file malformed: {}", e)))?;

        Ok(Some(Credentials::new(raw.account_identifier, raw.secret)))
    }
}
