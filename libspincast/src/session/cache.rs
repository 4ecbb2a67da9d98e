//! Durable session token cache
//!
//! The cache holds exactly one opaque token blob. Every renewal event
//! overwrites it wholesale; an absent file means "no cached session".

use std::io::ErrorKind;
use std::path::PathBuf;

use crate::types::SessionToken;

/// Storage for the current session token.
pub trait SessionCache: Send + Sync {
    /// Read the cached token, or `None` when no session has been saved yet.
    fn load(&self) -> std::io::Result<Option<SessionToken>>;

    /// Replace the cached token.
    fn save(&self, token: &SessionToken) -> std::io::Result<()>;
}

/// File-backed cache: one text file containing the exported token.
pub struct FileSessionCache {
    path: PathBuf,
}

impl FileSessionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionCache for FileSessionCache {
    fn load(&self) -> std::io::Result<Option<SessionToken>> {
        match std::fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(SessionToken::new(blob))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, token: &SessionToken) -> std::io::Result<()> {
        // Write-then-rename so a concurrent load never sees a partial blob.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, token.as_str())?;
        std::fs::rename(&tmp, &self.path)
    }
}
