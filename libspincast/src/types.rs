//! Core types for Spincast

use std::fmt;

use crate::error::PublishError;

/// Now-playing notification relayed from the upstream automation system.
///
/// Request-scoped and never persisted. `song_name`, `artist_name`, and
/// `playlist_title` must be non-empty before a publish is attempted.
#[derive(Debug, Clone)]
pub struct Notification {
    pub song_name: String,
    pub artist_name: String,
    pub playlist_title: String,
    pub timestamp: Option<String>,
    pub spin_note: Option<String>,
}

impl Notification {
    /// Check the required fields.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidInput` naming the missing fields.
    pub fn validate(&self) -> Result<(), PublishError> {
        let mut missing = Vec::new();
        if self.song_name.is_empty() {
            missing.push("songName");
        }
        if self.artist_name.is_empty() {
            missing.push("artistName");
        }
        if self.playlist_title.is_empty() {
            missing.push("playlistTitle");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PublishError::InvalidInput(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }

    /// Compose the post text shown on the social network.
    ///
    /// The spin note is appended as `" - {note}"` only when present and
    /// non-empty.
    pub fn display_text(&self) -> String {
        let mut text = format!(
            "Now playing on {}: \"{}\" by {}",
            self.playlist_title, self.song_name, self.artist_name
        );
        if let Some(note) = &self.spin_note {
            if !note.is_empty() {
                text.push_str(" - ");
                text.push_str(note);
            }
        }
        text
    }
}

/// Provider-assigned reference for a published post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef {
    /// Unique post identifier (an AT URI).
    pub uri: String,
    /// Content identifier of the post record.
    pub cid: String,
}

/// Opaque, renewable session artifact issued by the identity provider.
///
/// The relay never interprets the blob; it is cached and replayed wholesale.
/// Only the platform layer knows its internal structure.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(blob: impl Into<String>) -> Self {
        Self(blob.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

// The blob embeds bearer tokens, so Debug output stays representational.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({} bytes)", self.0.len())
    }
}
