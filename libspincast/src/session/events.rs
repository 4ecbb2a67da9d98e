//! Session lifecycle events
//!
//! The platform layer reports token issuance through [`SessionSink`] rather
//! than writing storage itself. The production sink persists to the session
//! cache; tests substitute a recording sink.

use std::sync::Arc;

use crate::session::cache::SessionCache;
use crate::types::SessionToken;

/// Notification from the identity provider that the session changed.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A fresh session was established from credentials.
    Created(SessionToken),
    /// An existing session was renewed from its refresh artifact.
    Refreshed(SessionToken),
    /// Any other provider signal; carries nothing the relay must keep.
    Other,
}

/// Observer for session lifecycle events.
///
/// Implementations run synchronously inside the login/resume call, so a
/// `Created` or `Refreshed` token is durable before the caller proceeds.
pub trait SessionSink: Send + Sync {
    fn session_changed(&self, event: &SessionEvent);
}

/// Sink that persists every issued token to the session cache.
pub struct CacheSink {
    cache: Arc<dyn SessionCache>,
}

impl CacheSink {
    pub fn new(cache: Arc<dyn SessionCache>) -> Self {
        Self { cache }
    }
}

impl SessionSink for CacheSink {
    fn session_changed(&self, event: &SessionEvent) {
        let token = match event {
            SessionEvent::Created(token) => {
                tracing::info!("session created, saving token");
                token
            }
            SessionEvent::Refreshed(token) => {
                tracing::info!("session refreshed, saving token");
                token
            }
            SessionEvent::Other => return,
        };

        // The session itself is still valid for this request even if the
        // write fails; the next request simply pays for a fresh login.
        if let Err(e) = self.cache.save(token) {
            tracing::warn!(error = %e, "failed to persist session token");
        }
    }
}
