//! Platform abstraction for the social network behind the relay
//!
//! The session manager and publish workflow only talk to these traits. The
//! Bluesky implementation does the real wire work; the mock stands in for it
//! in tests.

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::error::{AuthError, PublishError};
use crate::session::events::SessionSink;
use crate::types::{PostRef, SessionToken};

pub mod bluesky;
pub mod mock;

/// Entry point into the external identity provider.
///
/// Both calls receive the [`SessionSink`] up front, so any `Created` or
/// `Refreshed` event is delivered (and persisted) before the call returns.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Resume a session from a cached token, without credentials.
    ///
    /// Implementations may renew the token as part of resumption, in which
    /// case they emit `SessionEvent::Refreshed` through the sink.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionInvalid` when the token is unusable; the
    /// caller is expected to fall back to a credential login.
    async fn resume(
        &self,
        token: &SessionToken,
        events: &dyn SessionSink,
    ) -> Result<Box<dyn PlatformSession>, AuthError>;

    /// Establish a fresh session from account credentials.
    ///
    /// Emits `SessionEvent::Created` through the sink on success.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::LoginFailed` on any transport or credential
    /// failure. Callers must not retry internally.
    async fn login(
        &self,
        credentials: &Credentials,
        events: &dyn SessionSink,
    ) -> Result<Box<dyn PlatformSession>, AuthError>;
}

/// An authenticated handle, valid for the current request.
#[async_trait]
pub trait PlatformSession: Send + Sync {
    /// Publish `text` and return the provider-assigned post reference.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::RemoteFailed` on any transport or provider
    /// error. There is no internal retry and no cancellation once the
    /// submission has started.
    async fn post(&self, text: &str) -> Result<PostRef, PublishError>;
}
