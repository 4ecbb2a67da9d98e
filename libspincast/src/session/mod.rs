//! Session lifecycle management
//!
//! The [`SessionManager`] owns the decision between resuming a cached
//! session and performing a fresh password login. All acquisition runs
//! under one async lock, so concurrent requests never interleave a cache
//! read with a renewal write.

pub mod cache;
pub mod events;

use std::sync::Arc;

use crate::credentials::CredentialStore;
use crate::error::AuthError;
use crate::platform::{Platform, PlatformSession};
use crate::session::cache::SessionCache;
use crate::session::events::{CacheSink, SessionSink};

pub struct SessionManager {
    platform: Arc<dyn Platform>,
    cache: Arc<dyn SessionCache>,
    credentials: CredentialStore,
    sink: Arc<dyn SessionSink>,
    auth_lock: tokio::sync::Mutex<()>,
}

impl SessionManager {
    /// Create a manager whose renewal events persist to `cache`.
    pub fn new(
        platform: Arc<dyn Platform>,
        cache: Arc<dyn SessionCache>,
        credentials: CredentialStore,
    ) -> Self {
        let sink: Arc<dyn SessionSink> = Arc::new(CacheSink::new(Arc::clone(&cache)));
        Self::with_sink(platform, cache, credentials, sink)
    }

    /// Like [`SessionManager::new`] but with an explicit event sink.
    pub fn with_sink(
        platform: Arc<dyn Platform>,
        cache: Arc<dyn SessionCache>,
        credentials: CredentialStore,
        sink: Arc<dyn SessionSink>,
    ) -> Self {
        Self {
            platform,
            cache,
            credentials,
            sink,
            auth_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Obtain an authenticated session, resumption first.
    ///
    /// A cached token is tried before credentials are touched; any resume
    /// failure falls back to a full login. An unreadable cache degrades to
    /// the login path as well rather than failing the request.
    ///
    /// # Errors
    ///
    /// - `AuthError::MissingCredentials` when a login is needed but the
    ///   credentials file is absent.
    /// - `AuthError::LoginFailed` when the login itself fails. Not retried
    ///   here; the next request starts over.
    pub async fn acquire_client(&self) -> Result<Box<dyn PlatformSession>, AuthError> {
        let _guard = self.auth_lock.lock().await;

        match self.cache.load() {
            Ok(Some(token)) => {
                tracing::debug!("found cached session, attempting resume");
                match self.platform.resume(&token, self.sink.as_ref()).await {
                    Ok(session) => return Ok(session),
                    Err(e) => {
                        tracing::warn!(error = %e, "session resume failed, falling back to login");
                    }
                }
            }
            Ok(None) => tracing::debug!("no cached session"),
            Err(e) => {
                tracing::warn!(error = %e, "session cache unreadable, falling back to login");
            }
        }

        let credentials = self
            .credentials
            .load()?
            .ok_or(AuthError::MissingCredentials)?;

        tracing::info!("creating new session from credentials");
        self.platform.login(&credentials, self.sink.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPlatform;
    use crate::session::cache::FileSessionCache;
    use crate::types::SessionToken;
    use std::io::Write;
    use tempfile::TempDir;

    struct Fixture {
        platform: Arc<MockPlatform>,
        manager: SessionManager,
        cache: Arc<dyn SessionCache>,
        _dir: TempDir,
    }

    /// Build a manager around a mock platform with optional pre-seeded
    /// cache and credential files.
    fn fixture(platform: MockPlatform, cached: Option<&str>, with_creds: bool) -> Fixture {
        let dir = TempDir::new().unwrap();

        let cache_path = dir.path().join("session.txt");
        if let Some(blob) = cached {
            std::fs::write(&cache_path, blob).unwrap();
        }
        let cache: Arc<dyn SessionCache> = Arc::new(FileSessionCache::new(&cache_path));

        let creds_path = dir.path().join("credentials.json");
        if with_creds {
            let mut file = std::fs::File::create(&creds_path).unwrap();
            file.write_all(br#"{"account_identifier": "station.example.com", "secret": "pw"}"#)
                .unwrap();
        }

        let platform = Arc::new(platform);
        let manager = SessionManager::new(
            Arc::clone(&platform) as Arc<dyn Platform>,
            Arc::clone(&cache),
            CredentialStore::new(&creds_path),
        );

        Fixture {
            platform,
            manager,
            cache,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_cold_start_logs_in_and_populates_cache() {
        let f = fixture(MockPlatform::issuing("fresh-token"), None, true);

        f.manager.acquire_client().await.unwrap();

        assert_eq!(f.platform.login_calls(), 1);
        assert_eq!(f.platform.resume_calls(), 0);
        assert_eq!(f.cache.load().unwrap().unwrap().as_str(), "fresh-token");
    }

    #[tokio::test]
    async fn test_cached_session_is_resumed_without_credentials() {
        let f = fixture(MockPlatform::success(), Some("cached-token"), false);

        f.manager.acquire_client().await.unwrap();

        assert_eq!(f.platform.resume_calls(), 1);
        assert_eq!(f.platform.login_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_resume_falls_back_to_login() {
        let f = fixture(
            MockPlatform::resume_failure("token expired"),
            Some("stale-token"),
            true,
        );

        f.manager.acquire_client().await.unwrap();

        assert_eq!(f.platform.resume_calls(), 1);
        assert_eq!(f.platform.login_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_credentials_surfaces_as_such() {
        let f = fixture(MockPlatform::success(), None, false);

        let err = f.manager.acquire_client().await.err().unwrap();
        assert!(matches!(err, AuthError::MissingCredentials));
        assert_eq!(f.platform.login_calls(), 0);
    }

    #[tokio::test]
    async fn test_login_failure_propagates() {
        let f = fixture(MockPlatform::login_failure("401 Unauthorized"), None, true);

        let err = f.manager.acquire_client().await.err().unwrap();
        assert!(matches!(err, AuthError::LoginFailed(_)));
        // Failure must not leave anything behind for the next request to trust.
        assert!(f.cache.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_during_resume_overwrites_cache() {
        let f = fixture(
            MockPlatform::refreshing("renewed-token"),
            Some("stale-token"),
            false,
        );

        f.manager.acquire_client().await.unwrap();

        assert_eq!(f.cache.load().unwrap().unwrap().as_str(), "renewed-token");
    }

    #[tokio::test]
    async fn test_every_request_reacquires_independently() {
        let f = fixture(MockPlatform::login_failure("down"), None, true);

        assert!(f.manager.acquire_client().await.is_err());
        assert!(f.manager.acquire_client().await.is_err());

        // No circuit breaker: each request attempts a fresh login.
        assert_eq!(f.platform.login_calls(), 2);
    }

    #[tokio::test]
    async fn test_seeded_cache_round_trips_exact_bytes_to_resume() {
        let blob = r#"{"accessJwt":"a","refreshJwt":"r","did":"did:plc:x","expiry":1}"#;
        let f = fixture(MockPlatform::success(), Some(blob), false);

        f.manager.acquire_client().await.unwrap();
        assert_eq!(
            f.cache.load().unwrap().unwrap(),
            SessionToken::new(blob)
        );
    }
}
