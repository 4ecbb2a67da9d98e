//! Publish workflow
//!
//! One request moves through validate → compose → authenticate → submit,
//! and every failure is terminal for that request: nothing here queues,
//! retries, or runs in the background. The caller gets either the
//! provider's post reference or the error of whichever step failed.

use std::sync::Arc;

use crate::error::PublishError;
use crate::session::SessionManager;
use crate::types::{Notification, PostRef};

#[derive(Clone)]
pub struct PublishService {
    sessions: Arc<SessionManager>,
}

impl PublishService {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }

    /// Publish a notification and return the provider's post reference.
    ///
    /// # Errors
    ///
    /// - `PublishError::InvalidInput` when a required field is empty; no
    ///   external call is made.
    /// - `PublishError::AuthFailed` when no authenticated session could be
    ///   obtained.
    /// - `PublishError::RemoteFailed` when the submission itself fails.
    pub async fn publish(&self, notification: &Notification) -> Result<PostRef, PublishError> {
        notification.validate()?;

        let text = notification.display_text();
        tracing::debug!(chars = text.chars().count(), "composed post text");

        let session = self.sessions.acquire_client().await?;

        let post = session.post(&text).await?;
        tracing::info!(uri = %post.uri, "published notification");
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialStore;
    use crate::error::AuthError;
    use crate::platform::mock::MockPlatform;
    use crate::platform::Platform;
    use crate::session::cache::{FileSessionCache, SessionCache};
    use std::io::Write;
    use tempfile::TempDir;

    fn notification() -> Notification {
        Notification {
            song_name: "Song A".to_string(),
            artist_name: "Artist B".to_string(),
            playlist_title: "Show C".to_string(),
            timestamp: None,
            spin_note: Some("dedication".to_string()),
        }
    }

    fn service_with(platform: MockPlatform) -> (Arc<MockPlatform>, PublishService, TempDir) {
        let dir = TempDir::new().unwrap();

        let creds_path = dir.path().join("credentials.json");
        let mut file = std::fs::File::create(&creds_path).unwrap();
        file.write_all(br#"{"account_identifier": "station.example.com", "secret": "pw"}"#)
            .unwrap();

        let cache: Arc<dyn SessionCache> =
            Arc::new(FileSessionCache::new(dir.path().join("session.txt")));
        let platform = Arc::new(platform);
        let manager = SessionManager::new(
            Arc::clone(&platform) as Arc<dyn Platform>,
            cache,
            CredentialStore::new(&creds_path),
        );

        (platform, PublishService::new(Arc::new(manager)), dir)
    }

    #[tokio::test]
    async fn test_publish_posts_the_composed_text() {
        let (platform, service, _dir) = service_with(MockPlatform::success());

        let post = service.publish(&notification()).await.unwrap();

        assert!(post.uri.starts_with("at://"));
        assert_eq!(
            platform.posted_texts(),
            vec!["Now playing on Show C: \"Song A\" by Artist B - dedication".to_string()]
        );
    }

    #[tokio::test]
    async fn test_invalid_notification_never_reaches_the_platform() {
        let (platform, service, _dir) = service_with(MockPlatform::success());

        let mut n = notification();
        n.song_name = String::new();
        let err = service.publish(&n).await.unwrap_err();

        assert!(matches!(err, PublishError::InvalidInput(_)));
        assert_eq!(platform.login_calls(), 0);
        assert_eq!(platform.resume_calls(), 0);
        assert_eq!(platform.post_calls(), 0);
    }

    #[tokio::test]
    async fn test_auth_failure_maps_to_auth_failed() {
        let (platform, service, _dir) = service_with(MockPlatform::login_failure("nope"));

        let err = service.publish(&notification()).await.unwrap_err();

        assert!(matches!(
            err,
            PublishError::AuthFailed(AuthError::LoginFailed(_))
        ));
        assert_eq!(platform.post_calls(), 0);
    }

    #[tokio::test]
    async fn test_remote_failure_propagates_unretried() {
        let (platform, service, _dir) = service_with(MockPlatform::post_failure("pds down"));

        let err = service.publish(&notification()).await.unwrap_err();

        assert!(matches!(err, PublishError::RemoteFailed(_)));
        assert_eq!(platform.post_calls(), 1);
    }
}
