//! Mock platform implementation for testing
//!
//! Configurable stand-in for the Bluesky platform: scripted failures per
//! operation, call counters, and capture of everything posted. Available
//! outside `cfg(test)` so the relay's integration tests can use it too.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::credentials::Credentials;
use crate::error::{AuthError, PublishError};
use crate::platform::{Platform, PlatformSession};
use crate::session::events::{SessionEvent, SessionSink};
use crate::types::{PostRef, SessionToken};

#[derive(Default)]
struct MockState {
    resume_calls: usize,
    login_calls: usize,
    post_calls: usize,
    posted: Vec<String>,
}

/// Mock platform for testing
pub struct MockPlatform {
    state: Arc<Mutex<MockState>>,
    /// Token emitted with `Created` (login) or `Refreshed` (resume) events.
    issued_token: SessionToken,
    /// Emit a `Refreshed` event on every successful resume.
    refresh_on_resume: bool,
    resume_error: Option<String>,
    login_error: Option<String>,
    post_error: Option<String>,
}

impl MockPlatform {
    /// Platform where every operation succeeds.
    pub fn success() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            issued_token: SessionToken::new("mock-token"),
            refresh_on_resume: false,
            resume_error: None,
            login_error: None,
            post_error: None,
        }
    }

    /// Override the token carried by emitted session events.
    pub fn issuing(token: impl Into<String>) -> Self {
        let mut platform = Self::success();
        platform.issued_token = SessionToken::new(token);
        platform
    }

    /// Every resume fails, forcing the credential fallback.
    pub fn resume_failure(error: &str) -> Self {
        let mut platform = Self::success();
        platform.resume_error = Some(error.to_string());
        platform
    }

    /// Every login fails.
    pub fn login_failure(error: &str) -> Self {
        let mut platform = Self::success();
        platform.login_error = Some(error.to_string());
        platform
    }

    /// Sessions are handed out but every post fails.
    pub fn post_failure(error: &str) -> Self {
        let mut platform = Self::success();
        platform.post_error = Some(error.to_string());
        platform
    }

    /// Successful resumes renew the session and emit `Refreshed`.
    pub fn refreshing(token: impl Into<String>) -> Self {
        let mut platform = Self::issuing(token);
        platform.refresh_on_resume = true;
        platform
    }

    pub fn resume_calls(&self) -> usize {
        self.state.lock().unwrap().resume_calls
    }

    pub fn login_calls(&self) -> usize {
        self.state.lock().unwrap().login_calls
    }

    pub fn post_calls(&self) -> usize {
        self.state.lock().unwrap().post_calls
    }

    /// Everything posted through sessions of this platform, in order.
    pub fn posted_texts(&self) -> Vec<String> {
        self.state.lock().unwrap().posted.clone()
    }

    fn session(&self) -> Box<dyn PlatformSession> {
        Box::new(MockSession {
            state: Arc::clone(&self.state),
            post_error: self.post_error.clone(),
        })
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn resume(
        &self,
        _token: &SessionToken,
        events: &dyn SessionSink,
    ) -> Result<Box<dyn PlatformSession>, AuthError> {
        self.state.lock().unwrap().resume_calls += 1;

        if let Some(error) = &self.resume_error {
            return Err(AuthError::SessionInvalid(error.clone()));
        }

        if self.refresh_on_resume {
            events.session_changed(&SessionEvent::Refreshed(self.issued_token.clone()));
        }

        Ok(self.session())
    }

    async fn login(
        &self,
        _credentials: &Credentials,
        events: &dyn SessionSink,
    ) -> Result<Box<dyn PlatformSession>, AuthError> {
        self.state.lock().unwrap().login_calls += 1;

        if let Some(error) = &self.login_error {
            return Err(AuthError::LoginFailed(error.clone()));
        }

        events.session_changed(&SessionEvent::Created(self.issued_token.clone()));
        Ok(self.session())
    }
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
    post_error: Option<String>,
}

#[async_trait]
impl PlatformSession for MockSession {
    async fn post(&self, text: &str) -> Result<PostRef, PublishError> {
        let mut state = self.state.lock().unwrap();
        state.post_calls += 1;

        if let Some(error) = &self.post_error {
            return Err(PublishError::RemoteFailed(error.clone()));
        }

        state.posted.push(text.to_string());
        let n = state.post_calls;
        Ok(PostRef {
            uri: format!("at://did:plc:mock/app.bsky.feed.post/{}", n),
            cid: format!("bafymock{}", n),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct NullSink;
    impl SessionSink for NullSink {
        fn session_changed(&self, _event: &SessionEvent) {}
    }

    struct CapturingSink {
        events: StdMutex<Vec<SessionEvent>>,
    }

    impl SessionSink for CapturingSink {
        fn session_changed(&self, event: &SessionEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn credentials() -> Credentials {
        Credentials::new("station.example.com", "app-pass")
    }

    #[tokio::test]
    async fn test_successful_login_emits_created() {
        let platform = MockPlatform::issuing("issued");
        let sink = CapturingSink {
            events: StdMutex::new(Vec::new()),
        };

        let session = platform.login(&credentials(), &sink).await.unwrap();
        let post = session.post("hello").await.unwrap();

        assert_eq!(platform.login_calls(), 1);
        assert_eq!(platform.post_calls(), 1);
        assert!(post.uri.starts_with("at://did:plc:mock/"));
        assert_eq!(platform.posted_texts(), vec!["hello".to_string()]);

        let events = sink.events.lock().unwrap();
        assert!(
            matches!(&events[..], [SessionEvent::Created(token)] if token.as_str() == "issued")
        );
    }

    #[tokio::test]
    async fn test_login_failure() {
        let platform = MockPlatform::login_failure("bad password");
        let err = platform.login(&credentials(), &NullSink).await.err().unwrap();
        assert!(matches!(err, AuthError::LoginFailed(msg) if msg == "bad password"));
        assert_eq!(platform.login_calls(), 1);
    }

    #[tokio::test]
    async fn test_resume_failure() {
        let platform = MockPlatform::resume_failure("expired");
        let err = platform
            .resume(&SessionToken::new("old"), &NullSink)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::SessionInvalid(_)));
        assert_eq!(platform.resume_calls(), 1);
    }

    #[tokio::test]
    async fn test_refreshing_resume_emits_refreshed() {
        let platform = MockPlatform::refreshing("renewed");
        let sink = CapturingSink {
            events: StdMutex::new(Vec::new()),
        };

        platform
            .resume(&SessionToken::new("old"), &sink)
            .await
            .unwrap();

        let events = sink.events.lock().unwrap();
        assert!(
            matches!(&events[..], [SessionEvent::Refreshed(token)] if token.as_str() == "renewed")
        );
    }

    #[tokio::test]
    async fn test_post_failure_still_counts_the_call() {
        let platform = MockPlatform::post_failure("relay down");
        let session = platform.login(&credentials(), &NullSink).await.unwrap();

        let err = session.post("hello").await.unwrap_err();
        assert!(matches!(err, PublishError::RemoteFailed(_)));
        assert_eq!(platform.post_calls(), 1);
        assert!(platform.posted_texts().is_empty());
    }
}
