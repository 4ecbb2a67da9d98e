//! Bluesky platform implementation
//!
//! Talks to a PDS over three XRPC endpoints: `createSession` for password
//! login, `refreshSession` for token renewal, and `createRecord` for the
//! post itself. The exported token blob is JSON carrying both JWTs, the
//! account DID, and a local expiry estimate; everything outside this module
//! treats it as opaque.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::BlueskyConfig;
use crate::credentials::Credentials;
use crate::error::{AuthError, ConfigError, PublishError, Result};
use crate::platform::{Platform, PlatformSession};
use crate::session::events::{SessionEvent, SessionSink};
use crate::types::{PostRef, SessionToken};

const CREATE_SESSION: &str = "/xrpc/com.atproto.server.createSession";
const REFRESH_SESSION: &str = "/xrpc/com.atproto.server.refreshSession";
const CREATE_RECORD: &str = "/xrpc/com.atproto.repo.createRecord";

const POST_COLLECTION: &str = "app.bsky.feed.post";

// The PDS does not report an access-token lifetime on this surface; it
// rotates them on roughly an hourly cadence, so renew after an hour.
const ASSUMED_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Contents of the exported session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionData {
    access_jwt: String,
    refresh_jwt: String,
    did: String,
    /// Unix timestamp past which the access token is treated as stale.
    expiry: i64,
}

impl SessionData {
    fn from_token(token: &SessionToken) -> std::result::Result<Self, AuthError> {
        serde_json::from_str(token.as_str())
            .map_err(|e| AuthError::SessionInvalid(format!("cached token unparseable: {}", e)))
    }

    fn to_token(&self) -> SessionToken {
        // Serializing a struct of plain strings cannot fail.
        SessionToken::new(serde_json::to_string(self).expect("session data serializes"))
    }

    fn is_expired(&self, now: i64) -> bool {
        now >= self.expiry
    }
}

/// What the PDS returns from createSession and refreshSession.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    access_jwt: String,
    refresh_jwt: String,
    did: String,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    uri: String,
    cid: String,
}

#[derive(Debug, Deserialize)]
struct XrpcErrorBody {
    error: Option<String>,
    message: Option<String>,
}

pub struct BlueskyPlatform {
    http: reqwest::Client,
    service_url: String,
}

impl BlueskyPlatform {
    /// Create a platform client against the configured PDS.
    pub fn new(config: &BlueskyConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            service_url: config.service_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.service_url, path)
    }

    fn session(&self, data: SessionData) -> Box<dyn PlatformSession> {
        Box::new(BlueskySession {
            http: self.http.clone(),
            service_url: self.service_url.clone(),
            data,
        })
    }
}

/// Read a session payload, folding non-2xx statuses into an error string.
async fn read_session_response(
    response: reqwest::Response,
    context: &str,
) -> std::result::Result<SessionResponse, String> {
    let status = response.status();
    if !status.is_success() {
        return Err(format!(
            "{} returned {}: {}",
            context,
            status,
            error_detail(response).await
        ));
    }
    response
        .json::<SessionResponse>()
        .await
        .map_err(|e| format!("{} returned a malformed body: {}", context, e))
}

async fn error_detail(response: reqwest::Response) -> String {
    response
        .json::<XrpcErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message.or(body.error))
        .unwrap_or_else(|| "no detail".to_string())
}

#[async_trait]
impl Platform for BlueskyPlatform {
    async fn resume(
        &self,
        token: &SessionToken,
        events: &dyn SessionSink,
    ) -> std::result::Result<Box<dyn PlatformSession>, AuthError> {
        let data = SessionData::from_token(token)?;
        let now = chrono::Utc::now().timestamp();

        if !data.is_expired(now) {
            tracing::debug!("reusing cached access token");
            return Ok(self.session(data));
        }

        tracing::debug!("cached access token is stale, refreshing");
        let response = self
            .http
            .post(self.endpoint(REFRESH_SESSION))
            .bearer_auth(&data.refresh_jwt)
            .send()
            .await
            .map_err(|e| {
                AuthError::SessionInvalid(format!("refreshSession transport error: {}", e))
            })?;

        let renewed = read_session_response(response, "refreshSession")
            .await
            .map_err(AuthError::SessionInvalid)?;

        let data = SessionData {
            access_jwt: renewed.access_jwt,
            refresh_jwt: renewed.refresh_jwt,
            did: renewed.did,
            expiry: now + ASSUMED_TOKEN_LIFETIME_SECS,
        };
        events.session_changed(&SessionEvent::Refreshed(data.to_token()));

        Ok(self.session(data))
    }

    async fn login(
        &self,
        credentials: &Credentials,
        events: &dyn SessionSink,
    ) -> std::result::Result<Box<dyn PlatformSession>, AuthError> {
        tracing::debug!(
            identifier = %credentials.account_identifier,
            "creating session"
        );

        let response = self
            .http
            .post(self.endpoint(CREATE_SESSION))
            .json(&serde_json::json!({
                "identifier": credentials.account_identifier,
                "password": credentials.secret(),
            }))
            .send()
            .await
            .map_err(|e| AuthError::LoginFailed(format!("createSession transport error: {}", e)))?;

        let created = read_session_response(response, "createSession")
            .await
            .map_err(AuthError::LoginFailed)?;

        let data = SessionData {
            access_jwt: created.access_jwt,
            refresh_jwt: created.refresh_jwt,
            did: created.did,
            expiry: chrono::Utc::now().timestamp() + ASSUMED_TOKEN_LIFETIME_SECS,
        };
        events.session_changed(&SessionEvent::Created(data.to_token()));

        Ok(self.session(data))
    }
}

struct BlueskySession {
    http: reqwest::Client,
    service_url: String,
    data: SessionData,
}

#[async_trait]
impl PlatformSession for BlueskySession {
    async fn post(&self, text: &str) -> std::result::Result<PostRef, PublishError> {
        tracing::debug!(chars = text.chars().count(), "submitting post record");

        let response = self
            .http
            .post(format!("{}{}", self.service_url, CREATE_RECORD))
            .bearer_auth(&self.data.access_jwt)
            .json(&serde_json::json!({
                "repo": self.data.did,
                "collection": POST_COLLECTION,
                "record": {
                    "text": text,
                    "createdAt": chrono::Utc::now().to_rfc3339(),
                },
            }))
            .send()
            .await
            .map_err(|e| PublishError::RemoteFailed(format!("createRecord transport error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::RemoteFailed(format!(
                "createRecord returned {}: {}",
                status,
                error_detail(response).await
            )));
        }

        let record: RecordResponse = response.json().await.map_err(|e| {
            PublishError::RemoteFailed(format!("createRecord returned a malformed body: {}", e))
        })?;

        Ok(PostRef {
            uri: record.uri,
            cid: record.cid,
        })
    }
}
