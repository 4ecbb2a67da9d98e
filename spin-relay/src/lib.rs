//! HTTP surface of the relay
//!
//! Assembles the axum router: the `/submit` form endpoint, the access
//! guard running as middleware in front of it, and the mapping from
//! workflow errors to response statuses. Response bodies stay generic;
//! failure detail goes to the log, never back to the caller.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Form, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use libspincast::platform::bluesky::BlueskyPlatform;
use libspincast::platform::Platform;
use libspincast::session::cache::{FileSessionCache, SessionCache};
use libspincast::{
    AccessError, AccessGuard, Config, CredentialStore, Notification, PublishError, PublishService,
    SessionManager,
};

#[derive(Clone)]
pub struct AppState {
    guard: Arc<AccessGuard>,
    publisher: PublishService,
}

/// Build the production router against the configured PDS.
pub fn router(config: &Config) -> libspincast::Result<Router> {
    let platform = Arc::new(BlueskyPlatform::new(&config.bluesky)?);
    Ok(router_with_platform(config, platform))
}

/// Router assembly with an injectable platform; tests pass a mock here.
pub fn router_with_platform(config: &Config, platform: Arc<dyn Platform>) -> Router {
    let cache: Arc<dyn SessionCache> = Arc::new(FileSessionCache::new(config.session.cache_path()));
    let credentials = CredentialStore::new(config.session.credentials_path());
    let sessions = Arc::new(SessionManager::new(platform, cache, credentials));

    let state = AppState {
        guard: Arc::new(AccessGuard::new(&config.access)),
        publisher: PublishService::new(sessions),
    };

    Router::new()
        .route("/submit", post(handle_submit))
        .layer(middleware::from_fn_with_state(state.clone(), access_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Gate every request before any handler runs.
async fn access_guard(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let addr = client_addr(&request, connect_info.as_ref());

    match state.guard.check_submit(&addr) {
        Ok(()) => next.run(request).await,
        Err(AccessError::Forbidden { .. }) => {
            (StatusCode::FORBIDDEN, "forbidden").into_response()
        }
        Err(AccessError::RateLimited { .. }) => {
            (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response()
        }
    }
}

/// Extract the client address, checking forwarded headers first.
///
/// Order of precedence: `X-Forwarded-For` (first entry), `X-Real-IP`, then
/// the socket peer address. With none of those present the request carries
/// no usable source and the allowlist rejects it.
fn client_addr(request: &Request, connect_info: Option<&ConnectInfo<SocketAddr>>) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            return first.trim().to_string();
        }
    }

    if let Some(real_ip) = request
        .headers()
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
    {
        return real_ip.to_string();
    }

    connect_info
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_default()
}

/// Fields pushed by the automation system's metadata feed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitForm {
    song_name: Option<String>,
    artist_name: Option<String>,
    playlist_title: Option<String>,
    timestamp: Option<String>,
    spin_note: Option<String>,
}

impl From<SubmitForm> for Notification {
    fn from(form: SubmitForm) -> Self {
        Notification {
            song_name: form.song_name.unwrap_or_default(),
            artist_name: form.artist_name.unwrap_or_default(),
            playlist_title: form.playlist_title.unwrap_or_default(),
            timestamp: form.timestamp,
            spin_note: form.spin_note,
        }
    }
}

async fn handle_submit(State(state): State<AppState>, Form(form): Form<SubmitForm>) -> Response {
    let notification = Notification::from(form);

    match state.publisher.publish(&notification).await {
        Ok(post) => (StatusCode::OK, post.uri).into_response(),
        Err(error) => publish_error_response(error),
    }
}

fn publish_error_response(error: PublishError) -> Response {
    let (status, body) = match &error {
        PublishError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "required fields are missing"),
        PublishError::AuthFailed(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to authenticate with the posting service",
        ),
        PublishError::RemoteFailed(_) => (StatusCode::BAD_GATEWAY, "failed to publish the post"),
    };

    tracing::error!(error = %error, "publish request failed");
    (status, body).into_response()
}
