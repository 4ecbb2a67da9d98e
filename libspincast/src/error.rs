//! Error types for Spincast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpincastError>;

#[derive(Error, Debug)]
pub enum SpincastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Access error: {0}")]
    Access(#[from] AccessError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Rejections produced by the access guard before any business logic runs.
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Source address not allowed: {addr}")]
    Forbidden { addr: String },

    #[error("Rate limit exceeded ({scope})")]
    RateLimited { scope: &'static str },
}

/// Failures while obtaining an authenticated session.
///
/// Every variant is terminal for the current request; the next request
/// re-attempts acquisition from scratch.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Account credentials are not configured")]
    MissingCredentials,

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Session resume failed: {0}")]
    SessionInvalid(String),
}

/// Failures of the publish workflow, mapped to HTTP statuses by the relay.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(#[from] AuthError),

    #[error("Remote call failed: {0}")]
    RemoteFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_error_formatting() {
        let error = AccessError::Forbidden {
            addr: "203.0.113.9".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Source address not allowed: 203.0.113.9"
        );

        let error = AccessError::RateLimited { scope: "global" };
        assert_eq!(format!("{}", error), "Rate limit exceeded (global)");
    }

    #[test]
    fn test_auth_error_wraps_into_publish_error() {
        let error: PublishError = AuthError::MissingCredentials.into();
        match error {
            PublishError::AuthFailed(AuthError::MissingCredentials) => {}
            other => panic!("unexpected conversion: {:?}", other),
        }
    }

    #[test]
    fn test_publish_error_formatting() {
        let error = PublishError::InvalidInput("missing required field: songName".to_string());
        let message = format!("{}", error);
        assert_eq!(message, "Invalid input: missing required field: songName");

        let error = PublishError::AuthFailed(AuthError::LoginFailed("401".to_string()));
        assert_eq!(
            format!("{}", error),
            "Authentication failed: Login failed: 401"
        );
    }

    #[test]
    fn test_error_conversion_into_crate_error() {
        let error: SpincastError = AccessError::RateLimited { scope: "submit" }.into();
        assert!(matches!(error, SpincastError::Access(_)));

        let error: SpincastError = PublishError::RemoteFailed("boom".to_string()).into();
        assert!(matches!(error, SpincastError::Publish(_)));
    }
}
