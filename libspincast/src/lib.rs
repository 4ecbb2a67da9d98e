//! Spincast - relay now-playing notifications to Bluesky
//!
//! Core library for the relay: credential and session handling with
//! renewal-event persistence, inbound access control, and the publish
//! workflow. The HTTP surface lives in the `spin-relay` binary.

pub mod config;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod logging;
pub mod platform;
pub mod service;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use credentials::{CredentialStore, Credentials};
pub use error::{AccessError, AuthError, PublishError, Result, SpincastError};
pub use guard::AccessGuard;
pub use service::PublishService;
pub use session::SessionManager;
pub use types::{Notification, PostRef, SessionToken};
