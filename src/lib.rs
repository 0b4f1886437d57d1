//! Cookie-backed server-side sessions for telehealth launches.
//!
//! A [`SessionManager`] issues a `session` cookie carrying a random id,
//! stores the session record under that id in a pluggable [`Store`], and
//! loads or overwrites it on later requests.
//!
//! ```rust,ignore
//! use telehealth_session::{MemoryStore, SessionConfig, SessionManager};
//!
//! let manager = SessionManager::new(MemoryStore::new(), SessionConfig::default())?;
//!
//! let new = manager.new_session().await?;
//! new.append_to(response.headers_mut())?;
//!
//! let mut session = manager.retrieve(&new.cookie).await?;
//! session.data.launch_id = Some("launch-1".to_owned());
//! manager.save(&session).await?;
//! ```

pub mod api;
pub mod config;
pub mod events;
pub mod secret;
pub mod session;

use std::fmt;

pub use config::{CookieOptions, SameSite, SessionConfig};
pub use secret::SecretString;
pub use session::{
    CookieSource, IdGenerator, MemoryStore, NewSession, OAuthToken, RandomIdGenerator, Session,
    SessionData, SessionManager, Store,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No store entry exists for the session id.
    NotFound,
    /// The request carried no session cookie.
    NoCookie,
    /// The session cookie was present but empty, or the generator produced an empty id.
    EmptySessionId,
    InvalidSignature,
    Expired,
    MalformedPayload(String),
    /// Backend failure reported by the store.
    Store(String),
    Configuration(String),
}

impl SessionError {
    /// Stable machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::NotFound => "SESSION_NOT_FOUND",
            SessionError::NoCookie => "NO_SESSION_COOKIE",
            SessionError::EmptySessionId => "EMPTY_SESSION_ID",
            SessionError::InvalidSignature => "INVALID_SESSION_SIGNATURE",
            SessionError::Expired => "SESSION_EXPIRED",
            SessionError::MalformedPayload(_) => "MALFORMED_SESSION_PAYLOAD",
            SessionError::Store(_) => "STORE_ERROR",
            SessionError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Returns true when the client did not present a usable session.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            SessionError::NotFound
                | SessionError::NoCookie
                | SessionError::EmptySessionId
                | SessionError::InvalidSignature
                | SessionError::Expired
        )
    }
}

impl std::error::Error for SessionError {}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotFound => write!(f, "Session not found"),
            SessionError::NoCookie => write!(f, "Session cookie not present"),
            SessionError::EmptySessionId => write!(f, "Session id is empty"),
            SessionError::InvalidSignature => write!(f, "Session cookie signature is invalid"),
            SessionError::Expired => write!(f, "Session has expired"),
            SessionError::MalformedPayload(msg) => write!(f, "Malformed session payload: {}", msg),
            SessionError::Store(msg) => write!(f, "Store error: {}", msg),
            SessionError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}
