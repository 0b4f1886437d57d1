//! Session manager configuration.
//!
//! ```rust
//! use telehealth_session::{SecretString, SessionConfig};
//! use chrono::Duration;
//!
//! let config = SessionConfig {
//!     session_duration: Duration::hours(1),
//!     signing_secret: Some(SecretString::new("a-signing-secret-of-at-least-32-bytes")),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use chrono::Duration;

use crate::{SecretString, SessionError};

/// Name of the cookie carrying the session id.
pub const DEFAULT_COOKIE_NAME: &str = "session";

/// Minimum length of a cookie signing secret, in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Longest accepted `session_duration`. Browsers cap cookie lifetimes at
/// 400 days.
pub const MAX_SESSION_DAYS: i64 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    None,
    Lax,
    Strict,
}

impl From<SameSite> for cookie::SameSite {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::None => cookie::SameSite::None,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::Strict => cookie::SameSite::Strict,
        }
    }
}

/// Optional attributes for the session cookie.
///
/// Everything is unset by default, leaving `Secure`, `HttpOnly` and
/// `SameSite` to the surrounding HTTP layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,

    /// Lifetime of a new session, counted from `new_session`.
    ///
    /// Default: 2 hours
    pub session_duration: Duration,

    /// When set, cookie values are signed with HMAC-SHA256.
    ///
    /// Default: `None` (the cookie value is the raw session id)
    pub signing_secret: Option<SecretString>,

    pub cookie: CookieOptions,

    /// Reject saved sessions whose `expires_at` has passed.
    ///
    /// Default: true
    pub enforce_expiry: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_owned(),
            session_duration: Duration::hours(2),
            signing_secret: None,
            cookie: CookieOptions::default(),
            enforce_expiry: true,
        }
    }
}

impl SessionConfig {
    /// Checks the configuration before it is handed to a manager.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Configuration` for an empty cookie name, a
    /// non-positive duration, or a signing secret shorter than 32 bytes.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.cookie_name.is_empty() {
            return Err(SessionError::Configuration(
                "cookie_name must not be empty".to_owned(),
            ));
        }
        if self.session_duration <= Duration::zero() {
            return Err(SessionError::Configuration(
                "session_duration must be positive".to_owned(),
            ));
        }
        if self.session_duration > Duration::days(MAX_SESSION_DAYS) {
            return Err(SessionError::Configuration(format!(
                "session_duration must be at most {MAX_SESSION_DAYS} days"
            )));
        }
        if let Some(secret) = &self.signing_secret {
            if secret.len() < MIN_SECRET_LENGTH {
                return Err(SessionError::Configuration(format!(
                    "signing_secret must be at least {MIN_SECRET_LENGTH} bytes"
                )));
            }
        }
        Ok(())
    }
}
