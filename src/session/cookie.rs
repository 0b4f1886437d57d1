//! Session cookie helpers.
//!
//! Builds the cookie issued by `new_session`, reads it back from request
//! representations, and optionally signs the session id with HMAC-SHA256.

use chrono::{DateTime, Utc};
use cookie::{Cookie, CookieJar};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::OffsetDateTime;

use crate::{SecretString, SessionConfig, SessionError};

type HmacSha256 = Hmac<Sha256>;

/// Anything a session cookie can be read from.
///
/// Returns `None` when no cookie with `name` is present. A present cookie
/// with an empty value is returned as `Some("")`.
pub trait CookieSource {
    fn cookie_value(&self, name: &str) -> Option<String>;
}

impl CookieSource for http::HeaderMap {
    fn cookie_value(&self, name: &str) -> Option<String> {
        self.get_all(http::header::COOKIE)
            .iter()
            .filter_map(|header| header.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value_trimmed().to_owned())
    }
}

impl<B> CookieSource for http::Request<B> {
    fn cookie_value(&self, name: &str) -> Option<String> {
        self.headers().cookie_value(name)
    }
}

impl CookieSource for Cookie<'_> {
    fn cookie_value(&self, name: &str) -> Option<String> {
        (self.name() == name).then(|| self.value_trimmed().to_owned())
    }
}

impl CookieSource for CookieJar {
    fn cookie_value(&self, name: &str) -> Option<String> {
        self.get(name).map(|cookie| cookie.value_trimmed().to_owned())
    }
}

/// Converts a session expiry into the cookie's `Expires` timestamp.
pub(crate) fn cookie_expiry(expires_at: DateTime<Utc>) -> Result<OffsetDateTime, SessionError> {
    OffsetDateTime::from_unix_timestamp(expires_at.timestamp())
        .map_err(|e| SessionError::Configuration(format!("cookie expiry out of range: {e}")))
}

/// Builds the session cookie carrying `value`, expiring at `expires`.
pub(crate) fn build_cookie(
    config: &SessionConfig,
    value: String,
    expires: OffsetDateTime,
) -> Cookie<'static> {
    let options = &config.cookie;
    let mut builder = Cookie::build((config.cookie_name.clone(), value)).expires(expires);

    if let Some(ref path) = options.path {
        builder = builder.path(path.clone());
    }
    if let Some(ref domain) = options.domain {
        builder = builder.domain(domain.clone());
    }
    if options.secure {
        builder = builder.secure(true);
    }
    if options.http_only {
        builder = builder.http_only(true);
    }
    if let Some(same_site) = options.same_site {
        builder = builder.same_site(same_site.into());
    }

    builder.build()
}

/// Signs a session ID with HMAC-SHA256.
///
/// Returns a string in the format `{session_id}.{hex signature}`.
pub fn sign_session_id(session_id: &str, secret: &SecretString) -> String {
    let mac = keyed_mac(secret, session_id);
    format!("{}.{}", session_id, hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a signed cookie value and extracts the session ID.
///
/// Returns `None` if the value is not in signed form or the signature does
/// not match.
pub fn verify_signed_cookie(cookie_value: &str, secret: &SecretString) -> Option<String> {
    let (session_id, signature_hex) = cookie_value.rsplit_once('.')?;
    let signature = hex::decode(signature_hex).ok()?;

    // verify_slice compares in constant time
    match keyed_mac(secret, session_id).verify_slice(&signature) {
        Ok(()) => Some(session_id.to_owned()),
        Err(_) => {
            log::debug!(target: "telehealth_session::cookie", "msg=\"session cookie signature mismatch\"");
            None
        }
    }
}

fn keyed_mac(secret: &SecretString, message: &str) -> HmacSha256 {
    // HMAC accepts keys of any length, so construction cannot fail.
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts keys of any size");
    mac.update(message.as_bytes());
    mac
}
