mod codec;
mod cookie;
mod id;
mod manager;
mod memory_store;
mod store;

use chrono::{DateTime, Duration, Utc};
pub use codec::{decode, encode};
pub use self::cookie::{sign_session_id, verify_signed_cookie, CookieSource};
pub use id::{generate_token, IdGenerator, RandomIdGenerator, DEFAULT_ID_LENGTH};
pub use manager::{NewSession, SessionManager};
pub use memory_store::MemoryStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
pub use store::Store;

use crate::{SecretString, SessionError};

/// Tokens within this window of their expiry are treated as expired.
const TOKEN_EXPIRY_DELTA_SECS: i64 = 10;

/// OAuth token obtained from the FHIR authorization server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OAuthToken {
    pub access_token: SecretString,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<SecretString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl OAuthToken {
    pub fn new(access_token: impl Into<SecretString>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: String::new(),
            refresh_token: None,
            expiry: None,
        }
    }

    /// Returns the token type for an `Authorization` header.
    ///
    /// Defaults to `Bearer` and normalizes the casing of the common types.
    pub fn token_type(&self) -> &str {
        if self.token_type.eq_ignore_ascii_case("bearer") || self.token_type.is_empty() {
            "Bearer"
        } else if self.token_type.eq_ignore_ascii_case("mac") {
            "MAC"
        } else if self.token_type.eq_ignore_ascii_case("basic") {
            "Basic"
        } else {
            &self.token_type
        }
    }

    /// A token without an expiry never expires.
    pub fn is_expired(&self) -> bool {
        self.expiry.is_some_and(|expiry| {
            expiry - Duration::seconds(TOKEN_EXPIRY_DELTA_SECS) < Utc::now()
        })
    }

    /// True when the token has an access token and is not expired.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }
}

/// Session payload: typed launch fields plus a free-form value map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Base URL of the FHIR server this session was launched against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fhir_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fhir_token: Option<OAuthToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Application data set after creation.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub values: Map<String, Value>,
}

impl SessionData {
    /// True when no payload field is set, as for a freshly created session.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A session as held in the store. Records are read back through
/// [`decode`], never through a `Deserialize` impl.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: String,
    #[serde(flatten)]
    pub data: SessionData,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: SessionData::default(),
        }
    }

    /// Sessions without a recorded expiry never expire server-side.
    pub fn is_expired(&self) -> bool {
        self.data
            .expires_at
            .is_some_and(|expires_at| Utc::now() > expires_at)
    }

    /// Reads an application value.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::MalformedPayload` if the stored value does not
    /// deserialize into `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        self.data
            .values
            .get(key)
            .map(|value| {
                serde_json::from_value(value.clone())
                    .map_err(|e| SessionError::MalformedPayload(format!("value {key:?}: {e}")))
            })
            .transpose()
    }

    /// Sets an application value. Takes effect in the store on the next `save`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::MalformedPayload` if `value` cannot be
    /// represented as JSON.
    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)
            .map_err(|e| SessionError::MalformedPayload(e.to_string()))?;
        self.data.values.insert(key.into(), value);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.values.remove(key)
    }
}
