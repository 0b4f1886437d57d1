//! JSON codec for stored session records.
//!
//! The record is a JSON object holding the session id, the typed launch
//! fields and the free-form `values` map. Unset fields are omitted. The
//! placeholder written when a session is created is the empty byte sequence.
//! Decoding is strict: a field this crate does not write is an error.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{OAuthToken, Session, SessionData};
use crate::SessionError;

// `Session` flattens its data, and serde ignores unknown fields under
// flatten, so records are read through this mirror instead.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StoredRecord {
    id: String,
    #[serde(default)]
    fhir_url: Option<String>,
    #[serde(default)]
    launch_id: Option<String>,
    #[serde(default)]
    fhir_token: Option<OAuthToken>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    values: Map<String, Value>,
}

impl From<StoredRecord> for Session {
    fn from(record: StoredRecord) -> Self {
        Session {
            id: record.id,
            data: SessionData {
                fhir_url: record.fhir_url,
                launch_id: record.launch_id,
                fhir_token: record.fhir_token,
                expires_at: record.expires_at,
                values: record.values,
            },
        }
    }
}

/// Serializes a session to its stored form.
///
/// # Errors
///
/// Returns `SessionError::MalformedPayload` if serialization fails.
pub fn encode(session: &Session) -> Result<Vec<u8>, SessionError> {
    serde_json::to_vec(session).map_err(|e| SessionError::MalformedPayload(e.to_string()))
}

/// Deserializes the stored value for `id`.
///
/// Empty input is a session with no payload yet.
///
/// # Errors
///
/// Returns `SessionError::MalformedPayload` if the bytes are not a valid
/// session record, carry unknown fields, or belong to a different id.
pub fn decode(id: &str, bytes: &[u8]) -> Result<Session, SessionError> {
    if bytes.is_empty() {
        return Ok(Session::new(id));
    }

    let session: Session = serde_json::from_slice::<StoredRecord>(bytes)
        .map_err(|e| SessionError::MalformedPayload(e.to_string()))?
        .into();

    if session.id != id {
        return Err(SessionError::MalformedPayload(format!(
            "record id {:?} does not match key",
            session.id
        )));
    }

    Ok(session)
}
