use chrono::{DateTime, Utc};

use crate::SecretString;

/// Lifecycle events emitted by [`SessionManager`](crate::SessionManager).
///
/// Session ids are bearer credentials, so they are carried redacted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Created {
        session_id: SecretString,
        expires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    Saved {
        session_id: SecretString,
        at: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "session.created",
            Self::Saved { .. } => "session.saved",
        }
    }

    pub fn session_id(&self) -> &SecretString {
        match self {
            Self::Created { session_id, .. } | Self::Saved { session_id, .. } => session_id,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Created { at, .. } | Self::Saved { at, .. } => *at,
        }
    }
}
