use async_trait::async_trait;

use crate::events::{Listener, SessionEvent};

/// Logs session events through the `log` crate.
///
/// Session ids are not logged.
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    /// Logs at INFO level.
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Created { expires_at, .. } => log::log!(
                target: "telehealth_session::events",
                self.level,
                "event={} expires_at={}",
                event.name(),
                expires_at.to_rfc3339()
            ),
            SessionEvent::Saved { .. } => log::log!(
                target: "telehealth_session::events",
                self.level,
                "event={}",
                event.name()
            ),
        }
    }
}
