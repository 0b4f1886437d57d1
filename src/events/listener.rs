use async_trait::async_trait;

use super::SessionEvent;

/// Handles session lifecycle events.
///
/// Listeners are registered per manager with
/// [`SessionManager::listen`](crate::SessionManager::listen) and run in
/// registration order, inline with the operation that fired the event.
///
/// # Example
///
/// ```rust,ignore
/// use telehealth_session::events::{Listener, SessionEvent};
/// use async_trait::async_trait;
///
/// struct AuditListener;
///
/// #[async_trait]
/// impl Listener for AuditListener {
///     async fn handle(&self, event: &SessionEvent) {
///         if let SessionEvent::Created { expires_at, .. } = event {
///             // record the launch
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &SessionEvent);
}
