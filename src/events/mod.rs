//! Session lifecycle events.
//!
//! The manager fires a [`SessionEvent`] after each successful create and
//! save. With no listeners registered nothing happens.
//!
//! ```rust,ignore
//! use telehealth_session::events::listeners::LoggingListener;
//! use telehealth_session::{MemoryStore, SessionConfig, SessionManager};
//!
//! let manager = SessionManager::new(MemoryStore::new(), SessionConfig::default())?
//!     .listen(LoggingListener::new());
//! ```

mod event;
mod listener;

pub mod listeners;

pub use event::SessionEvent;
pub use listener::Listener;
