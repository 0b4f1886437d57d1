//! Store capability consumed by the session manager.

use async_trait::async_trait;

use crate::SessionError;

/// Key-value storage for session records.
///
/// Implementations decide durability, eviction and concurrency. The manager
/// performs no locking around `get` followed by `put`.
///
/// - [`MemoryStore`](super::MemoryStore): In-memory storage for testing and single-process use
#[async_trait]
pub trait Store: Send + Sync {
    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// Must accept an empty value.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), SessionError>;

    /// Returns the value for `key`, or `None` if the key does not exist.
    ///
    /// A stored empty value is returned as `Some(vec![])`, not `None`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SessionError>;
}
