//! Backend abstraction: the raw string-keyed store underneath [`KvStore`].
//!
//! A backend stores string-serialized JSON under fully namespaced keys
//! and supplies one atomic primitive — [`compare_and_swap`] — on which
//! the store builds its optimistic-concurrency retry loop. The store
//! itself never implements atomicity; it only retries.
//!
//! Backends are swappable without touching caller code: an in-memory
//! map backs tests and single-process deployments, the Redis backend
//! backs production.
//!
//! [`KvStore`]: crate::KvStore
//! [`compare_and_swap`]: KvBackend::compare_and_swap

use crate::KvError;

/// The raw storage operations a [`KvStore`](crate::KvStore) needs.
///
/// All keys are fully namespaced by the caller. Values are opaque
/// strings (serialized JSON); the backend never parses them.
///
/// The backend must be assumed to have independent concurrent writers
/// at all times — other server processes, background jobs — which is
/// why `compare_and_swap` is the only read-modify-write-safe primitive.
pub trait KvBackend: Send + Sync {
    /// Reads a key. A missing key is `Ok(None)`, never an error.
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Unconditionally writes a key.
    async fn set(&self, key: &str, value: &str) -> Result<(), KvError>;

    /// Deletes a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), KvError>;

    /// Returns every `(full key, value)` pair whose key starts with
    /// `prefix`.
    ///
    /// The scan is a best-effort snapshot: it need not be atomic with
    /// respect to concurrent writers, and entries written or deleted
    /// mid-scan may or may not appear.
    async fn scan_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, String)>, KvError>;

    /// Atomically stores `next` under `key` if and only if the key's
    /// current value still equals `expected` (`None` = key absent).
    ///
    /// Returns `true` if the commit happened, `false` if a concurrent
    /// writer touched the key since `expected` was read. On `false`
    /// the caller must restart from a fresh read, not retry the same
    /// commit.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        next: &str,
    ) -> Result<bool, KvError>;
}
