//! The namespaced, JSON-valued store applications actually use.

use std::collections::HashMap;

use serde::{Serialize, de::DeserializeOwned};

use crate::{KvBackend, KvError};

/// Maximum attempts for [`KvStore::update`] before reporting
/// [`KvError::ConflictExhausted`].
///
/// Bounded retries keep worst-case latency bounded and make contention
/// visible to the caller instead of silently degrading throughput.
pub const MAX_UPDATE_ATTEMPTS: u32 = 3;

/// Durable key/value storage scoped to a room or an app.
///
/// Every key is transparently prefixed with the store's namespace, so
/// a key written under one `(appId, roomId)` is never visible through
/// another room's store, while app-scoped ("global") entries are
/// visible identically to every room of the same app. Values are
/// anything serde can represent as JSON.
///
/// Entries outlive connections and rooms — this is where state that
/// must survive reconnects belongs, not in player presence.
#[derive(Debug, Clone)]
pub struct KvStore<B: KvBackend> {
    backend: B,
    namespace: String,
}

impl<B: KvBackend> KvStore<B> {
    /// A store scoped to one room: keys live under
    /// `app:<appId>:room:<roomId>:`.
    pub fn room_scoped(backend: B, app_id: &str, room_id: &str) -> Self {
        Self {
            backend,
            namespace: format!("app:{app_id}:room:{room_id}:"),
        }
    }

    /// A store scoped to a whole app: keys live under
    /// `app:<appId>:global:` and are shared by all of the app's rooms.
    pub fn app_scoped(backend: B, app_id: &str) -> Self {
        Self {
            backend,
            namespace: format!("app:{app_id}:global:"),
        }
    }

    /// The namespace prefix applied to every key.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{key}", self.namespace)
    }

    /// Reads a key. A missing key is `Ok(None)`, never an error.
    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, KvError> {
        match self.backend.get(&self.namespaced(key)).await? {
            Some(raw) => {
                let value =
                    serde_json::from_str(&raw).map_err(KvError::Decode)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Unconditionally overwrites a key.
    ///
    /// Serialization failures are rejected before any network call.
    /// Concurrent `set`s on the same key from different processes are
    /// last-writer-wins with no ordering guarantee — use [`update`]
    /// when the new value depends on the old one.
    ///
    /// [`update`]: Self::update
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), KvError> {
        let encoded = serde_json::to_string(value).map_err(KvError::Encode)?;
        self.backend.set(&self.namespaced(key), &encoded).await
    }

    /// Deletes a key. Deleting an absent key is not an error.
    pub async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.backend.delete(&self.namespaced(key)).await
    }

    /// Lists every entry under `prefix`, keyed by the portion of the
    /// key after the namespace — so the caller's prefix stays part of
    /// the returned keys. `list("score:")` might return
    /// `{ "score:u1": 10, "score:u2": 3 }`.
    ///
    /// The result is a best-effort snapshot, not a point-in-time view:
    /// the backend's scan is not atomic across concurrent writers.
    pub async fn list<T: DeserializeOwned>(
        &self,
        prefix: &str,
    ) -> Result<HashMap<String, T>, KvError> {
        let pairs = self
            .backend
            .scan_prefix(&self.namespaced(prefix))
            .await?;

        let mut entries = HashMap::with_capacity(pairs.len());
        for (full_key, raw) in pairs {
            let suffix = full_key[self.namespace.len()..].to_string();
            let value = serde_json::from_str(&raw).map_err(KvError::Decode)?;
            entries.insert(suffix, value);
        }
        Ok(entries)
    }

    /// Atomically applies `f` to the current value (or `None` if the
    /// key is absent) and persists the result, such that no concurrent
    /// writer's update is silently lost.
    ///
    /// Optimistic concurrency: snapshot the key, compute, then commit
    /// conditionally on "no writer touched the key since the
    /// snapshot". A failed commit restarts the whole loop — fresh
    /// read, fresh compute — never just the commit with a stale read.
    ///
    /// # Errors
    /// After [`MAX_UPDATE_ATTEMPTS`] conflicting attempts the call
    /// fails with [`KvError::ConflictExhausted`]. Callers must not
    /// assume eventual success; under heavy contention keep `f` cheap
    /// and idempotent, and handle the failure explicitly.
    pub async fn update<T, F>(&self, key: &str, mut f: F) -> Result<(), KvError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(Option<T>) -> T,
    {
        let full_key = self.namespaced(key);

        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let snapshot = self.backend.get(&full_key).await?;
            let current = match &snapshot {
                Some(raw) => {
                    Some(serde_json::from_str(raw).map_err(KvError::Decode)?)
                }
                None => None,
            };

            let next = f(current);
            let encoded =
                serde_json::to_string(&next).map_err(KvError::Encode)?;

            if self
                .backend
                .compare_and_swap(&full_key, snapshot.as_deref(), &encoded)
                .await?
            {
                return Ok(());
            }

            tracing::debug!(key = %full_key, attempt, "update conflict, retrying");
        }

        Err(KvError::ConflictExhausted {
            key: key.to_string(),
            attempts: MAX_UPDATE_ATTEMPTS,
        })
    }

    /// Read-modify-write **without** conflict detection: plain
    /// get → compute → set.
    ///
    /// A concurrent writer landing between the read and the write is
    /// silently overwritten. This exists for callers mirroring
    /// transports that cannot offer a conditional commit; everything
    /// that can should use [`update`](Self::update) instead.
    pub async fn update_best_effort<T, F>(
        &self,
        key: &str,
        f: F,
    ) -> Result<(), KvError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> T,
    {
        let current = self.get(key).await?;
        let next = f(current);
        self.set(key, &next).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;

    #[test]
    fn test_room_namespace_shape() {
        let store =
            KvStore::room_scoped(MemoryBackend::new(), "app1", "lobby");
        assert_eq!(store.namespace(), "app:app1:room:lobby:");
    }

    #[test]
    fn test_app_namespace_shape() {
        let store = KvStore::app_scoped(MemoryBackend::new(), "app1");
        assert_eq!(store.namespace(), "app:app1:global:");
    }
}
