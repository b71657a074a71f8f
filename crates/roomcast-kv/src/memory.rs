//! In-memory [`KvBackend`] for tests and single-process deployments.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{KvBackend, KvError};

/// A [`KvBackend`] backed by a process-local map.
///
/// Clones share the same map, so handing clones to several
/// [`KvStore`](crate::KvStore)s gives them one coherent store — the
/// same topology as several server processes sharing one Redis.
/// `compare_and_swap` is atomic under the map's lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn scan_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, String)>, KvError> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        next: &str,
    ) -> Result<bool, KvError> {
        let mut entries = self.entries.lock().await;
        if entries.get(key).map(String::as_str) != expected {
            return Ok(false);
        }
        entries.insert(key.to_string(), next.to_string());
        Ok(true)
    }
}
