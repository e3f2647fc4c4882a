//! The `KvStore` trait and the in-memory backend.
//!
//! Persisted state is a handful of JSON documents under well-known keys (see
//! [`crate::repo`]). Backends only move whole documents and the last write
//! to a key wins; [`KvStore::set_many`] replaces several keys all-or-nothing.

use std::{
  collections::HashMap,
  convert::Infallible,
  future::Future,
  sync::{Arc, Mutex, PoisonError},
};

use serde_json::Value;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a key-value store of JSON documents.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait KvStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the document under `key`. Returns `None` if it was never set.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + 'a;

  /// Replace the document under `key`.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Replace several documents at once. Either every entry is written or
  /// none is.
  fn set_many<'a>(
    &'a self,
    entries: Vec<(&'a str, Value)>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Memory backend ──────────────────────────────────────────────────────────

/// A process-local store; contents vanish with the process.
///
/// Cloning is cheap and clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl KvStore for MemoryStore {
  type Error = Infallible;

  async fn get(&self, key: &str) -> Result<Option<Value>, Infallible> {
    let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(map.get(key).cloned())
  }

  async fn set(&self, key: &str, value: Value) -> Result<(), Infallible> {
    let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    map.insert(key.to_owned(), value);
    Ok(())
  }

  async fn set_many(&self, entries: Vec<(&str, Value)>) -> Result<(), Infallible> {
    let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    map.extend(entries.into_iter().map(|(k, v)| (k.to_owned(), v)));
    Ok(())
  }
}
