//! The SQLite implementation of [`KvStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use serde_json::Value;

use courtly_core::store::KvStore;

use crate::{
  Error, Result,
  encode::{decode_value, encode_dt, encode_value},
  schema::SCHEMA,
};

const UPSERT: &str = "INSERT INTO kv (key, value_json, updated_at) VALUES (?1, ?2, ?3)
  ON CONFLICT(key) DO UPDATE SET
    value_json = excluded.value_json,
    updated_at = excluded.updated_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Courtly key-value store backed by a single SQLite file.
///
/// Clones share the underlying connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a store backed by an in-memory database.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// All keys currently holding a document, in key order.
  pub async fn keys(&self) -> Result<Vec<String>> {
    let keys = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(keys)
  }
}

// ─── KvStore impl ────────────────────────────────────────────────────────────

impl KvStore for SqliteStore {
  type Error = Error;

  async fn get(&self, key: &str) -> Result<Option<Value>> {
    let key = key.to_owned();

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT value_json FROM kv WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    raw.as_deref().map(decode_value).transpose()
  }

  async fn set(&self, key: &str, value: Value) -> Result<()> {
    let key_str   = key.to_owned();
    let value_str = encode_value(&value)?;
    let at_str    = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(UPSERT, rusqlite::params![key_str, value_str, at_str])?;
        Ok(())
      })
      .await?;

    tracing::debug!(key, "stored document");
    Ok(())
  }

  async fn set_many(&self, entries: Vec<(&str, Value)>) -> Result<()> {
    let at_str = encode_dt(Utc::now());
    let rows = entries
      .into_iter()
      .map(|(k, v)| Ok((k.to_owned(), encode_value(&v)?)))
      .collect::<Result<Vec<(String, String)>>>()?;
    let count = rows.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (key, value) in &rows {
          tx.execute(UPSERT, rusqlite::params![key, value, at_str])?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(count, "stored documents");
    Ok(())
  }
}
