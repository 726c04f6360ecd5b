//! The record index plugin contract.
//!
//! [`RecordPlugin`] is the object-safe shape the dispatcher holds: it speaks
//! raw JSON payloads and knows nothing about concrete record types.
//! [`IndexPlugin`] implements it once for every [`Collection`] over any
//! [`RowStore`], so a collection only has to describe its record and row.

use std::{future::Future, marker::PhantomData, pin::Pin, sync::Arc};

use chrono::Utc;
use serde_json::Value;

use crate::{
  Error, Result,
  collection::{Collection, parse_record},
  id::RecordUri,
  oracle::SchemaOracle,
  store::RowStore,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Per-collection indexing operations, driven generically by the
/// [`Dispatcher`](crate::dispatch::Dispatcher).
pub trait RecordPlugin: Send + Sync {
  /// Collection name, e.g. `bsky/posts`.
  fn collection(&self) -> &'static str;

  /// Table the collection's rows live in.
  fn table_name(&self) -> &'static str;

  fn schema_id(&self) -> &'static str;

  /// Pure predicate: does `payload` conform to this collection's schema?
  fn is_valid_schema(&self, payload: &Value) -> bool;

  /// The canonical record indexed at `uri`, or `None` when no row exists.
  fn get<'a>(&'a self, uri: &'a RecordUri) -> BoxFuture<'a, Result<Option<Value>>>;

  /// Validate `payload` and upsert the row built from it. An invalid payload
  /// fails with [`Error::SchemaViolation`] and nothing is written.
  fn set<'a>(&'a self, uri: &'a RecordUri, payload: Value) -> BoxFuture<'a, Result<()>>;

  /// Remove the row for `uri`; a missing row is not an error.
  fn delete<'a>(&'a self, uri: &'a RecordUri) -> BoxFuture<'a, Result<()>>;
}

// ─── IndexPlugin ─────────────────────────────────────────────────────────────

/// The plugin for collection `C`, storing rows through `S`.
pub struct IndexPlugin<C, S> {
  store:       S,
  oracle:      Arc<dyn SchemaOracle>,
  _collection: PhantomData<fn() -> C>,
}

impl<C: Collection, S: RowStore<C>> IndexPlugin<C, S> {
  pub fn new(store: S, oracle: Arc<dyn SchemaOracle>) -> Self {
    Self {
      store,
      oracle,
      _collection: PhantomData,
    }
  }

  pub fn store(&self) -> &S { &self.store }

  /// Type-narrowing form of [`RecordPlugin::is_valid_schema`].
  pub fn narrow(&self, payload: &Value) -> Option<C::Record> {
    if !self.oracle.validate(C::SCHEMA_ID, payload) {
      return None;
    }
    parse_record::<C>(payload)
  }

  pub fn translate_db_obj(&self, row: &C::Row) -> Result<C::Record> {
    C::translate_db_obj(row)
  }

  fn ensure_collection(&self, uri: &RecordUri) -> Result<()> {
    if uri.collection() != C::NAME {
      return Err(Error::CollectionMismatch {
        uri:      uri.to_string(),
        expected: C::NAME,
        found:    uri.collection().to_owned(),
      });
    }
    Ok(())
  }

  pub async fn get_record(&self, uri: &RecordUri) -> Result<Option<C::Record>> {
    self.ensure_collection(uri)?;
    match self.store.fetch(uri).await? {
      Some(row) => Ok(Some(C::translate_db_obj(&row)?)),
      None => Ok(None),
    }
  }

  /// Validate and index a raw payload.
  pub async fn set_payload(&self, uri: &RecordUri, payload: &Value) -> Result<()> {
    self.ensure_collection(uri)?;

    let violation = |reason: String| Error::SchemaViolation {
      schema_id: C::SCHEMA_ID,
      reason,
    };
    let record = self
      .narrow(payload)
      .ok_or_else(|| violation(format!("payload for {uri} rejected")))?;
    C::admit(uri, &record).map_err(violation)?;

    let row = C::to_row(uri, &record, Utc::now());
    if let Err(e) = self.store.upsert(uri, row).await {
      if matches!(
        e,
        Error::ReferentialViolation(_) | Error::Conflict(_) | Error::Constraint(_)
      ) {
        tracing::warn!(collection = C::NAME, %uri, error = %e, "row rejected by store");
      }
      return Err(e);
    }

    tracing::debug!(collection = C::NAME, %uri, "indexed record");
    Ok(())
  }

  /// Index a typed record. It goes through the same validation as a raw
  /// payload.
  pub async fn set_record(&self, uri: &RecordUri, record: &C::Record) -> Result<()> {
    let payload = serde_json::to_value(record)?;
    self.set_payload(uri, &payload).await
  }

  pub async fn delete_record(&self, uri: &RecordUri) -> Result<()> {
    self.ensure_collection(uri)?;
    self.store.remove(uri).await?;
    tracing::debug!(collection = C::NAME, %uri, "removed record");
    Ok(())
  }
}

impl<C: Collection, S: RowStore<C>> RecordPlugin for IndexPlugin<C, S> {
  fn collection(&self) -> &'static str { C::NAME }

  fn table_name(&self) -> &'static str { C::TABLE }

  fn schema_id(&self) -> &'static str { C::SCHEMA_ID }

  fn is_valid_schema(&self, payload: &Value) -> bool { self.narrow(payload).is_some() }

  fn get<'a>(&'a self, uri: &'a RecordUri) -> BoxFuture<'a, Result<Option<Value>>> {
    Box::pin(async move {
      match self.get_record(uri).await? {
        Some(record) => Ok(Some(serde_json::to_value(record)?)),
        None => Ok(None),
      }
    })
  }

  fn set<'a>(&'a self, uri: &'a RecordUri, payload: Value) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move { self.set_payload(uri, &payload).await })
  }

  fn delete<'a>(&'a self, uri: &'a RecordUri) -> BoxFuture<'a, Result<()>> {
    Box::pin(self.delete_record(uri))
  }
}
