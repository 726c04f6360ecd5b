//! The `RowStore` trait: the storage handle injected into every plugin.
//!
//! The trait is implemented by storage backends (e.g. `skein-store-sqlite`).
//! Plugins and the dispatcher depend on this abstraction, not on any concrete
//! backend, so a fake store can stand in during tests.

use std::future::Future;

use crate::{Result, collection::Collection, id::RecordUri};

/// Keyed storage for the rows of one collection.
///
/// Each call is a single unit of work. Implementations enforce key
/// uniqueness through the store's own constraints and report constraint
/// failures as [`Error::ReferentialViolation`](crate::Error) or
/// [`Error::Conflict`](crate::Error) rather than retrying.
pub trait RowStore<C: Collection>: Send + Sync {
  /// Insert `row`, or fully replace the row already stored for `uri`.
  fn upsert<'a>(
    &'a self,
    uri: &'a RecordUri,
    row: C::Row,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// The row stored for `uri`, or `None`.
  fn fetch<'a>(
    &'a self,
    uri: &'a RecordUri,
  ) -> impl Future<Output = Result<Option<C::Row>>> + Send + 'a;

  /// Remove the row stored for `uri`. Removing a missing row succeeds.
  fn remove<'a>(
    &'a self,
    uri: &'a RecordUri,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}
