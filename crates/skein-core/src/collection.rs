//! The per-collection descriptor that every indexed record kind implements.
//!
//! A [`Collection`] is a zero-sized marker type that ties together a
//! collection name, its backing table, its schema id, the canonical record
//! type and the relational row type. It holds no storage handle; the
//! translation between record and row is pure so that it can be checked
//! without a database.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::{Deserialize as _, Serialize, de::DeserializeOwned};

use crate::{Result, id::RecordUri};

pub trait Collection: Send + Sync + 'static {
  /// Collection name as it appears in record URIs, e.g. `bsky/posts`.
  const NAME: &'static str;

  /// Table holding this collection's index rows.
  const TABLE: &'static str;

  /// Identifier handed to the [`SchemaOracle`](crate::oracle::SchemaOracle).
  const SCHEMA_ID: &'static str;

  /// Canonical wire representation.
  type Record: Serialize
    + DeserializeOwned
    + Clone
    + Debug
    + PartialEq
    + Send
    + Sync
    + 'static;

  /// Relational projection of one record.
  type Row: Clone + Debug + PartialEq + Send + Sync + 'static;

  /// Checks on the record body that a typed parse alone cannot express.
  fn is_well_formed(_record: &Self::Record) -> bool { true }

  /// Checks that depend on the record's URI. Runs after schema validation
  /// and before a row is built; an `Err` carries the rejection reason.
  fn admit(_uri: &RecordUri, _record: &Self::Record) -> Result<(), String> {
    Ok(())
  }

  /// Build the full row for `record` at `uri`. Owner columns come from the
  /// URI, never from the record body.
  fn to_row(
    uri: &RecordUri,
    record: &Self::Record,
    indexed_at: DateTime<Utc>,
  ) -> Self::Row;

  /// Rebuild the canonical record from a stored row. Exact left inverse of
  /// [`Collection::to_row`] for every field the row owns; fails only for rows
  /// that `to_row` could not have produced.
  fn translate_db_obj(row: &Self::Row) -> Result<Self::Record>;
}

/// Parse and check `payload` as a `C::Record` without consulting any oracle.
pub fn parse_record<C: Collection>(
  payload: &serde_json::Value,
) -> Option<C::Record> {
  C::Record::deserialize(payload)
    .ok()
    .filter(|record| C::is_well_formed(record))
}
