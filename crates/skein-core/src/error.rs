//! Error types for `skein-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The payload was rejected by the schema oracle or by a plugin's own
  /// admission checks. Nothing was written.
  #[error("record does not match schema {schema_id}: {reason}")]
  SchemaViolation {
    schema_id: &'static str,
    reason:    String,
  },

  #[error("unknown collection: {0:?}")]
  UnknownCollection(String),

  #[error("a plugin is already registered for collection {0:?}")]
  DuplicateCollection(String),

  #[error("a plugin is already registered for table {0:?}")]
  DuplicateTable(String),

  #[error("record {uri} belongs to {found:?}, not {expected:?}")]
  CollectionMismatch {
    uri:      String,
    expected: &'static str,
    found:    String,
  },

  /// A foreign or compound key rejected the row. Retrying cannot succeed.
  #[error("referential integrity violation: {0}")]
  ReferentialViolation(String),

  /// A unique key other than the row's own identity is already taken.
  #[error("uniqueness conflict: {0}")]
  Conflict(String),

  /// A CHECK or NOT NULL constraint rejected the row. Retrying cannot
  /// succeed.
  #[error("constraint violation: {0}")]
  Constraint(String),

  /// Connectivity or transaction failure; safe for the caller to retry.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("invalid record uri {uri:?}: {reason}")]
  InvalidUri { uri: String, reason: &'static str },

  /// A stored row that no valid record could have produced.
  #[error("corrupt row in {table}: {reason}")]
  CorruptRow {
    table:  &'static str,
    reason: String,
  },

  #[error("invalid did {0:?}")]
  InvalidDid(String),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl Error {
  /// True for failures that may succeed on retry.
  pub fn is_transient(&self) -> bool { matches!(self, Self::Storage(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
