//! Error type for `skein-store-sqlite`.

use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] skein_core::Error),

  #[error("database error: {0}")]
  Database(#[source] tokio_rusqlite::Error),

  /// A foreign or compound key rejected the row.
  #[error("referential integrity violation: {0}")]
  ReferentialViolation(String),

  /// A unique or primary key rejected the row.
  #[error("uniqueness conflict: {0}")]
  Conflict(String),

  /// A CHECK or NOT NULL constraint rejected the row.
  #[error("constraint violation: {0}")]
  Constraint(String),

  /// `create_all` found every table already present.
  #[error("schema is already initialised")]
  SchemaAlreadyInitialized,

  /// `create_all` found some tables but not all of them.
  #[error("schema is partially initialised; present tables: {present:?}")]
  PartialSchema { present: Vec<String> },

  /// A system timestamp stored in `table` could not be decoded.
  #[error("date/time parse error in {table}: {reason}")]
  DateParse {
    table:  &'static str,
    reason: String,
  },
}

impl From<tokio_rusqlite::Error> for Error {
  /// Constraint failures get their own variants; everything else is a
  /// database error.
  fn from(e: tokio_rusqlite::Error) -> Self {
    if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      failure,
      message,
    )) = &e
    {
      let detail = message.clone().unwrap_or_else(|| failure.to_string());
      match failure.extended_code {
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
          return Self::ReferentialViolation(detail);
        }
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
          return Self::Conflict(detail);
        }
        ffi::SQLITE_CONSTRAINT_CHECK | ffi::SQLITE_CONSTRAINT_NOTNULL => {
          return Self::Constraint(detail);
        }
        _ => {}
      }
    }
    Self::Database(e)
  }
}

/// Hand errors to plugins and the dispatcher with their kind intact. Only
/// failures a retry could fix become [`skein_core::Error::Storage`].
impl From<Error> for skein_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(inner) => inner,
      Error::ReferentialViolation(detail) => Self::ReferentialViolation(detail),
      Error::Conflict(detail) => Self::Conflict(detail),
      Error::Constraint(detail) => Self::Constraint(detail),
      Error::DateParse { table, reason } => Self::CorruptRow { table, reason },
      other => Self::Storage(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  fn failure(extended_code: i32) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      ffi::Error::new(extended_code),
      Some("constraint failed".into()),
    ))
  }

  #[test]
  fn constraint_codes_are_classified() {
    assert!(matches!(
      Error::from(failure(ffi::SQLITE_CONSTRAINT_FOREIGNKEY)),
      Error::ReferentialViolation(_)
    ));
    assert!(matches!(
      Error::from(failure(ffi::SQLITE_CONSTRAINT_PRIMARYKEY)),
      Error::Conflict(_)
    ));
    assert!(matches!(
      Error::from(failure(ffi::SQLITE_CONSTRAINT_CHECK)),
      Error::Constraint(_)
    ));
    assert!(matches!(
      Error::from(failure(ffi::SQLITE_CONSTRAINT_NOTNULL)),
      Error::Constraint(_)
    ));
    assert!(matches!(Error::from(failure(ffi::SQLITE_BUSY)), Error::Database(_)));
  }

  #[test]
  fn only_database_failures_are_transient() {
    let core = |e: Error| skein_core::Error::from(e);

    assert!(core(Error::from(failure(ffi::SQLITE_BUSY))).is_transient());
    assert!(!core(Error::from(failure(ffi::SQLITE_CONSTRAINT_CHECK))).is_transient());
    assert!(!core(Error::from(failure(ffi::SQLITE_CONSTRAINT_NOTNULL))).is_transient());

    let corrupt = core(Error::DateParse {
      table:  "posts",
      reason: "noon".into(),
    });
    assert!(matches!(
      corrupt,
      skein_core::Error::CorruptRow { table: "posts", .. }
    ));
    assert!(!corrupt.is_transient());
  }
}
