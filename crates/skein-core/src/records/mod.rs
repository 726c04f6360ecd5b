//! The indexed record kinds.
//!
//! Each submodule defines the canonical record, the row it projects to, and
//! a [`Collection`](crate::collection::Collection) marker tying the two
//! together.

pub mod follow;
pub mod identity;
pub mod like;
pub mod post;

pub use follow::{Follow, FollowRow, Follows};
pub use identity::{Identities, UserIdentity, UserIdentityRow};
pub use like::{Like, LikeRow, Likes};
pub use post::{Post, PostRow, Posts, ReplyRef};

/// Author-supplied timestamps must be RFC 3339. They are stored verbatim so
/// the original string survives a round trip byte for byte.
pub(crate) fn is_timestamp(s: &str) -> bool {
  chrono::DateTime::parse_from_rfc3339(s).is_ok()
}

/// `s` normalised to UTC at fixed nanosecond precision, so that byte order
/// matches chronological order whatever offset the author wrote. Input that
/// is not RFC 3339 is returned unchanged.
pub(crate) fn utc_sort_key(s: &str) -> String {
  chrono::DateTime::parse_from_rfc3339(s).map_or_else(
    |_| s.to_owned(),
    |dt| {
      dt.with_timezone(&chrono::Utc)
        .to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
    },
  )
}

/// Parse a URI read back from a row, attributing failures to `table`.
pub(crate) fn stored_uri(
  table: &'static str,
  value: &str,
) -> crate::Result<crate::id::RecordUri> {
  value.parse().map_err(|e: crate::Error| crate::Error::CorruptRow {
    table,
    reason: e.to_string(),
  })
}

/// Parse a DID read back from a row, attributing failures to `table`.
pub(crate) fn stored_did(
  table: &'static str,
  value: &str,
) -> crate::Result<crate::id::Did> {
  value.parse().map_err(|e: crate::Error| crate::Error::CorruptRow {
    table,
    reason: e.to_string(),
  })
}
