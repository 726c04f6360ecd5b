//! `bsky/posts`: short text posts, optionally replying into a thread.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_timestamp, stored_uri, utc_sort_key};
use crate::{Error, Result, collection::Collection, id::RecordUri};

/// Thread linkage of a reply. Both ends are always named: a reply without an
/// explicit parent is not a valid post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
  /// The post that started the thread.
  pub root:   RecordUri,
  /// The post being replied to directly.
  pub parent: RecordUri,
}

/// Canonical post record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
  pub text:       String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reply:      Option<ReplyRef>,
  /// RFC 3339, as written by the author.
  pub created_at: String,
}

/// One row of the `posts` table.
///
/// `tid` and `program` are the record key and namespace of `uri`; together
/// with `creator` they form the identity tuple that likes reference.
/// `created_at` is the author's string verbatim; `created_at_utc` is the
/// same instant in UTC and is what timelines sort on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRow {
  pub uri:            String,
  pub creator:        String,
  pub tid:            String,
  pub program:        String,
  pub text:           String,
  pub reply_root:     Option<String>,
  pub reply_parent:   Option<String>,
  pub created_at:     String,
  pub created_at_utc: String,
  pub indexed_at:     DateTime<Utc>,
}

pub struct Posts;

impl Collection for Posts {
  const NAME: &'static str = "bsky/posts";
  const SCHEMA_ID: &'static str = "blueskyweb.xyz:Post";
  const TABLE: &'static str = "posts";

  type Record = Post;
  type Row = PostRow;

  fn is_well_formed(record: &Post) -> bool { is_timestamp(&record.created_at) }

  fn to_row(uri: &RecordUri, record: &Post, indexed_at: DateTime<Utc>) -> PostRow {
    PostRow {
      uri: uri.to_string(),
      creator: uri.owner().to_string(),
      tid: uri.record_key().to_owned(),
      program: uri.namespace().to_owned(),
      text: record.text.clone(),
      reply_root: record.reply.as_ref().map(|r| r.root.to_string()),
      reply_parent: record.reply.as_ref().map(|r| r.parent.to_string()),
      created_at: record.created_at.clone(),
      created_at_utc: utc_sort_key(&record.created_at),
      indexed_at,
    }
  }

  fn translate_db_obj(row: &PostRow) -> Result<Post> {
    let reply = match (&row.reply_root, &row.reply_parent) {
      (Some(root), Some(parent)) => Some(ReplyRef {
        root:   stored_uri(Self::TABLE, root)?,
        parent: stored_uri(Self::TABLE, parent)?,
      }),
      (None, None) => None,
      (Some(_), None) => {
        return Err(Error::CorruptRow {
          table:  Self::TABLE,
          reason: format!("{} has a reply root but no parent", row.uri),
        });
      }
      (None, Some(_)) => {
        return Err(Error::CorruptRow {
          table:  Self::TABLE,
          reason: format!("{} has a reply parent but no root", row.uri),
        });
      }
    };

    Ok(Post {
      text: row.text.clone(),
      reply,
      created_at: row.created_at.clone(),
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::json;

  use super::*;
  use crate::collection::parse_record;

  fn uri(s: &str) -> RecordUri { s.parse().unwrap() }

  fn at() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap() }

  #[test]
  fn row_identity_comes_from_the_uri() {
    let post = Post {
      text:       "hello".into(),
      reply:      None,
      created_at: "2024-01-01T00:00:00Z".into(),
    };
    let row = Posts::to_row(&uri("did:example:alice/bsky/posts/3"), &post, at());

    assert_eq!(row.uri, "did:example:alice/bsky/posts/3");
    assert_eq!(row.creator, "did:example:alice");
    assert_eq!(row.tid, "3");
    assert_eq!(row.program, "bsky");
    assert_eq!(row.indexed_at, at());
  }

  #[test]
  fn payload_cannot_spoof_the_creator() {
    let post = parse_record::<Posts>(&json!({
      "text": "hi",
      "createdAt": "2024-01-01T00:00:00Z",
      "creator": "did:example:mallory",
    }))
    .unwrap();
    let row = Posts::to_row(&uri("did:example:alice/bsky/posts/3"), &post, at());
    assert_eq!(row.creator, "did:example:alice");
  }

  #[test]
  fn round_trip_without_reply() {
    let post = Post {
      text:       "hello".into(),
      reply:      None,
      created_at: "2024-01-01T00:00:00Z".into(),
    };
    let row = Posts::to_row(&uri("did:example:alice/bsky/posts/3"), &post, at());
    assert_eq!(row.reply_root, None);
    assert_eq!(row.reply_parent, None);
    assert_eq!(Posts::translate_db_obj(&row).unwrap(), post);
  }

  #[test]
  fn round_trip_with_reply() {
    let post = Post {
      text:       "me too".into(),
      reply:      Some(ReplyRef {
        root:   uri("did:example:alice/bsky/posts/1"),
        parent: uri("did:example:bob/bsky/posts/2"),
      }),
      created_at: "2024-01-01T00:00:00.123+02:00".into(),
    };
    let row = Posts::to_row(&uri("did:example:carol/bsky/posts/9"), &post, at());
    assert_eq!(row.reply_root.as_deref(), Some("did:example:alice/bsky/posts/1"));
    assert_eq!(row.reply_parent.as_deref(), Some("did:example:bob/bsky/posts/2"));
    assert_eq!(Posts::translate_db_obj(&row).unwrap(), post);
  }

  #[test]
  fn wire_form_omits_absent_reply() {
    let post = Post {
      text:       "hello".into(),
      reply:      None,
      created_at: "2024-01-01T00:00:00Z".into(),
    };
    assert_eq!(
      serde_json::to_value(&post).unwrap(),
      json!({ "text": "hello", "createdAt": "2024-01-01T00:00:00Z" })
    );
  }

  #[test]
  fn reply_without_parent_is_rejected() {
    let payload = json!({
      "text": "orphan",
      "reply": { "root": "did:example:alice/bsky/posts/1" },
      "createdAt": "2024-01-01T00:00:00Z",
    });
    assert!(parse_record::<Posts>(&payload).is_none());
  }

  #[test]
  fn half_populated_reply_row_is_corrupt() {
    let row = PostRow {
      uri:            "did:example:alice/bsky/posts/3".into(),
      creator:        "did:example:alice".into(),
      tid:            "3".into(),
      program:        "bsky".into(),
      text:           "x".into(),
      reply_root:     Some("did:example:alice/bsky/posts/1".into()),
      reply_parent:   None,
      created_at:     "2024-01-01T00:00:00Z".into(),
      created_at_utc: "2024-01-01T00:00:00.000000000Z".into(),
      indexed_at:     at(),
    };
    assert!(matches!(
      Posts::translate_db_obj(&row),
      Err(Error::CorruptRow { table: "posts", .. })
    ));
  }

  #[test]
  fn created_at_must_be_rfc3339() {
    assert!(
      parse_record::<Posts>(&json!({ "text": "x", "createdAt": "yesterday" }))
        .is_none()
    );
    assert!(parse_record::<Posts>(&json!({ "text": "x" })).is_none());
    assert!(parse_record::<Posts>(&json!({ "createdAt": "2024-01-01T00:00:00Z" })).is_none());
  }

  #[test]
  fn sort_key_orders_by_instant_not_by_text() {
    let post = |created_at: &str| Post {
      text:       "x".into(),
      reply:      None,
      created_at: created_at.into(),
    };
    let at_uri = uri("did:example:alice/bsky/posts/3");

    // 05:00Z written with an offset, then 06:00Z.
    let earlier = Posts::to_row(&at_uri, &post("2024-01-01T10:00:00+05:00"), at());
    let later = Posts::to_row(&at_uri, &post("2024-01-01T06:00:00Z"), at());

    assert!(earlier.created_at > later.created_at);
    assert!(earlier.created_at_utc < later.created_at_utc);
    assert_eq!(earlier.created_at_utc, "2024-01-01T05:00:00.000000000Z");
    assert_eq!(earlier.created_at, "2024-01-01T10:00:00+05:00");
  }
}
