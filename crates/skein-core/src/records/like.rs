//! `bsky/likes`: a like of one post.
//!
//! Likes are keyed by their identity tuple rather than their URI, and point
//! at the liked post through the post's tuple. Both tuples are recomputed
//! from URIs, so the row needs no URI columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Posts, is_timestamp, stored_did};
use crate::{Result, collection::Collection, id::RecordUri};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
  /// URI of the liked post.
  pub subject:     RecordUri,
  /// Content id of the liked post at the time of liking, if known.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subject_cid: Option<String>,
  pub created_at:  String,
}

/// One row of the `likes` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRow {
  pub tid:          String,
  pub author:       String,
  pub program:      String,
  pub post_tid:     String,
  pub post_author:  String,
  pub post_program: String,
  pub post_cid:     Option<String>,
  pub created_at:   String,
  pub indexed_at:   DateTime<Utc>,
}

pub struct Likes;

impl Collection for Likes {
  const NAME: &'static str = "bsky/likes";
  const SCHEMA_ID: &'static str = "blueskyweb.xyz:Like";
  const TABLE: &'static str = "likes";

  type Record = Like;
  type Row = LikeRow;

  fn is_well_formed(record: &Like) -> bool {
    is_timestamp(&record.created_at) && record.subject.collection() == Posts::NAME
  }

  fn to_row(uri: &RecordUri, record: &Like, indexed_at: DateTime<Utc>) -> LikeRow {
    LikeRow {
      tid: uri.record_key().to_owned(),
      author: uri.owner().to_string(),
      program: uri.namespace().to_owned(),
      post_tid: record.subject.record_key().to_owned(),
      post_author: record.subject.owner().to_string(),
      post_program: record.subject.namespace().to_owned(),
      post_cid: record.subject_cid.clone(),
      created_at: record.created_at.clone(),
      indexed_at,
    }
  }

  fn translate_db_obj(row: &LikeRow) -> Result<Like> {
    let post_author = stored_did(Self::TABLE, &row.post_author)?;
    let subject = RecordUri::new(post_author, Posts::NAME, row.post_tid.as_str())?;

    Ok(Like {
      subject,
      subject_cid: row.post_cid.clone(),
      created_at: row.created_at.clone(),
    })
  }
}
