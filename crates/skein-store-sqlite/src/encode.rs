//! Encoding and decoding helpers between row types and the plain-text
//! representations stored in SQLite columns.
//!
//! System timestamps are stored as RFC 3339 strings. Author-supplied
//! timestamps are stored exactly as received and never pass through here.

use chrono::{DateTime, Utc};
use skein_core::records::{FollowRow, LikeRow, PostRow};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

/// Decode a system timestamp read from `table`.
pub fn decode_dt(table: &'static str, s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse {
      table,
      reason: format!("{s:?}: {e}"),
    })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `posts` row.
pub struct RawPost {
  pub uri:            String,
  pub creator:        String,
  pub tid:            String,
  pub program:        String,
  pub text:           String,
  pub reply_root:     Option<String>,
  pub reply_parent:   Option<String>,
  pub created_at:     String,
  pub created_at_utc: String,
  pub indexed_at:     String,
}

/// Column list matching [`RawPost::from_row`].
pub const POST_COLUMNS: &str = "uri, creator, tid, program, text, reply_root, \
                                reply_parent, created_at, created_at_utc, indexed_at";

impl RawPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      uri:            row.get(0)?,
      creator:        row.get(1)?,
      tid:            row.get(2)?,
      program:        row.get(3)?,
      text:           row.get(4)?,
      reply_root:     row.get(5)?,
      reply_parent:   row.get(6)?,
      created_at:     row.get(7)?,
      created_at_utc: row.get(8)?,
      indexed_at:     row.get(9)?,
    })
  }

  pub fn into_row(self) -> Result<PostRow> {
    Ok(PostRow {
      indexed_at:     decode_dt("posts", &self.indexed_at)?,
      uri:            self.uri,
      creator:        self.creator,
      tid:            self.tid,
      program:        self.program,
      text:           self.text,
      reply_root:     self.reply_root,
      reply_parent:   self.reply_parent,
      created_at:     self.created_at,
      created_at_utc: self.created_at_utc,
    })
  }
}

/// Raw strings read directly from a `likes` row.
pub struct RawLike {
  pub tid:          String,
  pub author:       String,
  pub program:      String,
  pub post_tid:     String,
  pub post_author:  String,
  pub post_program: String,
  pub post_cid:     Option<String>,
  pub created_at:   String,
  pub indexed_at:   String,
}

pub const LIKE_COLUMNS: &str = "tid, author, program, post_tid, post_author, \
                                post_program, post_cid, created_at, indexed_at";

impl RawLike {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tid:          row.get(0)?,
      author:       row.get(1)?,
      program:      row.get(2)?,
      post_tid:     row.get(3)?,
      post_author:  row.get(4)?,
      post_program: row.get(5)?,
      post_cid:     row.get(6)?,
      created_at:   row.get(7)?,
      indexed_at:   row.get(8)?,
    })
  }

  pub fn into_row(self) -> Result<LikeRow> {
    Ok(LikeRow {
      indexed_at:   decode_dt("likes", &self.indexed_at)?,
      tid:          self.tid,
      author:       self.author,
      program:      self.program,
      post_tid:     self.post_tid,
      post_author:  self.post_author,
      post_program: self.post_program,
      post_cid:     self.post_cid,
      created_at:   self.created_at,
    })
  }
}

/// Raw strings read directly from a `follows` row.
pub struct RawFollow {
  pub creator:    String,
  pub target:     String,
  pub uri:        String,
  pub created_at: String,
  pub indexed_at: String,
}

pub const FOLLOW_COLUMNS: &str = "creator, target, uri, created_at, indexed_at";

impl RawFollow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      creator:    row.get(0)?,
      target:     row.get(1)?,
      uri:        row.get(2)?,
      created_at: row.get(3)?,
      indexed_at: row.get(4)?,
    })
  }

  pub fn into_row(self) -> Result<FollowRow> {
    Ok(FollowRow {
      indexed_at: decode_dt("follows", &self.indexed_at)?,
      creator:    self.creator,
      target:     self.target,
      uri:        self.uri,
      created_at: self.created_at,
    })
  }
}
