//! Read-side queries over the index tables: the lookups the projection
//! exists to make cheap.

use rusqlite::OptionalExtension as _;
use skein_core::{
  collection::Collection,
  id::{Did, RecordUri},
  records::{Post, Posts},
};

use crate::{
  Result, SqliteStore,
  encode::{POST_COLUMNS, RawPost},
};

/// A post together with the URI it is indexed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedPost {
  pub uri:  RecordUri,
  pub post: Post,
}

fn into_indexed(raws: Vec<RawPost>) -> Result<Vec<IndexedPost>> {
  raws
    .into_iter()
    .map(|raw| -> Result<IndexedPost> {
      let row = raw.into_row()?;
      Ok(IndexedPost {
        uri:  row.uri.parse()?,
        post: Posts::translate_db_obj(&row)?,
      })
    })
    .collect()
}

fn into_dids(raws: Vec<String>) -> Result<Vec<Did>> {
  raws
    .into_iter()
    .map(|s| -> Result<Did> { Ok(s.parse::<Did>()?) })
    .collect()
}

impl SqliteStore {
  /// Posts authored by `creator`, newest first by the instant the author
  /// wrote, whatever offset it was written in.
  pub async fn posts_by_creator(&self, creator: &Did) -> Result<Vec<IndexedPost>> {
    let creator = creator.to_string();
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {POST_COLUMNS} FROM posts
           WHERE creator = ?1
           ORDER BY created_at_utc DESC, uri"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![creator], RawPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    into_indexed(raws)
  }

  /// Every reply in the thread started by `root`, oldest first. The root
  /// post itself is not included.
  pub async fn thread_replies(&self, root: &RecordUri) -> Result<Vec<IndexedPost>> {
    let root = root.to_string();
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {POST_COLUMNS} FROM posts
           WHERE reply_root = ?1
           ORDER BY created_at_utc, uri"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![root], RawPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    into_indexed(raws)
  }

  /// Identities that follow `target`.
  pub async fn followers(&self, target: &Did) -> Result<Vec<Did>> {
    let target = target.to_string();
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("SELECT creator FROM follows WHERE target = ?1 ORDER BY creator")?;
        let rows = stmt
          .query_map(rusqlite::params![target], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    into_dids(raws)
  }

  /// Identities that `creator` follows.
  pub async fn following(&self, creator: &Did) -> Result<Vec<Did>> {
    let creator = creator.to_string();
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("SELECT target FROM follows WHERE creator = ?1 ORDER BY target")?;
        let rows = stmt
          .query_map(rusqlite::params![creator], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    into_dids(raws)
  }

  /// Number of likes on the post at `post`.
  pub async fn like_count(&self, post: &RecordUri) -> Result<u64> {
    let tid = post.record_key().to_owned();
    let author = post.owner().to_string();
    let program = post.namespace().to_owned();
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM likes
           WHERE post_tid = ?1 AND post_author = ?2 AND post_program = ?3",
          rusqlite::params![tid, author, program],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(count.try_into().unwrap_or_default())
  }

  /// The identity that has claimed `username`, if any.
  pub async fn identity_by_username(&self, username: &str) -> Result<Option<Did>> {
    let username = username.to_owned();
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT did FROM user_dids WHERE username = ?1",
              rusqlite::params![username],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(|s| s.parse()).transpose()?)
  }
}
