//! [`RowStore`] implementations for every collection.
//!
//! Each upsert is a single statement (or a single transaction for follows)
//! that fully replaces the previous row; key uniqueness is left entirely to
//! the table constraints.

use rusqlite::OptionalExtension as _;
use skein_core::{
  id::RecordUri,
  records::{
    FollowRow, Follows, Identities, LikeRow, Likes, PostRow, Posts, UserIdentityRow,
    identity::IDENTITY_KEY,
  },
  store::RowStore,
};

use crate::{
  Error, SqliteStore,
  encode::{
    FOLLOW_COLUMNS, LIKE_COLUMNS, POST_COLUMNS, RawFollow, RawLike, RawPost,
    encode_dt,
  },
};

type CoreResult<T> = skein_core::Result<T>;

// ─── Posts ───────────────────────────────────────────────────────────────────

impl RowStore<Posts> for SqliteStore {
  async fn upsert(&self, _uri: &RecordUri, row: PostRow) -> CoreResult<()> {
    let indexed_at = encode_dt(row.indexed_at);
    self
      .conn
      .call(move |conn| {
        // Identity columns are derived from `uri` and never change.
        conn.execute(
          "INSERT INTO posts (
             uri, creator, tid, program, text,
             reply_root, reply_parent, created_at, created_at_utc, indexed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
           ON CONFLICT (uri) DO UPDATE SET
             text           = excluded.text,
             reply_root     = excluded.reply_root,
             reply_parent   = excluded.reply_parent,
             created_at     = excluded.created_at,
             created_at_utc = excluded.created_at_utc,
             indexed_at     = excluded.indexed_at",
          rusqlite::params![
            row.uri,
            row.creator,
            row.tid,
            row.program,
            row.text,
            row.reply_root,
            row.reply_parent,
            row.created_at,
            row.created_at_utc,
            indexed_at,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from)?;
    Ok(())
  }

  async fn fetch(&self, uri: &RecordUri) -> CoreResult<Option<PostRow>> {
    let uri = uri.to_string();
    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {POST_COLUMNS} FROM posts WHERE uri = ?1"),
              rusqlite::params![uri],
              RawPost::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::from)?;

    Ok(raw.map(RawPost::into_row).transpose()?)
  }

  async fn remove(&self, uri: &RecordUri) -> CoreResult<()> {
    let uri = uri.to_string();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM posts WHERE uri = ?1", rusqlite::params![uri])?;
        Ok(())
      })
      .await
      .map_err(Error::from)?;
    Ok(())
  }
}

// ─── Likes ───────────────────────────────────────────────────────────────────

/// The `(tid, author, program)` key of the like at `uri`.
fn like_key(uri: &RecordUri) -> (String, String, String) {
  (
    uri.record_key().to_owned(),
    uri.owner().to_string(),
    uri.namespace().to_owned(),
  )
}

impl RowStore<Likes> for SqliteStore {
  async fn upsert(&self, _uri: &RecordUri, row: LikeRow) -> CoreResult<()> {
    let indexed_at = encode_dt(row.indexed_at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO likes (
             tid, author, program,
             post_tid, post_author, post_program, post_cid,
             created_at, indexed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
           ON CONFLICT (tid, author, program) DO UPDATE SET
             post_tid     = excluded.post_tid,
             post_author  = excluded.post_author,
             post_program = excluded.post_program,
             post_cid     = excluded.post_cid,
             created_at   = excluded.created_at,
             indexed_at   = excluded.indexed_at",
          rusqlite::params![
            row.tid,
            row.author,
            row.program,
            row.post_tid,
            row.post_author,
            row.post_program,
            row.post_cid,
            row.created_at,
            indexed_at,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from)?;
    Ok(())
  }

  async fn fetch(&self, uri: &RecordUri) -> CoreResult<Option<LikeRow>> {
    let (tid, author, program) = like_key(uri);
    let raw: Option<RawLike> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {LIKE_COLUMNS} FROM likes
                 WHERE tid = ?1 AND author = ?2 AND program = ?3"
              ),
              rusqlite::params![tid, author, program],
              RawLike::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::from)?;

    Ok(raw.map(RawLike::into_row).transpose()?)
  }

  async fn remove(&self, uri: &RecordUri) -> CoreResult<()> {
    let (tid, author, program) = like_key(uri);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM likes WHERE tid = ?1 AND author = ?2 AND program = ?3",
          rusqlite::params![tid, author, program],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from)?;
    Ok(())
  }
}

// ─── Follows ─────────────────────────────────────────────────────────────────

impl RowStore<Follows> for SqliteStore {
  async fn upsert(&self, _uri: &RecordUri, row: FollowRow) -> CoreResult<()> {
    let indexed_at = encode_dt(row.indexed_at);
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // The record may have pointed at a different target before.
        tx.execute("DELETE FROM follows WHERE uri = ?1", rusqlite::params![row.uri])?;
        // At most one edge per ordered pair. A second record for a pair
        // that is already followed fails the primary key and rolls back.
        tx.execute(
          "INSERT INTO follows (creator, target, uri, created_at, indexed_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![row.creator, row.target, row.uri, row.created_at, indexed_at],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(Error::from)?;
    Ok(())
  }

  async fn fetch(&self, uri: &RecordUri) -> CoreResult<Option<FollowRow>> {
    let uri = uri.to_string();
    let raw: Option<RawFollow> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {FOLLOW_COLUMNS} FROM follows WHERE uri = ?1"),
              rusqlite::params![uri],
              RawFollow::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::from)?;

    Ok(raw.map(RawFollow::into_row).transpose()?)
  }

  async fn remove(&self, uri: &RecordUri) -> CoreResult<()> {
    let uri = uri.to_string();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM follows WHERE uri = ?1", rusqlite::params![uri])?;
        Ok(())
      })
      .await
      .map_err(Error::from)?;
    Ok(())
  }
}

// ─── Identities ──────────────────────────────────────────────────────────────

impl RowStore<Identities> for SqliteStore {
  async fn upsert(&self, _uri: &RecordUri, row: UserIdentityRow) -> CoreResult<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user_dids (did, username) VALUES (?1, ?2)
           ON CONFLICT (did) DO UPDATE SET username = excluded.username",
          rusqlite::params![row.did, row.username],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from)?;
    Ok(())
  }

  async fn fetch(&self, uri: &RecordUri) -> CoreResult<Option<UserIdentityRow>> {
    if uri.record_key() != IDENTITY_KEY {
      return Ok(None);
    }
    let did = uri.owner().to_string();
    let row = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT did, username FROM user_dids WHERE did = ?1",
              rusqlite::params![did],
              |row| {
                Ok(UserIdentityRow {
                  did:      row.get(0)?,
                  username: row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::from)?;
    Ok(row)
  }

  async fn remove(&self, uri: &RecordUri) -> CoreResult<()> {
    if uri.record_key() != IDENTITY_KEY {
      return Ok(());
    }
    let did = uri.owner().to_string();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM user_dids WHERE did = ?1", rusqlite::params![did])?;
        Ok(())
      })
      .await
      .map_err(Error::from)?;
    Ok(())
  }
}
