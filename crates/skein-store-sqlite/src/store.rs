//! [`SqliteStore`]: the SQLite connection handle and schema lifecycle.

use std::{path::Path, sync::Arc};

use rusqlite::OptionalExtension as _;
use skein_core::{
  collection::Collection,
  dispatch::Dispatcher,
  id::Did,
  oracle::SchemaOracle,
  plugin::IndexPlugin,
  records::{Follows, Identities, Likes, Posts},
  store::RowStore,
};

use crate::{
  Error, Result,
  schema::{DROP_ORDER, PRAGMAS, TABLES, create_all_sql, drop_sql},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The skein index backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every
/// operation runs as one call on the connection's worker thread, so calls
/// from concurrent tasks are serialised there and never hold a lock across
/// an await point.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a database at `path`. Tables are not created; call
  /// [`SqliteStore::create_all`] once when setting up a fresh database.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.apply_pragmas().await?;
    Ok(store)
  }

  /// Open an in-memory database, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.apply_pragmas().await?;
    Ok(store)
  }

  async fn apply_pragmas(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Schema lifecycle ──────────────────────────────────────────────────────

  /// Create every table and index in dependency order.
  ///
  /// Fails with [`Error::SchemaAlreadyInitialized`] when the schema is
  /// already in place, and with [`Error::PartialSchema`] when only some of
  /// the tables exist. In both cases nothing is changed.
  pub async fn create_all(&self) -> Result<()> {
    let present = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let present = existing_tables(&tx)?;
        if present.is_empty() {
          tx.execute_batch(&create_all_sql())?;
          tx.commit()?;
        }
        Ok(present)
      })
      .await?;

    if present.is_empty() {
      tracing::info!(tables = TABLES.len(), "created index schema");
      Ok(())
    } else if present.len() == TABLES.len() {
      Err(Error::SchemaAlreadyInitialized)
    } else {
      Err(Error::PartialSchema { present })
    }
  }

  /// Drop every table, children before parents. Missing tables are skipped.
  pub async fn drop_all(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        for name in DROP_ORDER {
          tx.execute_batch(&drop_sql(name))?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    tracing::info!("dropped index schema");
    Ok(())
  }

  /// Drop a single table if it exists.
  pub async fn drop_table(&self, name: &str) -> Result<()> {
    let sql = drop_sql(name);
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    tracing::info!(table = name, "dropped table");
    Ok(())
  }

  /// True when every index table exists.
  pub async fn is_initialized(&self) -> Result<bool> {
    let present = self
      .conn
      .call(|conn| Ok(existing_tables(conn)?))
      .await?;
    Ok(present.len() == TABLES.len())
  }

  // ── Repo roots ────────────────────────────────────────────────────────────

  /// Record `root` as the current repository root for `did`.
  pub async fn set_repo_root(&self, did: &Did, root: &str) -> Result<()> {
    let did = did.to_string();
    let root = root.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO repo_roots (did, root) VALUES (?1, ?2)
           ON CONFLICT (did) DO UPDATE SET root = excluded.root",
          rusqlite::params![did, root],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn repo_root(&self, did: &Did) -> Result<Option<String>> {
    let did = did.to_string();
    let root = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT root FROM repo_roots WHERE did = ?1",
              rusqlite::params![did],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(root)
  }

  pub async fn delete_repo_root(&self, did: &Did) -> Result<()> {
    let did = did.to_string();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM repo_roots WHERE did = ?1", rusqlite::params![did])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Plugins ───────────────────────────────────────────────────────────────

  /// The index plugin for collection `C`, backed by this store.
  pub fn plugin<C>(&self, oracle: Arc<dyn SchemaOracle>) -> IndexPlugin<C, Self>
  where
    C: Collection,
    Self: RowStore<C>,
  {
    IndexPlugin::new(self.clone(), oracle)
  }

  /// A dispatcher with a plugin registered for every collection.
  pub fn dispatcher(
    &self,
    oracle: Arc<dyn SchemaOracle>,
  ) -> skein_core::Result<Dispatcher> {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(Arc::new(self.plugin::<Identities>(oracle.clone())))?;
    dispatcher.register(Arc::new(self.plugin::<Posts>(oracle.clone())))?;
    dispatcher.register(Arc::new(self.plugin::<Likes>(oracle.clone())))?;
    dispatcher.register(Arc::new(self.plugin::<Follows>(oracle)))?;
    Ok(dispatcher)
  }
}

/// Names of the index tables that currently exist.
fn existing_tables(conn: &rusqlite::Connection) -> rusqlite::Result<Vec<String>> {
  let mut stmt =
    conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
  let mut present = Vec::new();
  for table in TABLES {
    if stmt.exists([table.name])? {
      present.push(table.name.to_owned());
    }
  }
  Ok(present)
}
