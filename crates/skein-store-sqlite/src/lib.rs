//! SQLite backend for the skein record index.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every collection's rows go through
//! the [`RowStore`](skein_core::store::RowStore) impls in `rows`; read-side
//! lookups live in `queries`.

mod encode;
mod queries;
mod rows;
mod store;

pub mod error;
pub mod schema;

pub use error::{Error, Result};
pub use queries::IndexedPost;
pub use store::SqliteStore;
