//! Core types and trait definitions for the skein record index.
//!
//! This crate is deliberately free of database dependencies. It defines the
//! record identifiers, the indexed record kinds, the plugin contract and the
//! dispatcher; storage backends implement [`store::RowStore`].

pub mod collection;
pub mod dispatch;
pub mod error;
pub mod id;
pub mod oracle;
pub mod plugin;
pub mod records;
pub mod store;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
