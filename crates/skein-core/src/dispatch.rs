//! Routing of record operations to the plugin registered for a collection.
//!
//! The dispatcher is the only place that knows the full set of supported
//! collections. It carries no indexing logic of its own.

use std::{collections::HashMap, sync::Arc};

use serde_json::Value;

use crate::{Error, Result, id::RecordUri, plugin::RecordPlugin};

/// An operation on one record.
#[derive(Debug, Clone, PartialEq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
  Get(RecordUri),
  Set(RecordUri, Value),
  Delete(RecordUri),
}

impl Operation {
  pub fn uri(&self) -> &RecordUri {
    match self {
      Self::Get(uri) | Self::Set(uri, _) | Self::Delete(uri) => uri,
    }
  }
}

/// What a dispatched [`Operation`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
  Fetched(Option<Value>),
  Written,
  Deleted,
}

#[derive(Default)]
pub struct Dispatcher {
  by_collection: HashMap<&'static str, Arc<dyn RecordPlugin>>,
  by_table:      HashMap<&'static str, Arc<dyn RecordPlugin>>,
}

impl Dispatcher {
  pub fn new() -> Self { Self::default() }

  /// Register `plugin` under its collection and table name.
  ///
  /// A second plugin for an already registered collection or table is a
  /// configuration error; callers should treat it as fatal at startup.
  pub fn register(&mut self, plugin: Arc<dyn RecordPlugin>) -> Result<()> {
    let collection = plugin.collection();
    let table = plugin.table_name();

    if self.by_collection.contains_key(collection) {
      return Err(Error::DuplicateCollection(collection.to_owned()));
    }
    if self.by_table.contains_key(table) {
      return Err(Error::DuplicateTable(table.to_owned()));
    }

    self.by_collection.insert(collection, Arc::clone(&plugin));
    self.by_table.insert(table, plugin);
    tracing::info!(collection, table, "registered record plugin");
    Ok(())
  }

  /// Builder form of [`Dispatcher::register`].
  pub fn with(mut self, plugin: Arc<dyn RecordPlugin>) -> Result<Self> {
    self.register(plugin)?;
    Ok(self)
  }

  pub fn plugin(&self, collection: &str) -> Result<&Arc<dyn RecordPlugin>> {
    self
      .by_collection
      .get(collection)
      .ok_or_else(|| Error::UnknownCollection(collection.to_owned()))
  }

  pub fn plugin_for_table(&self, table: &str) -> Option<&Arc<dyn RecordPlugin>> {
    self.by_table.get(table)
  }

  /// Registered collection names, sorted.
  pub fn collections(&self) -> Vec<&'static str> {
    let mut names: Vec<_> = self.by_collection.keys().copied().collect();
    names.sort_unstable();
    names
  }

  /// Forward `op` to the plugin registered for `collection`.
  pub async fn dispatch(&self, collection: &str, op: Operation) -> Result<Outcome> {
    let plugin = self.plugin(collection)?;
    let name: &'static str = (&op).into();
    tracing::debug!(collection, op = name, uri = %op.uri(), "dispatching");

    match op {
      Operation::Get(uri) => Ok(Outcome::Fetched(plugin.get(&uri).await?)),
      Operation::Set(uri, payload) => {
        plugin.set(&uri, payload).await?;
        Ok(Outcome::Written)
      }
      Operation::Delete(uri) => {
        plugin.delete(&uri).await?;
        Ok(Outcome::Deleted)
      }
    }
  }

  /// Dispatch `op` to the collection named by its own URI.
  pub async fn apply(&self, op: Operation) -> Result<Outcome> {
    let collection = op.uri().collection().to_owned();
    self.dispatch(&collection, op).await
  }

  pub async fn get(&self, uri: &RecordUri) -> Result<Option<Value>> {
    self.plugin(uri.collection())?.get(uri).await
  }

  pub async fn set(&self, uri: &RecordUri, payload: Value) -> Result<()> {
    self.plugin(uri.collection())?.set(uri, payload).await
  }

  pub async fn delete(&self, uri: &RecordUri) -> Result<()> {
    self.plugin(uri.collection())?.delete(uri).await
  }
}
