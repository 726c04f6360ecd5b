//! Schema validation, consumed as a pass/fail oracle keyed by schema id.

use std::collections::HashMap;

use serde_json::Value;

use crate::{
  collection::{Collection, parse_record},
  records::{Follows, Identities, Likes, Posts},
};

/// Decides whether a raw payload conforms to a named schema.
///
/// Implementations must be pure: the same `(schema_id, payload)` always
/// yields the same answer.
pub trait SchemaOracle: Send + Sync {
  fn validate(&self, schema_id: &str, payload: &Value) -> bool;
}

type Validator = fn(&Value) -> bool;

/// Oracle backed by the typed record definitions in [`crate::records`].
///
/// A payload is valid for a collection's schema when it deserialises into
/// the collection's record type and passes its well-formedness check.
/// Unknown schema ids never validate.
#[derive(Clone, Default)]
pub struct SchemaSet {
  validators: HashMap<&'static str, Validator>,
}

impl SchemaSet {
  pub fn new() -> Self { Self::default() }

  /// Schemas for every collection this crate defines.
  pub fn builtin() -> Self {
    Self::new()
      .with::<Identities>()
      .with::<Posts>()
      .with::<Likes>()
      .with::<Follows>()
  }

  pub fn with<C: Collection>(mut self) -> Self {
    self.register::<C>();
    self
  }

  pub fn register<C: Collection>(&mut self) {
    self
      .validators
      .insert(C::SCHEMA_ID, |payload| parse_record::<C>(payload).is_some());
  }

  pub fn contains(&self, schema_id: &str) -> bool {
    self.validators.contains_key(schema_id)
  }
}

impl SchemaOracle for SchemaSet {
  fn validate(&self, schema_id: &str, payload: &Value) -> bool {
    self
      .validators
      .get(schema_id)
      .is_some_and(|validate| validate(payload))
  }
}
