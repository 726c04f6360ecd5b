//! `bsky/identity`: the username an identity has claimed.
//!
//! Each identity has at most one identity record, always at record key
//! [`IDENTITY_KEY`]. Its row is the `user_dids` entry every other table
//! references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, collection::Collection, id::RecordUri};

/// The only record key an identity record may live at.
pub const IDENTITY_KEY: &str = "self";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
  pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentityRow {
  pub did:      String,
  pub username: String,
}

pub struct Identities;

impl Collection for Identities {
  const NAME: &'static str = "bsky/identity";
  const SCHEMA_ID: &'static str = "blueskyweb.xyz:Identity";
  const TABLE: &'static str = "user_dids";

  type Record = UserIdentity;
  type Row = UserIdentityRow;

  fn is_well_formed(record: &UserIdentity) -> bool {
    !record.username.is_empty()
      && !record.username.chars().any(|c| c.is_whitespace() || c.is_control())
  }

  fn admit(uri: &RecordUri, _record: &UserIdentity) -> Result<(), String> {
    if uri.record_key() != IDENTITY_KEY {
      return Err(format!(
        "identity records live at {IDENTITY_KEY:?}, not {:?}",
        uri.record_key()
      ));
    }
    Ok(())
  }

  fn to_row(
    uri: &RecordUri,
    record: &UserIdentity,
    _indexed_at: DateTime<Utc>,
  ) -> UserIdentityRow {
    UserIdentityRow {
      did:      uri.owner().to_string(),
      username: record.username.clone(),
    }
  }

  fn translate_db_obj(row: &UserIdentityRow) -> Result<UserIdentity> {
    Ok(UserIdentity {
      username: row.username.clone(),
    })
  }
}
