//! `bsky/follows`: a directed follow edge between two identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_timestamp, stored_did};
use crate::{Result, collection::Collection, id::{Did, RecordUri}};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
  /// The identity being followed.
  pub subject:    Did,
  pub created_at: String,
}

/// One row of the `follows` table. `(creator, target)` is the key; `uri` is
/// kept unique so the edge can be found from the record that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowRow {
  pub creator:    String,
  pub target:     String,
  pub uri:        String,
  pub created_at: String,
  pub indexed_at: DateTime<Utc>,
}

pub struct Follows;

impl Collection for Follows {
  const NAME: &'static str = "bsky/follows";
  const SCHEMA_ID: &'static str = "blueskyweb.xyz:Follow";
  const TABLE: &'static str = "follows";

  type Record = Follow;
  type Row = FollowRow;

  fn is_well_formed(record: &Follow) -> bool { is_timestamp(&record.created_at) }

  fn admit(uri: &RecordUri, record: &Follow) -> Result<(), String> {
    if uri.owner() == &record.subject {
      return Err(format!("{} cannot follow itself", record.subject));
    }
    Ok(())
  }

  fn to_row(uri: &RecordUri, record: &Follow, indexed_at: DateTime<Utc>) -> FollowRow {
    FollowRow {
      creator: uri.owner().to_string(),
      target: record.subject.to_string(),
      uri: uri.to_string(),
      created_at: record.created_at.clone(),
      indexed_at,
    }
  }

  fn translate_db_obj(row: &FollowRow) -> Result<Follow> {
    Ok(Follow {
      subject:    stored_did(Self::TABLE, &row.target)?,
      created_at: row.created_at.clone(),
    })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::collection::parse_record;

  fn uri(s: &str) -> RecordUri { s.parse().unwrap() }

  #[test]
  fn round_trip() {
    let follow = Follow {
      subject:    "did:example:bob".parse().unwrap(),
      created_at: "2024-01-01T00:00:00Z".into(),
    };
    let at = uri("did:example:alice/bsky/follows/1");
    let row = Follows::to_row(&at, &follow, Utc::now());

    assert_eq!(row.creator, "did:example:alice");
    assert_eq!(row.target, "did:example:bob");
    assert_eq!(row.uri, "did:example:alice/bsky/follows/1");
    assert_eq!(Follows::translate_db_obj(&row).unwrap(), follow);
  }

  #[test]
  fn self_follow_is_not_admitted() {
    let follow = Follow {
      subject:    "did:example:alice".parse().unwrap(),
      created_at: "2024-01-01T00:00:00Z".into(),
    };
    assert!(Follows::admit(&uri("did:example:alice/bsky/follows/1"), &follow).is_err());
    assert!(Follows::admit(&uri("did:example:bob/bsky/follows/1"), &follow).is_ok());
  }

  #[test]
  fn subject_must_be_a_did() {
    assert!(
      parse_record::<Follows>(&json!({
        "subject": "alice",
        "createdAt": "2024-01-01T00:00:00Z",
      }))
      .is_none()
    );
  }
}
