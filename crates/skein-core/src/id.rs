//! Identifiers consumed from the content-addressed repository.
//!
//! Both types are validated on parse and display back to exactly the string
//! they were parsed from, so they can be stored as plain text columns and
//! reconstructed without loss.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

// ─── Did ─────────────────────────────────────────────────────────────────────

/// A decentralised identifier of the form `did:<method>:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Did(String);

impl Did {
  pub fn as_str(&self) -> &str { &self.0 }

  /// The method segment, e.g. `example` in `did:example:alice`.
  pub fn method(&self) -> &str {
    self.0["did:".len()..]
      .split_once(':')
      .map(|(method, _)| method)
      .unwrap_or_default()
  }
}

fn is_valid_did(s: &str) -> bool {
  let Some(rest) = s.strip_prefix("did:") else {
    return false;
  };
  let Some((method, id)) = rest.split_once(':') else {
    return false;
  };
  !method.is_empty()
    && method
      .bytes()
      .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    && !id.is_empty()
    && !id.contains('/')
    && !id.chars().any(char::is_whitespace)
}

impl FromStr for Did {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    if is_valid_did(s) {
      Ok(Self(s.to_owned()))
    } else {
      Err(Error::InvalidDid(s.to_owned()))
    }
  }
}

impl fmt::Display for Did {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl Serialize for Did {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&self.0)
  }
}

impl<'de> Deserialize<'de> for Did {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let s = String::deserialize(d)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

// ─── RecordUri ───────────────────────────────────────────────────────────────

/// Identity of one record: `<owner did>/<collection>/<record key>`.
///
/// The collection may span several segments (`bsky/posts`); the owner is
/// always the first segment and the record key always the last.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordUri {
  owner:      Did,
  collection: String,
  record_key: String,
}

impl RecordUri {
  pub fn new(
    owner: Did,
    collection: impl Into<String>,
    record_key: impl Into<String>,
  ) -> Result<Self> {
    let uri = Self {
      owner,
      collection: collection.into(),
      record_key: record_key.into(),
    };
    // Re-parse so hand-built URIs obey the same rules as parsed ones.
    let text = uri.to_string();
    text.parse()
  }

  /// The identity that owns the record; authorship is always derived from
  /// here and never from the record body.
  pub fn owner(&self) -> &Did { &self.owner }

  pub fn collection(&self) -> &str { &self.collection }

  pub fn record_key(&self) -> &str { &self.record_key }

  /// First segment of the collection (`bsky` for `bsky/posts`).
  pub fn namespace(&self) -> &str {
    self
      .collection
      .split_once('/')
      .map_or(self.collection.as_str(), |(ns, _)| ns)
  }
}

impl FromStr for RecordUri {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = |reason| Error::InvalidUri {
      uri: s.to_owned(),
      reason,
    };

    let (owner, rest) = s
      .split_once('/')
      .ok_or_else(|| invalid("missing collection"))?;
    let (collection, record_key) = rest
      .rsplit_once('/')
      .ok_or_else(|| invalid("missing record key"))?;

    if record_key.is_empty() {
      return Err(invalid("empty record key"));
    }
    if collection.is_empty() || collection.split('/').any(str::is_empty) {
      return Err(invalid("empty collection segment"));
    }
    if s.chars().any(char::is_whitespace) {
      return Err(invalid("contains whitespace"));
    }
    let owner = owner.parse().map_err(|_| invalid("owner is not a did"))?;

    Ok(Self {
      owner,
      collection: collection.to_owned(),
      record_key: record_key.to_owned(),
    })
  }
}

impl fmt::Display for RecordUri {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}/{}", self.owner, self.collection, self.record_key)
  }
}

impl Serialize for RecordUri {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for RecordUri {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let s = String::deserialize(d)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}
