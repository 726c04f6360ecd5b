//! Plugin and dispatcher tests against an in-memory fake row store.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use serde_json::{Value, json};

use crate::{
  Error, Result,
  collection::Collection,
  dispatch::{Dispatcher, Operation, Outcome},
  id::RecordUri,
  oracle::{SchemaOracle, SchemaSet},
  plugin::{IndexPlugin, RecordPlugin},
  records::{Follows, Identities, Likes, Posts},
  store::RowStore,
};

// ─── Fake store ──────────────────────────────────────────────────────────────

struct MemoryRows<C: Collection> {
  rows:      Mutex<HashMap<String, C::Row>>,
  calls:     AtomicUsize,
  fail_next: AtomicBool,
}

impl<C: Collection> MemoryRows<C> {
  fn new() -> Self {
    Self {
      rows:      Mutex::new(HashMap::new()),
      calls:     AtomicUsize::new(0),
      fail_next: AtomicBool::new(false),
    }
  }

  fn len(&self) -> usize { self.rows.lock().unwrap().len() }

  fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

  fn touch(&self) -> Result<()> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_next.swap(false, Ordering::SeqCst) {
      return Err(Error::Storage("connection reset".into()));
    }
    Ok(())
  }
}

impl<C: Collection> RowStore<C> for MemoryRows<C> {
  async fn upsert(&self, uri: &RecordUri, row: C::Row) -> Result<()> {
    self.touch()?;
    self.rows.lock().unwrap().insert(uri.to_string(), row);
    Ok(())
  }

  async fn fetch(&self, uri: &RecordUri) -> Result<Option<C::Row>> {
    self.touch()?;
    Ok(self.rows.lock().unwrap().get(&uri.to_string()).cloned())
  }

  async fn remove(&self, uri: &RecordUri) -> Result<()> {
    self.touch()?;
    self.rows.lock().unwrap().remove(&uri.to_string());
    Ok(())
  }
}

/// Accepts nothing, whatever the payload.
struct RejectAll;

impl SchemaOracle for RejectAll {
  fn validate(&self, _schema_id: &str, _payload: &Value) -> bool { false }
}

fn oracle() -> Arc<dyn SchemaOracle> { Arc::new(SchemaSet::builtin()) }

fn plugin<C: Collection>() -> IndexPlugin<C, MemoryRows<C>> {
  IndexPlugin::new(MemoryRows::new(), oracle())
}

fn uri(s: &str) -> RecordUri { s.parse().unwrap() }

fn dispatcher() -> Dispatcher {
  Dispatcher::new()
    .with(Arc::new(plugin::<Identities>()))
    .and_then(|d| d.with(Arc::new(plugin::<Posts>())))
    .and_then(|d| d.with(Arc::new(plugin::<Likes>())))
    .and_then(|d| d.with(Arc::new(plugin::<Follows>())))
    .unwrap()
}

// ─── Plugin contract ─────────────────────────────────────────────────────────

#[tokio::test]
async fn set_then_get_reproduces_the_post() {
  let posts = plugin::<Posts>();
  let at = uri("did:example:alice/bsky/posts/3");
  let payload = json!({ "text": "hello", "createdAt": "2024-01-01T00:00:00Z" });

  posts.set(&at, payload.clone()).await.unwrap();

  let fetched = posts.get(&at).await.unwrap();
  assert_eq!(fetched, Some(payload));

  let record = posts.get_record(&at).await.unwrap().unwrap();
  assert_eq!(record.text, "hello");
  assert_eq!(record.created_at, "2024-01-01T00:00:00Z");
  assert_eq!(record.reply, None);
}

#[tokio::test]
async fn invalid_payload_is_rejected_before_storage() {
  let posts = plugin::<Posts>();
  let at = uri("did:example:alice/bsky/posts/3");

  let err = posts
    .set(&at, json!({ "text": 42, "createdAt": "2024-01-01T00:00:00Z" }))
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    Error::SchemaViolation { schema_id: "blueskyweb.xyz:Post", .. }
  ));
  assert_eq!(posts.store().calls(), 0);
  assert_eq!(posts.get(&at).await.unwrap(), None);
}

#[tokio::test]
async fn oracle_has_the_final_say() {
  let posts = IndexPlugin::<Posts, _>::new(MemoryRows::new(), Arc::new(RejectAll));
  let payload = json!({ "text": "hello", "createdAt": "2024-01-01T00:00:00Z" });

  assert!(!posts.is_valid_schema(&payload));
  let err = posts
    .set(&uri("did:example:alice/bsky/posts/3"), payload)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SchemaViolation { .. }));
  assert_eq!(posts.store().len(), 0);
}

#[tokio::test]
async fn is_valid_schema_is_pure() {
  let posts = plugin::<Posts>();
  let good = json!({ "text": "hello", "createdAt": "2024-01-01T00:00:00Z" });
  let bad = json!({ "text": "hello" });

  for _ in 0..2 {
    assert!(posts.is_valid_schema(&good));
    assert!(!posts.is_valid_schema(&bad));
  }
  assert_eq!(posts.store().calls(), 0);
}

#[tokio::test]
async fn get_of_missing_row_is_none() {
  let likes = plugin::<Likes>();
  assert_eq!(likes.get(&uri("did:example:bob/bsky/likes/1")).await.unwrap(), None);
}

#[tokio::test]
async fn delete_of_missing_row_is_a_no_op() {
  let follows = plugin::<Follows>();
  follows
    .delete(&uri("did:example:bob/bsky/follows/1"))
    .await
    .unwrap();
  assert_eq!(follows.store().len(), 0);
}

#[tokio::test]
async fn repeated_set_is_idempotent() {
  let posts = plugin::<Posts>();
  let at = uri("did:example:alice/bsky/posts/3");
  let payload = json!({ "text": "hello", "createdAt": "2024-01-01T00:00:00Z" });

  posts.set(&at, payload.clone()).await.unwrap();
  posts.set(&at, payload.clone()).await.unwrap();

  assert_eq!(posts.store().len(), 1);
  assert_eq!(posts.get(&at).await.unwrap(), Some(payload));
}

#[tokio::test]
async fn set_replaces_rather_than_patches() {
  let posts = plugin::<Posts>();
  let at = uri("did:example:alice/bsky/posts/3");

  posts
    .set(
      &at,
      json!({
        "text": "first",
        "reply": {
          "root": "did:example:bob/bsky/posts/1",
          "parent": "did:example:bob/bsky/posts/1",
        },
        "createdAt": "2024-01-01T00:00:00Z",
      }),
    )
    .await
    .unwrap();
  posts
    .set(&at, json!({ "text": "second", "createdAt": "2024-01-02T00:00:00Z" }))
    .await
    .unwrap();

  let record = posts.get_record(&at).await.unwrap().unwrap();
  assert_eq!(record.text, "second");
  assert_eq!(record.reply, None);
}

#[tokio::test]
async fn uri_must_belong_to_the_plugin_collection() {
  let posts = plugin::<Posts>();
  let err = posts
    .set(
      &uri("did:example:alice/bsky/likes/3"),
      json!({ "text": "hello", "createdAt": "2024-01-01T00:00:00Z" }),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CollectionMismatch { expected: "bsky/posts", .. }));
}

#[tokio::test]
async fn self_follow_is_a_schema_violation() {
  let follows = plugin::<Follows>();
  let err = follows
    .set(
      &uri("did:example:alice/bsky/follows/1"),
      json!({ "subject": "did:example:alice", "createdAt": "2024-01-01T00:00:00Z" }),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SchemaViolation { .. }));
  assert_eq!(follows.store().len(), 0);
}

#[tokio::test]
async fn storage_errors_keep_their_kind() {
  let posts = plugin::<Posts>();
  posts.store().fail_next.store(true, Ordering::SeqCst);

  let err = posts
    .set(
      &uri("did:example:alice/bsky/posts/3"),
      json!({ "text": "hello", "createdAt": "2024-01-01T00:00:00Z" }),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Storage(_)));
  assert!(err.is_transient());
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

#[test]
fn duplicate_collection_is_a_configuration_error() {
  let mut d = Dispatcher::new();
  d.register(Arc::new(plugin::<Posts>())).unwrap();

  let err = d.register(Arc::new(plugin::<Posts>())).unwrap_err();
  assert!(matches!(err, Error::DuplicateCollection(ref c) if c == "bsky/posts"));
}

#[test]
fn collections_are_listed_sorted() {
  assert_eq!(
    dispatcher().collections(),
    ["bsky/follows", "bsky/identity", "bsky/likes", "bsky/posts"]
  );
}

#[test]
fn plugins_are_found_by_table() {
  let d = dispatcher();
  assert_eq!(d.plugin_for_table("user_dids").unwrap().collection(), "bsky/identity");
  assert_eq!(d.plugin_for_table("likes").unwrap().collection(), "bsky/likes");
  assert!(d.plugin_for_table("repo_roots").is_none());
}

#[tokio::test]
async fn unknown_collection_is_reported() {
  let d = dispatcher();
  let err = d
    .dispatch(
      "bsky/reposts",
      Operation::Get(uri("did:example:alice/bsky/reposts/1")),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UnknownCollection(ref c) if c == "bsky/reposts"));

  let err = d
    .set(&uri("did:example:alice/bsky/reposts/1"), json!({}))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UnknownCollection(_)));
}

#[tokio::test]
async fn dispatch_routes_each_operation() {
  let d = dispatcher();
  let at = uri("did:example:alice/bsky/identity/self");

  let outcome = d
    .dispatch(
      "bsky/identity",
      Operation::Set(at.clone(), json!({ "username": "alice" })),
    )
    .await
    .unwrap();
  assert_eq!(outcome, Outcome::Written);

  let outcome = d.apply(Operation::Get(at.clone())).await.unwrap();
  assert_eq!(outcome, Outcome::Fetched(Some(json!({ "username": "alice" }))));

  let outcome = d.apply(Operation::Delete(at.clone())).await.unwrap();
  assert_eq!(outcome, Outcome::Deleted);

  assert_eq!(d.get(&at).await.unwrap(), None);
}

#[tokio::test]
async fn dispatch_to_the_wrong_collection_is_rejected() {
  let d = dispatcher();
  let err = d
    .dispatch(
      "bsky/posts",
      Operation::Set(
        uri("did:example:alice/bsky/identity/self"),
        json!({ "username": "alice" }),
      ),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CollectionMismatch { .. }));
}
