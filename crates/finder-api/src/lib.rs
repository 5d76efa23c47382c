//! JSON REST API for the creator finder.
//!
//! Exposes an axum [`Router`] backed by any [`finder_core::store::CreatorStore`].
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", finder_api::api_router(state))
//! ```

pub mod add;
pub mod cookie;
pub mod error;
pub mod import;
pub mod search;
pub mod subscriptions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use finder_core::store::CreatorStore;
use finder_ingest::JobQueue;
use finder_youtube::YoutubeClient;

pub use error::ApiError;

/// Everything the handlers need, shared by cloning.
pub struct ApiState<S> {
  pub store:     Arc<S>,
  pub queue:     JobQueue,
  pub youtube:   YoutubeClient,
  /// Search results per page.
  pub page_size: usize,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      queue:     self.queue.clone(),
      youtube:   self.youtube.clone(),
      page_size: self.page_size,
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: CreatorStore + 'static,
{
  Router::new()
    .route("/add", post(add::handler::<S>))
    .route("/search/{query}", get(search::handler::<S>))
    .route("/subscriptions", get(subscriptions::handler::<S>))
    .route("/import", get(import::handler::<S>))
    .with_state(state)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use finder_core::store::CreatorStore as _;
  use finder_store_sqlite::SqliteStore;
  use finder_youtube::YoutubeConfig;
  use tower::ServiceExt;

  use super::*;

  async fn make_state(page_size: usize) -> ApiState<SqliteStore> {
    let store = Arc::new(SqliteStore::open_in_memory().await.expect("store"));
    let youtube = YoutubeClient::new(YoutubeConfig::new(
      "test-key",
      "http://localhost",
    ))
    .expect("client");
    ApiState { store, queue: JobQueue::new(), youtube, page_size }
  }

  async fn oneshot_raw(
    state:   ApiState<SqliteStore>,
    method:  &str,
    uri:     &str,
    headers: Vec<(header::HeaderName, &str)>,
    body:    &str,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    api_router(state).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  /// Seed a fully-enriched creator with one primary and one secondary link;
  /// returns the primary link id.
  async fn seed_creator(store: &SqliteStore, name: &str, handle: &str) -> i64 {
    let creator_id = store.get_or_create_creator(name).await.unwrap();
    let primary = format!("https://www.youtube.com/{handle}");
    let link_id = store
      .insert_or_link_url(Some(creator_id), &primary, Some(handle), "YouTube")
      .await
      .unwrap();
    store
      .insert_or_link_url(
        Some(creator_id),
        &format!("https://www.patreon.com/{name}"),
        None,
        &primary,
      )
      .await
      .unwrap();
    link_id
  }

  // ── POST /add ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn add_accepts_a_handle_and_sets_the_cookie() {
    let state = make_state(20).await;
    let resp  = oneshot_raw(
      state.clone(),
      "POST",
      "/add",
      vec![(header::CONTENT_TYPE, "application/json")],
      r#"{"handle":"@somecreator"}"#,
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let set_cookie = resp
      .headers()
      .get(header::SET_COOKIE)
      .unwrap()
      .to_str()
      .unwrap()
      .to_string();
    assert!(set_cookie.starts_with("subscribed_links="), "{set_cookie}");

    let json = body_json(resp).await;
    assert_eq!(json["link_ids"].as_array().unwrap().len(), 1);
    // The request path only queued the work.
    assert_eq!(state.queue.len().await, 1);
  }

  #[tokio::test]
  async fn add_merges_into_an_existing_cookie() {
    let state = make_state(20).await;
    let resp  = oneshot_raw(
      state,
      "POST",
      "/add",
      vec![
        (header::CONTENT_TYPE, "application/json"),
        (header::COOKIE, "subscribed_links=90,91"),
      ],
      r#"{"handle":"@somecreator"}"#,
    )
    .await;

    let set_cookie = resp
      .headers()
      .get(header::SET_COOKIE)
      .unwrap()
      .to_str()
      .unwrap();
    // Fresh id 1 joins the previously-subscribed ids.
    assert!(set_cookie.starts_with("subscribed_links=1,90,91;"), "{set_cookie}");
  }

  #[tokio::test]
  async fn add_rejects_disallowed_characters() {
    let state = make_state(20).await;
    let resp  = oneshot_raw(
      state,
      "POST",
      "/add",
      vec![(header::CONTENT_TYPE, "application/json")],
      r#"{"handle":"no spaces allowed"}"#,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn add_surfaces_ingestion_failure() {
    let state = make_state(20).await;
    let resp  = oneshot_raw(
      state.clone(),
      "POST",
      "/add",
      vec![(header::CONTENT_TYPE, "application/json")],
      r#"{"handle":"https://example.com/not-youtube"}"#,
    )
    .await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(state.queue.len().await, 0);
  }

  // ── GET /search ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn search_finds_seeded_creators() {
    let state = make_state(20).await;
    seed_creator(&state.store, "Alice", "@alice").await;
    seed_creator(&state.store, "Bob", "@bob").await;

    let resp = oneshot_raw(state, "GET", "/search/alice", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 2); // primary + patreon
    assert!(results.iter().all(|hit| hit["name"] == "Alice"));
    assert_eq!(json["has_next_page"], false);
  }

  #[tokio::test]
  async fn search_is_scoped_by_the_subscription_cookie() {
    let state = make_state(20).await;
    let alice_link = seed_creator(&state.store, "Alice", "@alice").await;
    seed_creator(&state.store, "Alicia", "@alicia").await;

    let cookie = format!("subscribed_links={alice_link}");
    let resp = oneshot_raw(
      state,
      "GET",
      "/search/ali",
      vec![(header::COOKIE, cookie.as_str())],
      "",
    )
    .await;

    let json = body_json(resp).await;
    let results = json["results"].as_array().unwrap();
    assert!(results.iter().all(|hit| hit["name"] == "Alice"), "{json}");
  }

  #[tokio::test]
  async fn search_with_no_matches_is_404() {
    let state = make_state(20).await;
    seed_creator(&state.store, "Alice", "@alice").await;

    let resp = oneshot_raw(state, "GET", "/search/zzz", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn search_paginates_by_the_configured_page_size() {
    let state = make_state(2).await;
    for n in 0..3 {
      seed_creator(&state.store, &format!("Creator{n}"), &format!("@creator{n}")).await;
    }

    // Each creator contributes two matching links, so six hits in total.
    let first = body_json(
      oneshot_raw(state.clone(), "GET", "/search/creator", vec![], "").await,
    )
    .await;
    assert_eq!(first["page"], 1);
    assert_eq!(first["results"].as_array().unwrap().len(), 2);
    assert_eq!(first["has_next_page"], true);

    let third = body_json(
      oneshot_raw(state.clone(), "GET", "/search/creator?page=3", vec![], "").await,
    )
    .await;
    assert_eq!(third["page"], 3);
    assert_eq!(third["results"].as_array().unwrap().len(), 2);

    let resp = oneshot_raw(state, "GET", "/search/creator?page=0", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── GET /subscriptions ──────────────────────────────────────────────────

  #[tokio::test]
  async fn subscriptions_without_a_cookie_is_empty() {
    let state = make_state(20).await;
    seed_creator(&state.store, "Alice", "@alice").await;

    let resp = oneshot_raw(state, "GET", "/subscriptions", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, serde_json::json!([]));
  }

  #[tokio::test]
  async fn subscriptions_groups_links_per_creator() {
    let state = make_state(20).await;
    let alice_link = seed_creator(&state.store, "Alice", "@alice").await;
    seed_creator(&state.store, "Bob", "@bob").await;

    let cookie = format!("subscribed_links={alice_link}");
    let resp = oneshot_raw(
      state,
      "GET",
      "/subscriptions",
      vec![(header::COOKIE, cookie.as_str())],
      "",
    )
    .await;

    let json = body_json(resp).await;
    let creators = json.as_array().unwrap();
    assert_eq!(creators.len(), 1);
    assert_eq!(creators[0]["name"], "Alice");
    assert_eq!(creators[0]["links"].as_array().unwrap().len(), 2);
  }

  // ── GET /import ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn import_without_a_token_is_unauthorized() {
    let state = make_state(20).await;
    let resp  = oneshot_raw(state, "GET", "/import", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }
}
