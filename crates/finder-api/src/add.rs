//! Handler for `POST /add`.
//!
//! Accepts one raw handle or channel URL, runs the ingestion orchestrator,
//! and merges the touched link ids into the caller's subscription cookie.
//! The response acknowledges queueing only — enrichment happens later.

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, header},
  response::{AppendHeaders, IntoResponse},
};
use finder_core::store::CreatorStore;
use finder_ingest::ingest_handles;
use serde::Deserialize;
use serde_json::json;

use crate::{ApiState, cookie, error::ApiError};

const MAX_HANDLE_LEN: usize = 255;

#[derive(Debug, Deserialize)]
pub struct AddBody {
  pub handle: String,
}

/// Either an `http(s)` URL, or a bare handle in a conservative charset.
fn acceptable_input(input: &str) -> bool {
  if input.is_empty() || input.len() > MAX_HANDLE_LEN {
    return false;
  }
  if input.starts_with("http://") || input.starts_with("https://") {
    return true;
  }
  input
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '_' | '.' | '-'))
}

/// `POST /add` — body: `{"handle":"@somecreator"}`
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  headers: HeaderMap,
  Json(body): Json<AddBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CreatorStore + 'static,
{
  let handle = body.handle.trim().to_string();
  if !acceptable_input(&handle) {
    return Err(ApiError::BadRequest(format!(
      "not a usable handle or channel URL: {handle:?}"
    )));
  }

  let report = ingest_handles(state.store.as_ref(), &state.queue, &[handle]).await;
  if !report.success() {
    return Err(ApiError::Ingest(report.joined_errors()));
  }

  let mut token = cookie::subscription_token(&headers);
  token.merge(report.link_ids.iter().copied());

  Ok((
    AppendHeaders([(header::SET_COOKIE, cookie::subscription_set_cookie(&token))]),
    Json(json!({
      "message":  "channel accepted, enrichment queued",
      "link_ids": report.link_ids,
    })),
  ))
}
