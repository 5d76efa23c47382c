//! Handler for `GET /import`.
//!
//! Pulls one page of the caller's YouTube subscriptions and feeds the
//! resulting handles through the ingestion orchestrator. The caller drives
//! pagination by echoing `next_page_token` back as `?page_token=`.
//!
//! The OAuth access token is an input: `Authorization: Bearer ...` first,
//! `access_token` cookie as a fallback. Token acquisition is not this
//! service's concern.

use axum::{
  Json,
  extract::{Query, State},
  http::{HeaderMap, header},
  response::{AppendHeaders, IntoResponse},
};
use finder_core::store::CreatorStore;
use finder_ingest::ingest_handles;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{ApiState, cookie, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct ImportParams {
  pub page_token: Option<String>,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
  let from_header = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::to_string);
  from_header.or_else(|| cookie::read(headers, cookie::ACCESS_TOKEN))
}

/// `GET /import[?page_token=...]`
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  headers: HeaderMap,
  Query(params): Query<ImportParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CreatorStore + 'static,
{
  let access_token = bearer_token(&headers).ok_or_else(|| {
    ApiError::Unauthorized("missing YouTube access token".to_string())
  })?;

  let page = state
    .youtube
    .subscriptions(&access_token, params.page_token.as_deref())
    .await
    .map_err(|e| match e {
      finder_youtube::Error::QuotaExceeded(m) => ApiError::QuotaRetry(m),
      other => ApiError::Upstream(other.to_string()),
    })?;

  let report = ingest_handles(state.store.as_ref(), &state.queue, &page.handles).await;
  info!(
    handles = page.handles.len(),
    added = report.link_ids.len(),
    failed = report.errors.len(),
    "subscription page imported"
  );

  let mut token = cookie::subscription_token(&headers);
  token.merge(report.link_ids.iter().copied());

  Ok((
    AppendHeaders([(header::SET_COOKIE, cookie::subscription_set_cookie(&token))]),
    Json(json!({
      "processed":       report.link_ids.len(),
      "failed":          report.errors.len(),
      "next_page_token": page.next_page_token,
    })),
  ))
}
