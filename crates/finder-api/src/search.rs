//! Handler for `GET /search/{query}`.
//!
//! LIKE search over creator names, handles and URLs, scoped to the caller's
//! subscription cookie when one is present. Paginated by the configured
//! page size; an exactly-full page sets `has_next_page`.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::HeaderMap,
};
use finder_core::{
  model::CreatorHit,
  store::{CreatorStore, SearchQuery},
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, cookie, error::ApiError};

const MAX_QUERY_LEN: usize = 255;

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// One-based page index.
  pub page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
  pub results:       Vec<CreatorHit>,
  pub page:          usize,
  pub has_next_page: bool,
}

/// `GET /search/{query}[?page=N]`
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  headers: HeaderMap,
  Path(query): Path<String>,
  Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError>
where
  S: CreatorStore + 'static,
{
  if query.len() > MAX_QUERY_LEN {
    return Err(ApiError::BadRequest("search query too long".to_string()));
  }
  let page = params.page.unwrap_or(1);
  if page < 1 {
    return Err(ApiError::BadRequest("page must be at least 1".to_string()));
  }

  let token = cookie::subscription_token(&headers);
  let results = state
    .store
    .search(&SearchQuery {
      text:         query.clone(),
      within_links: token.ids(),
      limit:        state.page_size,
      offset:       (page - 1) * state.page_size,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  if results.is_empty() {
    let mut message = format!("no creators matching {query:?}");
    if !token.is_empty() {
      message.push_str(" (subscribed only, clear cookies to search all)");
    }
    return Err(ApiError::NotFound(message));
  }

  let has_next_page = results.len() == state.page_size;
  Ok(Json(SearchResponse { results, page, has_next_page }))
}
