//! Handler for `GET /subscriptions`.

use axum::{Json, extract::State, http::HeaderMap};
use finder_core::{model::CreatorWithLinks, store::CreatorStore};

use crate::{ApiState, cookie, error::ApiError};

/// `GET /subscriptions` — every creator the caller's cookie reaches, each
/// grouped with all of its known links. No cookie means an empty listing.
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  headers: HeaderMap,
) -> Result<Json<Vec<CreatorWithLinks>>, ApiError>
where
  S: CreatorStore + 'static,
{
  let token = cookie::subscription_token(&headers);
  if token.is_empty() {
    return Ok(Json(Vec::new()));
  }

  let creators = state
    .store
    .creators_for_links(&token.ids())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(creators))
}
