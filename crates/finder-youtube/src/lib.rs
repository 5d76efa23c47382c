//! Typed client for the YouTube Data API v3.
//!
//! Covers the four operations the pipeline needs: channel lookup (by id,
//! legacy username, handle or custom URL), free-text channel search as a
//! fallback, playlist-items listing for recent uploads, and authenticated
//! subscription listing for the import flow.
//!
//! Every request carries a `Referer` header from configuration — the
//! service runs with referer-restricted API keys — and either the API key
//! (public path) or a caller-supplied bearer token (subscription import).

pub mod error;
pub mod types;

pub use error::{Error, Result, quota_signalled};

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use finder_core::resolve::{ChannelRef, LookupKind};
use types::{
  ApiErrorBody, ChannelListResponse, PlaylistItemsResponse, SearchListResponse,
  SubscriptionListResponse,
};

/// Default API root; overridable for self-hosted proxies and tests.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Upstream page-size ceiling for list calls.
pub const MAX_PAGE_SIZE: u32 = 50;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Connection settings for the YouTube Data API.
#[derive(Debug, Clone)]
pub struct YoutubeConfig {
  pub api_key:  String,
  /// Sent as the `Referer` header on every request.
  pub origin:   String,
  pub api_base: String,
}

impl YoutubeConfig {
  pub fn new(api_key: impl Into<String>, origin: impl Into<String>) -> Self {
    Self {
      api_key:  api_key.into(),
      origin:   origin.into(),
      api_base: DEFAULT_API_BASE.to_string(),
    }
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// A resolved channel: display name plus the uploads-playlist reference.
///
/// `uploads_playlist` is `None` for channels without public videos; that is
/// a success, not a failure — enrichment simply finds no links.
#[derive(Debug, Clone)]
pub struct ChannelIdentity {
  pub channel_id:       String,
  pub name:             String,
  pub uploads_playlist: Option<String>,
}

/// One page of the caller's subscriptions, mapped to addable handles.
#[derive(Debug, Clone)]
pub struct SubscriptionsPage {
  pub handles:         Vec<String>,
  pub next_page_token: Option<String>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async client for the YouTube Data API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct YoutubeClient {
  client: reqwest::Client,
  config: YoutubeConfig,
}

impl YoutubeClient {
  pub fn new(config: YoutubeConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
  }

  async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, &str)],
    bearer: Option<&str>,
  ) -> Result<T> {
    let mut req = self
      .client
      .get(self.url(path))
      .header(reqwest::header::REFERER, &self.config.origin)
      .query(query);

    req = match bearer {
      Some(token) => req.bearer_auth(token),
      None        => req.query(&[("key", self.config.api_key.as_str())]),
    };

    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(classify_failure(status.as_u16(), &body));
    }
    Ok(resp.json().await?)
  }

  // ── Channel resolution ──────────────────────────────────────────────────

  /// Resolve a lookup request to a channel identity.
  ///
  /// On an empty primary result the fallback runs as an explicit two-step
  /// sequence — free-text channel search, then one lookup by the found id —
  /// so the single-shot bound is structural, not convention. Lookups by id
  /// never fall back (the search could only return the same id).
  pub async fn resolve_channel(&self, re: &ChannelRef) -> Result<ChannelIdentity> {
    if let Some(identity) = self.lookup_channel(re).await? {
      return Ok(identity);
    }

    if re.kind != LookupKind::Id {
      debug!(value = %re.value, "channel lookup empty, trying search fallback");
      if let Some(channel_id) = self.search_channel(&re.value).await? {
        let by_id = ChannelRef { kind: LookupKind::Id, value: channel_id };
        if let Some(identity) = self.lookup_channel(&by_id).await? {
          return Ok(identity);
        }
      }
    }

    Err(Error::ChannelNotFound(re.value.clone()))
  }

  /// `GET /channels` keyed by the lookup kind. `None` on an empty result.
  async fn lookup_channel(&self, re: &ChannelRef) -> Result<Option<ChannelIdentity>> {
    let resp: ChannelListResponse = self
      .get_json(
        "/channels",
        &[
          ("part", "snippet,contentDetails"),
          (lookup_param(re.kind), re.value.as_str()),
        ],
        None,
      )
      .await?;

    Ok(resp.items.into_iter().next().map(|item| ChannelIdentity {
      channel_id:       item.id,
      name:             item.snippet.title,
      uploads_playlist: item
        .content_details
        .and_then(|cd| cd.related_playlists)
        .and_then(|rp| rp.uploads),
    }))
  }

  /// `GET /search?type=channel` — first matching channel id, if any.
  async fn search_channel(&self, query: &str) -> Result<Option<String>> {
    let resp: SearchListResponse = self
      .get_json(
        "/search",
        &[("part", "snippet"), ("type", "channel"), ("q", query)],
        None,
      )
      .await?;

    Ok(
      resp
        .items
        .into_iter()
        .next()
        .and_then(|item| item.snippet.channel_id),
    )
  }

  // ── Uploads ─────────────────────────────────────────────────────────────

  /// Descriptions of one page of recent uploads, most-recent-first.
  pub async fn recent_uploads(
    &self,
    playlist_id: &str,
    max_results: u32,
  ) -> Result<Vec<String>> {
    let max = max_results.min(MAX_PAGE_SIZE).to_string();
    let resp: PlaylistItemsResponse = self
      .get_json(
        "/playlistItems",
        &[
          ("part", "snippet"),
          ("playlistId", playlist_id),
          ("maxResults", max.as_str()),
        ],
        None,
      )
      .await?;

    Ok(
      resp
        .items
        .into_iter()
        .map(|item| item.snippet.description)
        .collect(),
    )
  }

  // ── Subscription import ─────────────────────────────────────────────────

  /// One page of the caller's subscriptions, mapped to addable handles
  /// (custom URL when the channel has one, otherwise the raw channel id).
  pub async fn subscriptions(
    &self,
    access_token: &str,
    page_token: Option<&str>,
  ) -> Result<SubscriptionsPage> {
    let mut query = vec![
      ("part", "snippet"),
      ("mine", "true"),
      ("maxResults", "50"),
    ];
    if let Some(token) = page_token {
      query.push(("pageToken", token));
    }

    let resp: SubscriptionListResponse = self
      .get_json("/subscriptions", &query, Some(access_token))
      .await?;
    let next_page_token = resp.next_page_token;

    let channel_ids: Vec<String> = resp
      .items
      .into_iter()
      .map(|item| item.snippet.resource_id.channel_id)
      .collect();
    if channel_ids.is_empty() {
      return Ok(SubscriptionsPage { handles: Vec::new(), next_page_token });
    }

    // Batched lookup: one /channels call maps ids to handles.
    let joined = channel_ids.join(",");
    let channels: ChannelListResponse = self
      .get_json(
        "/channels",
        &[("part", "snippet"), ("id", joined.as_str())],
        Some(access_token),
      )
      .await?;

    let handles = channels
      .items
      .into_iter()
      .map(|item| item.snippet.custom_url.unwrap_or(item.id))
      .collect();

    Ok(SubscriptionsPage { handles, next_page_token })
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// The `/channels` query parameter a lookup kind dispatches to.
fn lookup_param(kind: LookupKind) -> &'static str {
  match kind {
    LookupKind::Id                               => "id",
    LookupKind::LegacyUsername                   => "forUsername",
    LookupKind::Handle | LookupKind::CustomUrl   => "forHandle",
  }
}

/// Classify a non-2xx upstream response.
fn classify_failure(status: u16, body: &str) -> Error {
  let detail: Option<ApiErrorBody> = serde_json::from_str(body).ok();
  let (message, reason) = match &detail {
    Some(b) => (
      b.error.message.clone(),
      b.error.errors.first().and_then(|e| e.reason.as_deref()),
    ),
    None => (body.trim().to_string(), None),
  };

  if quota_signalled(reason, &message) {
    Error::QuotaExceeded(message)
  } else {
    Error::Api { status, message }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
