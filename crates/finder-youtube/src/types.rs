//! Serde mappings for the YouTube Data API v3 response shapes we consume.

use serde::Deserialize;

// ─── Error payload ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
  pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
  pub message: String,
  #[serde(default)]
  pub errors:  Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorItem {
  pub reason: Option<String>,
}

// ─── channels.list ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChannelListResponse {
  #[serde(default)]
  pub items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelItem {
  pub id:      String,
  pub snippet: ChannelSnippet,
  #[serde(rename = "contentDetails")]
  pub content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelSnippet {
  pub title: String,
  #[serde(rename = "customUrl")]
  pub custom_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentDetails {
  #[serde(rename = "relatedPlaylists")]
  pub related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Deserialize)]
pub struct RelatedPlaylists {
  pub uploads: Option<String>,
}

// ─── search.list ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchListResponse {
  #[serde(default)]
  pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
  pub snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
pub struct SearchSnippet {
  #[serde(rename = "channelId")]
  pub channel_id: Option<String>,
}

// ─── playlistItems.list ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PlaylistItemsResponse {
  #[serde(default)]
  pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
  pub snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItemSnippet {
  #[serde(default)]
  pub description: String,
}

// ─── subscriptions.list ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubscriptionListResponse {
  #[serde(default)]
  pub items: Vec<SubscriptionItem>,
  #[serde(rename = "nextPageToken")]
  pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionItem {
  pub snippet: SubscriptionSnippet,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionSnippet {
  #[serde(rename = "resourceId")]
  pub resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
pub struct ResourceId {
  #[serde(rename = "channelId")]
  pub channel_id: String,
}
