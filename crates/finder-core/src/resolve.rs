//! Identifier resolution — free-form input to a canonical channel lookup.
//!
//! A submitted string can be a full channel URL, a bare channel id
//! (`UC...`), an `@handle`, a legacy `/user/<name>` URL, or a custom-URL
//! path segment. [`canonical_url`] normalises all of these to a canonical
//! YouTube URL; [`ChannelRef::from_url`] classifies the URL into the tagged
//! lookup request the upstream API dispatch needs. Neither has side effects.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Hostnames accepted as "the source platform" in submitted URLs.
const YOUTUBE_HOSTS: [&str; 3] = ["youtube.com", "www.youtube.com", "m.youtube.com"];

fn is_youtube_host(host: &str) -> bool {
  YOUTUBE_HOSTS.contains(&host.to_ascii_lowercase().as_str())
}

// ─── Canonical URL ───────────────────────────────────────────────────────────

/// Normalise a free-form handle or URL into a canonical channel URL.
///
/// - `http(s)` inputs must already point at the platform domain; anything
///   else is rejected.
/// - A bare channel id (`UC...`) becomes a `/channel/<id>` URL.
/// - Anything else is treated as a handle or custom name.
pub fn canonical_url(input: &str) -> Result<String> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(Error::invalid(input, "empty input"));
  }

  if trimmed.starts_with("http") {
    let url = Url::parse(trimmed)
      .map_err(|e| Error::invalid(input, format!("not a valid URL: {e}")))?;
    let host = url
      .host_str()
      .ok_or_else(|| Error::invalid(input, "URL has no host"))?;
    if !is_youtube_host(host) {
      return Err(Error::invalid(input, "not a YouTube link"));
    }
    return Ok(trimmed.to_string());
  }

  if trimmed.starts_with("UC") {
    return Ok(format!("https://www.youtube.com/channel/{trimmed}"));
  }

  Ok(format!("https://www.youtube.com/{trimmed}"))
}

// ─── Lookup request ──────────────────────────────────────────────────────────

/// Which upstream lookup parameter a [`ChannelRef`] maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
  /// `/channel/<id>` — immutable channel id.
  Id,
  /// `/user/<name>` — legacy username.
  LegacyUsername,
  /// `/@<handle>` — modern handle.
  Handle,
  /// A single bare path segment — legacy custom URL.
  CustomUrl,
}

/// A tagged channel lookup request: what to ask the upstream API for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
  pub kind:  LookupKind,
  pub value: String,
}

impl ChannelRef {
  /// Classify a canonical channel URL into a lookup request.
  pub fn from_url(link: &str) -> Result<Self> {
    let url =
      Url::parse(link).map_err(|_| Error::InvalidUrl(link.to_string()))?;
    let host = url
      .host_str()
      .ok_or_else(|| Error::InvalidUrl(link.to_string()))?;
    if !is_youtube_host(host) {
      return Err(Error::invalid(link, "not a YouTube link"));
    }

    let segments: Vec<&str> = url
      .path_segments()
      .map(|s| s.filter(|p| !p.is_empty()).collect())
      .unwrap_or_default();

    match segments.as_slice() {
      ["channel", id, ..] => Ok(Self {
        kind:  LookupKind::Id,
        value: (*id).to_string(),
      }),
      ["user", name, ..] => Ok(Self {
        kind:  LookupKind::LegacyUsername,
        value: (*name).to_string(),
      }),
      [handle, ..] if handle.starts_with('@') => Ok(Self {
        kind:  LookupKind::Handle,
        value: (*handle).to_string(),
      }),
      [custom] => Ok(Self {
        kind:  LookupKind::CustomUrl,
        value: (*custom).to_string(),
      }),
      _ => Err(Error::invalid(link, "unrecognised channel URL shape")),
    }
  }

  /// Convenience: normalise raw input and classify it in one step.
  pub fn resolve(input: &str) -> Result<Self> {
    Self::from_url(&canonical_url(input)?)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
