//! Platform-label derivation from link hostnames.
//!
//! The label is a first approximation ("patreon" for `www.patreon.com`);
//! the domain frequency ledger refines it over time, with the most recent
//! write winning as the canonical string per domain.

use url::Url;

use crate::{Error, Result};

/// The lowercased hostname of `link`.
pub fn domain_of(link: &str) -> Result<String> {
  let url = Url::parse(link).map_err(|_| Error::InvalidUrl(link.to_string()))?;
  let host = url
    .host_str()
    .ok_or_else(|| Error::InvalidUrl(link.to_string()))?;
  Ok(host.to_ascii_lowercase())
}

/// Human-readable platform label for a hostname: a leading `www.` and a
/// trailing `.com` are dropped.
pub fn platform_label(domain: &str) -> String {
  let d = domain.strip_prefix("www.").unwrap_or(domain);
  let d = d.strip_suffix(".com").unwrap_or(d);
  d.to_string()
}
