//! Minimal cookie plumbing for the subscription token.
//!
//! The token is client-held state: it arrives in the `Cookie` header, is
//! parsed into a [`SubscriptionToken`] at the boundary, and goes back out
//! through `Set-Cookie` after a mutation. Only the two names below are ever
//! touched.

use axum::http::HeaderMap;
use finder_core::token::SubscriptionToken;

/// Cookie holding the caller's subscribed link ids.
pub const SUBSCRIBED_LINKS: &str = "subscribed_links";
/// Cookie fallback for the OAuth access token on `/import`.
pub const ACCESS_TOKEN: &str = "access_token";

const ONE_YEAR_SECS: u32 = 31_536_000;

/// Read a single cookie value from the request headers.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
  let raw = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
  raw.split(';').find_map(|pair| {
    let (key, value) = pair.trim().split_once('=')?;
    (key == name).then(|| value.to_string())
  })
}

/// Parse the caller's subscription token; absent or malformed cookies yield
/// an empty token.
pub fn subscription_token(headers: &HeaderMap) -> SubscriptionToken {
  read(headers, SUBSCRIBED_LINKS)
    .map(|raw| SubscriptionToken::parse(&raw))
    .unwrap_or_default()
}

/// Render the `Set-Cookie` value persisting `token`.
pub fn subscription_set_cookie(token: &SubscriptionToken) -> String {
  format!(
    "{SUBSCRIBED_LINKS}={}; Path=/; Max-Age={ONE_YEAR_SECS}; SameSite=Lax",
    token.serialize()
  )
}

#[cfg(test)]
mod tests {
  use axum::http::header;

  use super::*;

  #[test]
  fn read_picks_the_named_cookie() {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::COOKIE,
      "other=1; subscribed_links=3,5 ;access_token=abc".parse().unwrap(),
    );
    assert_eq!(read(&headers, SUBSCRIBED_LINKS).as_deref(), Some("3,5"));
    assert_eq!(read(&headers, ACCESS_TOKEN).as_deref(), Some("abc"));
    assert_eq!(read(&headers, "missing"), None);
  }

  #[test]
  fn absent_cookie_yields_empty_token() {
    assert!(subscription_token(&HeaderMap::new()).is_empty());
  }

  #[test]
  fn set_cookie_round_trips_the_token() {
    let token = SubscriptionToken::parse("2,7");
    let value = subscription_set_cookie(&token);
    assert!(value.starts_with("subscribed_links=2,7;"), "{value}");

    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, value.split(';').next().unwrap().parse().unwrap());
    assert_eq!(subscription_token(&headers), token);
  }
}
