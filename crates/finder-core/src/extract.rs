//! Link extraction from video descriptions.
//!
//! Channels tend to paste the same block of social links into every video
//! description, while per-video links (sponsor codes, referenced videos)
//! change each upload. Intersecting the URL sets of consecutive
//! descriptions keeps the recurring block and discards the one-offs.
//!
//! The intersection deliberately stops after a small number of URL-bearing
//! descriptions rather than scanning every fetched video: two agreeing
//! descriptions already separate template links from per-video links, and
//! each extra pass only shrinks the set. The bound is a parameter so the
//! precision/cost tradeoff stays tunable.

use std::{collections::BTreeSet, sync::LazyLock};

use regex::Regex;

/// Default number of URL-bearing descriptions folded into the intersection.
pub const DEFAULT_PASSES: usize = 2;

static URL_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"https?://\S+").expect("static URL pattern"));

/// All `http(s)://` substrings of `text`, in order of appearance.
pub fn extract_urls(text: &str) -> Vec<String> {
  URL_PATTERN
    .find_iter(text)
    .map(|m| m.as_str().to_string())
    .collect()
}

/// Intersect the URL sets of `descriptions` (most-recent-first), keeping
/// only links that recur across uploads.
///
/// Descriptions without any URL match do not participate. The pass ends
/// after `passes` matching descriptions have been folded in. An empty
/// result is valid: no stable cross-video links were found.
pub fn recurring_links<'a, I>(descriptions: I, passes: usize) -> BTreeSet<String>
where
  I: IntoIterator<Item = &'a str>,
{
  let mut running: Option<BTreeSet<String>> = None;
  let mut matched = 0usize;

  for description in descriptions {
    let urls: BTreeSet<String> = extract_urls(description).into_iter().collect();
    if urls.is_empty() {
      continue;
    }

    running = Some(match running.take() {
      None      => urls,
      Some(acc) => acc.intersection(&urls).cloned().collect(),
    });

    matched += 1;
    if matched >= passes {
      break;
    }
  }

  running.unwrap_or_default()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_all_urls_from_text() {
    let urls =
      extract_urls("see https://a.example and also https://b.example/x?q=1");
    assert_eq!(urls, vec!["https://a.example", "https://b.example/x?q=1"]);
  }

  #[test]
  fn no_urls_yields_empty_vec() {
    assert!(extract_urls("nothing to see here").is_empty());
  }

  #[test]
  fn intersection_keeps_only_recurring_links() {
    let descriptions = [
      "see https://a.com and https://b.com",
      "see https://b.com only",
    ];
    let links = recurring_links(descriptions, DEFAULT_PASSES);
    assert_eq!(links.into_iter().collect::<Vec<_>>(), vec!["https://b.com"]);
  }

  #[test]
  fn descriptions_without_urls_do_not_participate() {
    let descriptions = ["https://a.com", ""];
    let links = recurring_links(descriptions, DEFAULT_PASSES);
    assert_eq!(links.into_iter().collect::<Vec<_>>(), vec!["https://a.com"]);
  }

  #[test]
  fn stops_after_the_configured_number_of_matching_descriptions() {
    // The third description would empty the set, but the default bound of
    // two means it is never consulted.
    let descriptions = [
      "https://a.com https://b.com",
      "https://a.com https://b.com",
      "https://c.com",
    ];
    let links = recurring_links(descriptions, DEFAULT_PASSES);
    assert_eq!(links.len(), 2);
  }

  #[test]
  fn wider_bound_consults_more_descriptions() {
    let descriptions = [
      "https://a.com https://b.com",
      "https://a.com https://b.com",
      "https://a.com",
    ];
    let links = recurring_links(descriptions, 3);
    assert_eq!(links.into_iter().collect::<Vec<_>>(), vec!["https://a.com"]);
  }

  #[test]
  fn duplicate_urls_within_one_description_are_deduplicated() {
    let links = recurring_links(["https://a.com https://a.com"], 2);
    assert_eq!(links.len(), 1);
  }

  #[test]
  fn all_empty_descriptions_yield_empty_set() {
    assert!(recurring_links(["", "no links"], 2).is_empty());
  }
}
