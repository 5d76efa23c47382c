//! The client preference token scoping search to "my subscriptions".
//!
//! The set of subscribed link ids lives client-side in a cookie, never in
//! the store. It is parsed into this value object at the HTTP boundary and
//! passed explicitly into query construction — never treated as ambient
//! state. Parsing is defensive: the value is attacker-controlled, so it is
//! bounded in length and filtered to non-negative integers.

use std::collections::BTreeSet;

/// Upper bound on the serialised token length accepted from a client.
pub const MAX_TOKEN_LEN: usize = 4096;

/// A deduplicated set of subscribed link ids held by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionToken {
  ids: BTreeSet<i64>,
}

impl SubscriptionToken {
  /// Parse a comma-separated token value. Oversized input is treated as an
  /// absent token; non-integer and negative entries are dropped.
  pub fn parse(raw: &str) -> Self {
    if raw.len() > MAX_TOKEN_LEN {
      return Self::default();
    }
    let ids = raw
      .split(',')
      .filter_map(|part| part.trim().parse::<i64>().ok())
      .filter(|id| *id >= 0)
      .collect();
    Self { ids }
  }

  /// Serialise back to the comma-separated cookie form.
  pub fn serialize(&self) -> String {
    let parts: Vec<String> = self.ids.iter().map(i64::to_string).collect();
    parts.join(",")
  }

  /// Set-union new link ids into the token.
  pub fn merge(&mut self, ids: impl IntoIterator<Item = i64>) {
    self.ids.extend(ids.into_iter().filter(|id| *id >= 0));
  }

  pub fn ids(&self) -> Vec<i64> {
    self.ids.iter().copied().collect()
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty()
  }

  pub fn len(&self) -> usize {
    self.ids.len()
  }
}
