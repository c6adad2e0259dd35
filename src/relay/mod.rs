//! Relay - Nostr relay plumbing for wallet service discovery
//!
//! - Relay URL normalization (safe canonical relay set)
//! - NIP-01 relay client via tokio-tungstenite WebSocket
//! - One-shot RelayPool (connect, query or publish, close)
//! - `RelayTransport` seam used by discovery and profile publishing

pub mod client;
pub mod relay_url;
pub mod transport;

pub use client::{parse_relay_message, RelayClient, RelayMessage, RelayPool, RelayState};
pub use relay_url::normalize_relay;
pub use transport::{PoolTransport, PublishOutcome, RelayTransport};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Event kinds used by wallet discovery
pub mod kinds {
    /// Profile metadata (NIP-01)
    pub const METADATA: u16 = 0;
    /// Relay list metadata (NIP-65)
    pub const RELAY_LIST: u16 = 10002;
    /// NWC wallet service announcement
    pub const WALLET_SERVICE: u16 = 13196;
}

/// First value of the first tag named `name` carrying a value
pub fn tag_value<'a>(event: &'a nostr::Event, name: &str) -> Option<&'a str> {
    event
        .tags
        .iter()
        .map(|t| t.as_slice())
        .find(|t| t.len() > 1 && t[0] == name)
        .map(|t| t[1].as_str())
}

/// Values of every tag named `name`, in tag order
pub fn tag_values<'a>(event: &'a nostr::Event, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    event
        .tags
        .iter()
        .map(|t| t.as_slice())
        .filter(move |t| t.len() > 1 && t[0] == name)
        .map(|t| t[1].as_str())
}

/// Event filter for subscriptions (NIP-01)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EventFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<u16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Single-letter tag constraints, keyed `#<letter>`
    #[serde(flatten)]
    pub tags: BTreeMap<String, Vec<String>>,
}

impl EventFilter {
    pub fn new() -> Self { Self::default() }

    pub fn kinds(mut self, kinds: impl IntoIterator<Item = u16>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    pub fn authors<S: Into<String>>(mut self, authors: impl IntoIterator<Item = S>) -> Self {
        self.authors = Some(authors.into_iter().map(Into::into).collect());
        self
    }

    pub fn since(mut self, since: u64) -> Self { self.since = Some(since); self }
    pub fn until(mut self, until: u64) -> Self { self.until = Some(until); self }
    pub fn limit(mut self, limit: usize) -> Self { self.limit = Some(limit); self }

    pub fn tag<S: Into<String>>(mut self, letter: char, values: impl IntoIterator<Item = S>) -> Self {
        self.tags
            .insert(format!("#{}", letter), values.into_iter().map(Into::into).collect());
        self
    }

    /// Local NIP-01 match; `limit` does not apply to a single event.
    pub fn matches(&self, event: &nostr::Event) -> bool {
        if let Some(ids) = &self.ids {
            let id = event.id.to_hex();
            if !ids.iter().any(|i| *i == id) {
                return false;
            }
        }
        if let Some(authors) = &self.authors {
            let author = event.pubkey.to_hex();
            if !authors.iter().any(|a| *a == author) {
                return false;
            }
        }
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&event.kind.as_u16()) {
                return false;
            }
        }
        let created_at = event.created_at.as_u64();
        if self.since.is_some_and(|since| created_at < since) {
            return false;
        }
        if self.until.is_some_and(|until| created_at > until) {
            return false;
        }
        self.tags.iter().all(|(key, values)| {
            let name = key.trim_start_matches('#');
            tag_values(event, name).any(|v| values.iter().any(|want| want == v))
        })
    }
}
