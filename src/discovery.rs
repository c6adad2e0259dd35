//! Wallet service discovery
//!
//! Announcements (kind 13196) are fetched from the info relays, checked for
//! the structural tags, passed through the configured [`TrustMode`], mapped to
//! [`WalletService`] and filtered by relay set and balance ceiling.
//!
//! # Pipeline
//!
//! ```text
//! query 13196 ──► structural tags ──► trust ──► map ──► normalize relays
//!                                       │                    │
//!                  attestation validator┘          drop if no relays
//!                  or 10002 cross-reference        drop if maxBalance < floor
//! ```

use crate::config::{DiscoveryConfig, DiscoveryOptions, TrustMode};
use crate::error::Result;
use crate::relay::{kinds, normalize_relay, tag_value, tag_values, EventFilter, RelayTransport};
use nostr::{Event, PublicKey, Timestamp};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Decides whether an announcement was produced inside a trusted enclave.
pub trait AttestationValidator: Send + Sync {
    fn validate(&self, event: &Event) -> bool;
}

impl<F> AttestationValidator for F
where
    F: Fn(&Event) -> bool + Send + Sync,
{
    fn validate(&self, event: &Event) -> bool {
        self(event)
    }
}

/// A discovered NWC wallet service.
///
/// Numeric fields are `None` when the announcement does not advertise them
/// or advertises something that is not a number.
#[derive(Debug, Clone, Serialize)]
pub struct WalletService {
    pub pubkey: PublicKey,
    /// Normalized, never empty
    pub relays: Vec<String>,
    pub min_sendable: Option<f64>,
    pub max_sendable: Option<f64>,
    pub max_balance: Option<f64>,
    pub liquidity_fee_rate: Option<f64>,
    pub payment_fee_rate: Option<f64>,
    pub payment_fee_base: Option<f64>,
    pub wallet_fee_base: Option<f64>,
    pub wallet_fee_period: Option<f64>,
    pub open: bool,
    /// Environment label from the `t` tag
    pub enclave: Option<String>,
    pub event: Event,
}

impl WalletService {
    /// Build from an announcement and its candidate relays. `None` if no relay
    /// survives normalization.
    pub fn from_announcement<'a>(event: &Event, candidates: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut relays: Vec<String> = Vec::new();
        for relay in candidates.into_iter().filter_map(normalize_relay) {
            if !relays.contains(&relay) {
                relays.push(relay);
            }
        }
        if relays.is_empty() {
            return None;
        }

        Some(Self {
            pubkey: event.pubkey,
            relays,
            min_sendable: number(event, "minSendable"),
            max_sendable: number(event, "maxSendable"),
            max_balance: number(event, "maxBalance"),
            liquidity_fee_rate: number(event, "liquidityFeeRate"),
            payment_fee_rate: number(event, "paymentFeeRate"),
            payment_fee_base: number(event, "paymentFeeBase"),
            wallet_fee_base: number(event, "walletFeeBase"),
            wallet_fee_period: number(event, "walletFeePeriod"),
            open: is_open(event),
            enclave: tag_value(event, "t").map(String::from),
            event: event.clone(),
        })
    }

    /// Balance floor check. Services that advertise no ceiling pass; an
    /// advertised ceiling that is not a number never does.
    pub fn accepts_balance(&self, floor: u64) -> bool {
        match self.max_balance {
            Some(max) => max >= floor as f64,
            None => tag_value(&self.event, "maxBalance").is_none(),
        }
    }
}

fn number(event: &Event, name: &str) -> Option<f64> {
    tag_value(event, name).and_then(|v| v.trim().parse().ok())
}

fn is_open(event: &Event) -> bool {
    tag_value(event, "o") == Some("true")
}

fn has_value(event: &Event, name: &str) -> bool {
    tag_value(event, name).is_some_and(|v| !v.is_empty())
}

/// Structural check on an announcement: `minSendable` always, plus a `relay`
/// tag and the open flag when `strict`.
pub fn has_required_tags(event: &Event, strict: bool) -> bool {
    if !has_value(event, "minSendable") {
        return false;
    }
    !strict || (has_value(event, "relay") && is_open(event))
}

/// Wallet service discovery over a [`RelayTransport`].
pub struct WalletDiscovery<T> {
    transport: T,
    config: DiscoveryConfig,
}

impl<T: RelayTransport> WalletDiscovery<T> {
    pub fn new(transport: T, config: DiscoveryConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Announcement filter for one run.
    pub fn announcement_filter(&self, opts: &DiscoveryOptions) -> EventFilter {
        let window = opts.window.unwrap_or(self.config.window);
        let since = Timestamp::now().as_u64().saturating_sub(window.as_secs());
        let mut filter = EventFilter::new()
            .kinds([kinds::WALLET_SERVICE])
            .since(since)
            .limit(opts.limit.unwrap_or(self.config.limit));
        if self.config.open_only {
            filter = filter.tag('o', ["true"]);
        }
        if !self.config.environments.is_empty() {
            filter = filter.tag('t', self.config.environments.iter().cloned());
        }
        filter
    }

    /// Discover wallet services. Returns an empty list, never an error, when
    /// nothing qualifies; relay failures propagate.
    pub async fn discover_wallet_services(&self, opts: DiscoveryOptions) -> Result<Vec<WalletService>> {
        let relays = opts.relays.clone().unwrap_or_else(|| self.config.relays.clone());
        let filter = self.announcement_filter(&opts);
        let events = self.transport.query(&relays, &filter).await?;
        let fetched = events.len();

        let candidates: Vec<Event> = events
            .into_iter()
            .filter(|e| {
                let ok = has_required_tags(e, self.config.strict);
                if !ok {
                    tracing::debug!(id = %e.id, "announcement missing required tags");
                }
                ok
            })
            .collect();

        let services = match &self.config.trust {
            TrustMode::Attested(validator) => self.attested(candidates, validator),
            TrustMode::RelayListCrossReference => self.cross_referenced(candidates).await?,
        };

        let services: Vec<WalletService> = match opts.max_balance.filter(|floor| *floor > 0) {
            Some(floor) => services.into_iter().filter(|s| s.accepts_balance(floor)).collect(),
            None => services,
        };

        tracing::info!(fetched, found = services.len(), mode = ?self.config.trust, "wallet service discovery");
        Ok(services)
    }

    fn attested(&self, candidates: Vec<Event>, validator: &Arc<dyn AttestationValidator>) -> Vec<WalletService> {
        candidates
            .iter()
            .filter(|e| {
                let ok = validator.validate(e);
                if !ok {
                    tracing::debug!(id = %e.id, "announcement failed attestation");
                }
                ok
            })
            .filter_map(|e| WalletService::from_announcement(e, tag_values(e, "relay")))
            .collect()
    }

    async fn cross_referenced(&self, candidates: Vec<Event>) -> Result<Vec<WalletService>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut authors: Vec<String> = Vec::new();
        for e in &candidates {
            let hex = e.pubkey.to_hex();
            if !authors.contains(&hex) {
                authors.push(hex);
            }
        }
        let filter = EventFilter::new().kinds([kinds::RELAY_LIST]).authors(authors);
        let lists = self.transport.query(&self.config.outbox_relays, &filter).await?;

        // Replaceable event: newest list per author wins.
        let mut latest: HashMap<PublicKey, &Event> = HashMap::new();
        for list in lists.iter().filter(|l| l.kind.as_u16() == kinds::RELAY_LIST) {
            let newer = latest
                .get(&list.pubkey)
                .map_or(true, |current| list.created_at > current.created_at);
            if newer {
                latest.insert(list.pubkey, list);
            }
        }

        Ok(candidates
            .iter()
            .filter_map(|e| match latest.get(&e.pubkey) {
                Some(list) => WalletService::from_announcement(e, tag_values(list, "r")),
                None => {
                    tracing::debug!(id = %e.id, "announcement author has no relay list");
                    None
                }
            })
            .collect())
    }
}
