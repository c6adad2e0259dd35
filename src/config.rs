//! Discovery configuration - relay sets and presets

use crate::discovery::AttestationValidator;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Relays queried for wallet service announcements
pub const DEFAULT_INFO_RELAYS: &[&str] = &[
    "wss://relay.nos.social",
    "wss://relay.damus.io",
    "wss://relay.primal.net",
    "wss://relay.nostr.band/all",
];

/// Relays where identities publish their relay lists and profiles
pub const OUTBOX_RELAYS: &[&str] = &[
    "wss://purplepag.es",
    "wss://user.kindpag.es",
    "wss://relay.damus.io",
    "wss://relay.primal.net",
    "wss://relay.nos.social",
];

/// Relays advertised in a newly created profile's relay list
pub const PROFILE_RELAYS: &[&str] = &[
    "wss://relay.damus.io",
    "wss://relay.primal.net",
    "wss://relay.nos.social",
    "wss://nostr.mom",
];

/// Service environments accepted by the attested preset
pub const DEFAULT_ENVIRONMENTS: &[&str] = &["prod", "dev"];

pub const DEFAULT_LIMIT: usize = 10;
/// Per-relay bound on connect + EOSE/OK wait
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

pub fn to_owned_relays(relays: &[&str]) -> Vec<String> {
    relays.iter().map(|r| (*r).to_string()).collect()
}

/// How announcements are trusted after the structural check
#[derive(Clone)]
pub enum TrustMode {
    /// Keep announcements the validator accepts; relays come from `relay` tags.
    Attested(Arc<dyn AttestationValidator>),
    /// Keep announcements whose author published a relay list (kind 10002)
    /// on the outbox relays; relays come from that list's `r` tags.
    RelayListCrossReference,
}

impl fmt::Debug for TrustMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustMode::Attested(_) => f.write_str("Attested"),
            TrustMode::RelayListCrossReference => f.write_str("RelayListCrossReference"),
        }
    }
}

/// Discovery preset. Per-call overrides live in [`DiscoveryOptions`].
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub relays: Vec<String>,
    pub outbox_relays: Vec<String>,
    /// How far back announcements are accepted
    pub window: Duration,
    pub limit: usize,
    /// Also require a `relay` tag and `o` == "true"
    pub strict: bool,
    /// Ask relays for `#o: ["true"]` only
    pub open_only: bool,
    /// `#t` constraint; empty means any environment
    pub environments: Vec<String>,
    pub trust: TrustMode,
}

impl Default for DiscoveryConfig {
    fn default() -> Self { Self::cross_referenced() }
}

impl DiscoveryConfig {
    /// Attestation-validated preset: last 30 minutes, strict tags, open prod/dev services.
    pub fn attested(validator: Arc<dyn AttestationValidator>) -> Self {
        Self {
            relays: to_owned_relays(DEFAULT_INFO_RELAYS),
            outbox_relays: to_owned_relays(OUTBOX_RELAYS),
            window: Duration::from_secs(30 * 60),
            limit: DEFAULT_LIMIT,
            strict: true,
            open_only: true,
            environments: DEFAULT_ENVIRONMENTS.iter().map(|e| (*e).to_string()).collect(),
            trust: TrustMode::Attested(validator),
        }
    }

    /// Relay-list cross-referenced preset: last 120 seconds, `minSendable` only.
    pub fn cross_referenced() -> Self {
        Self {
            relays: to_owned_relays(DEFAULT_INFO_RELAYS),
            outbox_relays: to_owned_relays(OUTBOX_RELAYS),
            window: Duration::from_secs(120),
            limit: DEFAULT_LIMIT,
            strict: false,
            open_only: false,
            environments: Vec::new(),
            trust: TrustMode::RelayListCrossReference,
        }
    }

    pub fn with_relays(mut self, relays: Vec<String>) -> Self { self.relays = relays; self }
    pub fn with_outbox_relays(mut self, relays: Vec<String>) -> Self { self.outbox_relays = relays; self }
    pub fn with_window(mut self, window: Duration) -> Self { self.window = window; self }
    pub fn with_limit(mut self, limit: usize) -> Self { self.limit = limit; self }
    pub fn with_strict(mut self, strict: bool) -> Self { self.strict = strict; self }
}

/// Per-call overrides for a discovery run
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    pub relays: Option<Vec<String>>,
    /// Minimum advertised balance ceiling a service must offer
    pub max_balance: Option<u64>,
    pub window: Option<Duration>,
    pub limit: Option<usize>,
}

impl DiscoveryOptions {
    pub fn new() -> Self { Self::default() }
    pub fn with_relays(mut self, relays: Vec<String>) -> Self { self.relays = Some(relays); self }
    pub fn with_max_balance(mut self, floor: u64) -> Self { self.max_balance = Some(floor); self }
    pub fn with_window(mut self, window: Duration) -> Self { self.window = Some(window); self }
    pub fn with_limit(mut self, limit: usize) -> Self { self.limit = Some(limit); self }
}
