//! Zapwallet: discover NWC wallet services on Nostr and connect to them.
//!
//! # Architecture
//!
//! ```text
//! create_wallet / create_nostr_profile
//!   │
//!   ├── WalletDiscovery (announcements → WalletService)
//!   │     ├── TrustMode::Attested (external AttestationValidator)
//!   │     └── TrustMode::RelayListCrossReference (kind 10002 lookup)
//!   │
//!   └── RelayTransport (query / publish)
//!         └── PoolTransport → RelayPool → RelayClient (tokio-tungstenite)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use zapwallet::{create_wallet, DiscoveryConfig, PoolTransport, WalletDiscovery};
//!
//! let discovery = WalletDiscovery::new(PoolTransport::default(), DiscoveryConfig::default());
//! let wallet = create_wallet(&discovery, Some(100_000)).await?;
//! println!("{}", wallet.nwc_string);
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod profile;
pub mod relay;
pub mod wallet;

pub use config::{DiscoveryConfig, DiscoveryOptions, TrustMode};
pub use discovery::{AttestationValidator, WalletDiscovery, WalletService};
pub use error::{Result, WalletError};
pub use profile::{build_profile_events, create_nostr_profile, CreatedProfile, ProfileInfo, ProfileRelays};
pub use relay::{normalize_relay, EventFilter, PoolTransport, PublishOutcome, RelayTransport};
pub use wallet::{create_wallet, CreatedWallet};
