//! Zapwallet CLI
//!
//!   zapwallet discover [--relay <url>]... [--max-balance <sats>] [--strict]
//!   zapwallet create-wallet [--max-balance <sats>]
//!   zapwallet create-profile --name <name> [--about ..] [--picture ..] [--ln-address ..] [--secret <hex>]
//!
//! Output is JSON on stdout (pretty on a tty). Logs go to stderr, see `RUST_LOG`
//! and `ZAPWALLET_LOG_JSON`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::io::IsTerminal;
use std::time::Duration;
use zapwallet::logging::init_logging;
use zapwallet::{
    create_nostr_profile, create_wallet, DiscoveryConfig, DiscoveryOptions, PoolTransport, ProfileInfo,
    ProfileRelays, WalletDiscovery,
};

#[derive(Parser)]
#[command(name = "zapwallet", version, about = "Discover NWC wallet services on Nostr")]
struct Cli {
    /// Per-relay timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    timeout_secs: u64,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List wallet services announced on the info relays
    Discover {
        /// Relay to query (repeatable); defaults to the built-in info relays
        #[arg(long = "relay")]
        relays: Vec<String>,
        /// Only services whose balance ceiling is at least this much
        #[arg(long)]
        max_balance: Option<u64>,
        /// Announcement age window in seconds
        #[arg(long)]
        window_secs: Option<u64>,
        #[arg(long)]
        limit: Option<usize>,
        /// Require `relay` and open-flag tags
        #[arg(long)]
        strict: bool,
    },
    /// Connect a new client key to the first discovered service
    CreateWallet {
        #[arg(long)]
        max_balance: Option<u64>,
    },
    /// Publish a profile and relay list for a new or existing key
    CreateProfile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        about: Option<String>,
        #[arg(long)]
        picture: Option<String>,
        #[arg(long)]
        ln_address: Option<String>,
        /// Existing secret key (hex); a new one is generated otherwise
        #[arg(long)]
        secret: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout_secs);
    let transport = PoolTransport::new(timeout);

    let output = match cli.command {
        Command::Discover { relays, max_balance, window_secs, limit, strict } => {
            let config = DiscoveryConfig::default().with_strict(strict);
            let discovery = WalletDiscovery::new(transport, config);
            let opts = DiscoveryOptions {
                relays: (!relays.is_empty()).then_some(relays),
                max_balance,
                window: window_secs.map(Duration::from_secs),
                limit,
            };
            let services = discovery.discover_wallet_services(opts).await?;
            serde_json::to_value(&services)?
        }
        Command::CreateWallet { max_balance } => {
            let discovery = WalletDiscovery::new(transport, DiscoveryConfig::default());
            let wallet = create_wallet(&discovery, max_balance).await?;
            json!({
                "nwc": wallet.nwc_string,
                "lnAddress": wallet.ln_address,
                "service": wallet.service.pubkey.to_hex(),
                "relays": wallet.service.relays,
            })
        }
        Command::CreateProfile { name, about, picture, ln_address, secret } => {
            let keys = secret.as_deref().map(parse_keys).transpose()?;
            let info = ProfileInfo { name, about, picture, ln_address };
            let profile = create_nostr_profile(&transport, &info, keys, &ProfileRelays::default()).await?;
            json!({
                "secret": profile.keys.secret_key().to_secret_hex(),
                "pubkey": profile.pubkey.to_hex(),
                "npub": profile.npub,
                "relays": profile.relays,
            })
        }
    };

    print_json(&output, cli.pretty)
}

fn parse_keys(secret: &str) -> anyhow::Result<nostr::Keys> {
    let bytes = hex::decode(secret.trim()).context("secret must be hex")?;
    let sk = nostr::SecretKey::from_slice(&bytes).context("invalid secret key")?;
    Ok(nostr::Keys::new(sk))
}

fn print_json(value: &Value, pretty: bool) -> anyhow::Result<()> {
    let text = if pretty || std::io::stdout().is_terminal() {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}
