//! Wallet creation - NWC connection string for a freshly generated client key

use crate::config::DiscoveryOptions;
use crate::discovery::{WalletDiscovery, WalletService};
use crate::error::{Result, WalletError};
use crate::relay::RelayTransport;
use nostr::nips::nip19::ToBech32;
use nostr::{Keys, PublicKey};
use serde::Serialize;

pub const NWC_SCHEME: &str = "nostr+walletconnect://";
pub const LN_ADDRESS_DOMAIN: &str = "zap.land";

/// Result of [`create_wallet`]
#[derive(Debug, Clone, Serialize)]
pub struct CreatedWallet {
    pub nwc_string: String,
    pub ln_address: String,
    pub service: WalletService,
}

fn npub(pubkey: &PublicKey) -> Result<String> {
    pubkey.to_bech32().map_err(|e| WalletError::Encoding(e.to_string()))
}

/// `<npub client>@<npub service>.zap.land`
pub fn lightning_address(client: &PublicKey, service: &PublicKey) -> Result<String> {
    Ok(format!("{}@{}.{}", npub(client)?, npub(service)?, LN_ADDRESS_DOMAIN))
}

/// NWC connection string on the service's first relay. Values are embedded
/// verbatim.
pub fn nwc_string(service: &WalletService, client: &Keys, ln_address: &str) -> Result<String> {
    let relay = service
        .relays
        .first()
        .ok_or_else(|| WalletError::NoRelay(service.pubkey.to_hex()))?;
    Ok(format!(
        "{}{}?relay={}&secret={}&lud16={}",
        NWC_SCHEME,
        service.pubkey.to_hex(),
        relay,
        client.secret_key().to_secret_hex(),
        ln_address
    ))
}

/// Discover services with `max_balance` as the balance floor and connect a
/// new client key to the first one found.
pub async fn create_wallet<T: RelayTransport>(
    discovery: &WalletDiscovery<T>,
    max_balance: Option<u64>,
) -> Result<CreatedWallet> {
    let opts = DiscoveryOptions { max_balance, ..Default::default() };
    let service = discovery
        .discover_wallet_services(opts)
        .await?
        .into_iter()
        .next()
        .ok_or(WalletError::NoServiceFound)?;

    let client = Keys::generate();
    let ln_address = lightning_address(&client.public_key(), &service.pubkey)?;
    let nwc_string = nwc_string(&service, &client, &ln_address)?;
    tracing::info!(service = %service.pubkey, relays = ?service.relays, "wallet created");

    Ok(CreatedWallet { nwc_string, ln_address, service })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr::{Kind, Tag, Timestamp, UnsignedEvent};

    fn service(keys: &Keys) -> WalletService {
        let tags = vec![Tag::parse(&vec!["minSendable".to_string(), "1000".to_string()]).unwrap()];
        let event = UnsignedEvent::new(keys.public_key(), Timestamp::now(), Kind::from(13196), tags, "")
            .sign_with_keys(keys)
            .unwrap();
        WalletService::from_announcement(&event, ["wss://relay.example.com", "wss://nostr.mom"]).expect("service")
    }

    #[test]
    fn test_lightning_address_shape() {
        let client = Keys::generate();
        let service = Keys::generate();
        let addr = lightning_address(&client.public_key(), &service.public_key()).expect("addr");
        let (user, domain) = addr.split_once('@').expect("@");
        assert!(user.starts_with("npub1"));
        assert!(domain.starts_with("npub1"));
        assert!(domain.ends_with(".zap.land"));
        assert_eq!(user, client.public_key().to_bech32().unwrap());
    }

    #[test]
    fn test_nwc_string_uses_first_relay() {
        let service = service(&Keys::generate());
        let client = Keys::generate();
        let nwc = nwc_string(&service, &client, "me@zap.land").expect("nwc");
        assert!(nwc.starts_with(&format!("{}{}?", NWC_SCHEME, service.pubkey.to_hex())));
        assert!(nwc.contains(&format!("relay={}&", service.relays[0])));
        assert!(nwc.contains(&format!("secret={}&", client.secret_key().to_secret_hex())));
        assert!(nwc.ends_with("&lud16=me@zap.land"));
    }

    #[test]
    fn test_nwc_string_without_relay_is_error() {
        let mut service = service(&Keys::generate());
        service.relays.clear();
        match nwc_string(&service, &Keys::generate(), "me@zap.land") {
            Err(WalletError::NoRelay(pubkey)) => assert_eq!(pubkey, service.pubkey.to_hex()),
            other => panic!("Expected NoRelay, got {:?}", other),
        }
    }
}
