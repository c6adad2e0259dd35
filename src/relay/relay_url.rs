//! Relay URL normalization
//!
//! Announced relay lists are free-form strings from untrusted authors. Only
//! routable `ws`/`wss` endpoints survive; Tor hidden services and loopback
//! hosts are rejected.

use url::{Host, Url};

/// Canonical form of `relay`, or `None` if it is not a usable public relay.
pub fn normalize_relay(relay: &str) -> Option<String> {
    let url = Url::parse(relay).ok()?;
    if url.scheme() != "wss" && url.scheme() != "ws" {
        return None;
    }
    match url.host()? {
        Host::Domain(domain) => {
            if domain == "localhost" || domain.ends_with(".onion") {
                return None;
            }
        }
        Host::Ipv4(ip) if ip.is_loopback() => return None,
        Host::Ipv6(ip) if ip.is_loopback() => return None,
        _ => {}
    }
    Some(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_form() {
        assert_eq!(normalize_relay("wss://relay.damus.io").as_deref(), Some("wss://relay.damus.io/"));
        assert_eq!(
            normalize_relay("wss://relay.nostr.band/all").as_deref(),
            Some("wss://relay.nostr.band/all")
        );
        assert_eq!(normalize_relay("WSS://Relay.Primal.NET").as_deref(), Some("wss://relay.primal.net/"));
        assert_eq!(normalize_relay("ws://relay.example.com:7777").as_deref(), Some("ws://relay.example.com:7777/"));
    }

    #[test]
    fn test_normalized_is_idempotent() {
        let once = normalize_relay("wss://nostr.mom/path?x=1").expect("valid");
        assert_eq!(normalize_relay(&once).as_deref(), Some(once.as_str()));
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert_eq!(normalize_relay("https://relay.damus.io"), None);
        assert_eq!(normalize_relay("http://relay.damus.io"), None);
        assert_eq!(normalize_relay("mailto:someone@example.com"), None);
    }

    #[test]
    fn test_rejects_onion_and_loopback() {
        assert_eq!(normalize_relay("ws://abcdefghijklmnop.onion"), None);
        assert_eq!(normalize_relay("wss://localhost:8080"), None);
        assert_eq!(normalize_relay("ws://127.0.0.1:7000"), None);
        assert_eq!(normalize_relay("ws://127.1.2.3"), None);
        assert_eq!(normalize_relay("ws://[::1]:7000"), None);
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(normalize_relay(""), None);
        assert_eq!(normalize_relay("relay.damus.io"), None);
        assert_eq!(normalize_relay("wss://"), None);
    }
}
