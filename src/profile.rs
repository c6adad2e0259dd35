//! Profile creation - kind 0 metadata + kind 10002 relay list

use crate::config::{to_owned_relays, OUTBOX_RELAYS, PROFILE_RELAYS};
use crate::error::{Result, WalletError};
use crate::relay::{kinds, RelayTransport};
use nostr::nips::nip19::ToBech32;
use nostr::{Event, Keys, Kind, PublicKey, Tag, Timestamp, UnsignedEvent};
use serde::Serialize;

/// User-supplied profile fields
#[derive(Debug, Clone, Default)]
pub struct ProfileInfo {
    pub name: String,
    pub about: Option<String>,
    pub picture: Option<String>,
    pub ln_address: Option<String>,
}

impl ProfileInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }
    pub fn with_about(mut self, about: impl Into<String>) -> Self { self.about = Some(about.into()); self }
    pub fn with_picture(mut self, url: impl Into<String>) -> Self { self.picture = Some(url.into()); self }
    pub fn with_ln_address(mut self, addr: impl Into<String>) -> Self { self.ln_address = Some(addr.into()); self }
}

/// Kind 0 content. Empty optional fields are omitted.
#[derive(Serialize)]
struct ProfileContent<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    about: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    picture: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lud16: Option<&'a str>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

/// Result of [`create_nostr_profile`]
#[derive(Debug, Clone)]
pub struct CreatedProfile {
    pub keys: Keys,
    pub pubkey: PublicKey,
    pub npub: String,
    pub relays: Vec<String>,
}

/// Where profile records go and which relays they advertise
#[derive(Debug, Clone)]
pub struct ProfileRelays {
    pub outbox: Vec<String>,
    pub advertised: Vec<String>,
}

impl Default for ProfileRelays {
    fn default() -> Self {
        Self {
            outbox: to_owned_relays(OUTBOX_RELAYS),
            advertised: to_owned_relays(PROFILE_RELAYS),
        }
    }
}

fn sign(keys: &Keys, kind: u16, tags: Vec<Tag>, content: String) -> Result<Event> {
    UnsignedEvent::new(keys.public_key(), Timestamp::now(), Kind::from(kind), tags, content)
        .sign_with_keys(keys)
        .map_err(|e| WalletError::Sign(e.to_string()))
}

/// Signed profile metadata and relay list events, in publish order.
pub fn build_profile_events(info: &ProfileInfo, keys: &Keys, relays: &[String]) -> Result<(Event, Event)> {
    let content = serde_json::to_string(&ProfileContent {
        name: &info.name,
        about: non_empty(&info.about),
        picture: non_empty(&info.picture),
        lud16: non_empty(&info.ln_address),
    })?;
    let profile = sign(keys, kinds::METADATA, Vec::new(), content)?;

    let tags = relays
        .iter()
        .map(|r| Tag::parse(&["r".to_string(), r.clone()]).map_err(|e| WalletError::Sign(e.to_string())))
        .collect::<Result<Vec<Tag>>>()?;
    let relay_list = sign(keys, kinds::RELAY_LIST, tags, String::new())?;

    Ok((profile, relay_list))
}

/// Create and publish a profile. Publishing is best effort: every outbox relay
/// is tried, failures are logged and ignored.
pub async fn create_nostr_profile<T: RelayTransport>(
    transport: &T,
    info: &ProfileInfo,
    keys: Option<Keys>,
    relays: &ProfileRelays,
) -> Result<CreatedProfile> {
    let keys = keys.unwrap_or_else(Keys::generate);
    let (profile, relay_list) = build_profile_events(info, &keys, &relays.advertised)?;

    for event in [&profile, &relay_list] {
        let outcomes = transport.publish(&relays.outbox, event).await;
        let accepted = outcomes.iter().filter(|o| o.is_ok()).count();
        for outcome in outcomes.iter().filter(|o| !o.is_ok()) {
            if let Err(e) = &outcome.result {
                tracing::debug!(relay = %outcome.relay, kind = event.kind.as_u16(), "publish failed: {}", e);
            }
        }
        tracing::info!(kind = event.kind.as_u16(), accepted, total = outcomes.len(), "profile event published");
    }

    let pubkey = keys.public_key();
    let npub = pubkey.to_bech32().map_err(|e| WalletError::Encoding(e.to_string()))?;
    Ok(CreatedProfile { keys, pubkey, npub, relays: relays.advertised.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_profile_content_only_name() {
        let keys = Keys::generate();
        let relays = to_owned_relays(PROFILE_RELAYS);
        let (profile, _) = build_profile_events(&ProfileInfo::new("Alice"), &keys, &relays).expect("build");
        let content: Value = serde_json::from_str(&profile.content).expect("json");
        assert_eq!(content, json!({"name": "Alice"}));
        assert_eq!(profile.kind.as_u16(), 0);
        assert_eq!(profile.pubkey, keys.public_key());
    }

    #[test]
    fn test_profile_content_all_fields() {
        let keys = Keys::generate();
        let info = ProfileInfo::new("Bob")
            .with_about("builder")
            .with_picture("https://example.com/bob.png")
            .with_ln_address("bob@zap.land");
        let (profile, _) = build_profile_events(&info, &keys, &[]).expect("build");
        let content: Value = serde_json::from_str(&profile.content).expect("json");
        assert_eq!(content, json!({
            "name": "Bob",
            "about": "builder",
            "picture": "https://example.com/bob.png",
            "lud16": "bob@zap.land",
        }));
    }

    #[test]
    fn test_empty_optional_fields_omitted() {
        let keys = Keys::generate();
        let info = ProfileInfo::new("Carol").with_about("");
        let (profile, _) = build_profile_events(&info, &keys, &[]).expect("build");
        let content: Value = serde_json::from_str(&profile.content).expect("json");
        assert_eq!(content, json!({"name": "Carol"}));
    }

    #[test]
    fn test_relay_list_tags_in_order() {
        let keys = Keys::generate();
        let relays = to_owned_relays(PROFILE_RELAYS);
        let (_, list) = build_profile_events(&ProfileInfo::new("Alice"), &keys, &relays).expect("build");
        assert_eq!(list.kind.as_u16(), 10002);
        assert!(list.content.is_empty());
        let tags: Vec<Vec<String>> = list.tags.iter().map(|t| t.as_slice().to_vec()).collect();
        let expected: Vec<Vec<String>> = PROFILE_RELAYS
            .iter()
            .map(|r| vec!["r".to_string(), r.to_string()])
            .collect();
        assert_eq!(tags, expected);
        assert!(list.verify().is_ok());
    }
}
