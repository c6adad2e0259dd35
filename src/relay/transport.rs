//! RelayTransport - the query/publish seam between discovery and the network

use crate::error::Result;
use crate::relay::{EventFilter, RelayPool};
use async_trait::async_trait;
use std::time::Duration;

/// Outcome of publishing one event to one relay
#[derive(Debug)]
pub struct PublishOutcome {
    pub relay: String,
    pub result: Result<()>,
}

impl PublishOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Queries and publishes against a set of relays
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// All stored events matching `filter` across `relays`, de-duplicated.
    async fn query(&self, relays: &[String], filter: &EventFilter) -> Result<Vec<nostr::Event>>;

    /// Publish `event` to every relay; one outcome per relay.
    async fn publish(&self, relays: &[String], event: &nostr::Event) -> Vec<PublishOutcome>;
}

/// WebSocket transport. Opens a fresh [`RelayPool`] per call and always
/// closes it before returning.
#[derive(Debug, Clone)]
pub struct PoolTransport {
    timeout: Duration,
}

impl Default for PoolTransport {
    fn default() -> Self { Self::new(crate::config::DEFAULT_QUERY_TIMEOUT) }
}

impl PoolTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl RelayTransport for PoolTransport {
    async fn query(&self, relays: &[String], filter: &EventFilter) -> Result<Vec<nostr::Event>> {
        let mut pool = RelayPool::new(relays, self.timeout);
        let result = pool.query_sync(filter).await;
        pool.close().await;
        result
    }

    async fn publish(&self, relays: &[String], event: &nostr::Event) -> Vec<PublishOutcome> {
        let mut pool = RelayPool::new(relays, self.timeout);
        let outcomes = pool.publish(event).await;
        pool.close().await;
        outcomes
            .into_iter()
            .map(|(relay, result)| PublishOutcome { relay, result })
            .collect()
    }
}

#[async_trait]
impl<T: RelayTransport + ?Sized> RelayTransport for std::sync::Arc<T> {
    async fn query(&self, relays: &[String], filter: &EventFilter) -> Result<Vec<nostr::Event>> {
        (**self).query(relays, filter).await
    }

    async fn publish(&self, relays: &[String], event: &nostr::Event) -> Vec<PublishOutcome> {
        (**self).publish(relays, event).await
    }
}
