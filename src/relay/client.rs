//! Nostr relay client - tokio-tungstenite WebSocket
//!
//! Minimal NIP-01 client: one-shot queries (REQ until EOSE) and publishes
//! (EVENT until OK). `RelayPool` owns a set of clients for a single call.

use crate::error::{Result, WalletError};
use crate::relay::EventFilter;
use futures_util::future::join_all;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// How long [`RelayClient::close`] waits for the close handshake
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Relay connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Disconnected,
    Connecting,
    Connected,
}

/// rustls needs a process-wide crypto provider before the first wss:// connect.
fn install_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Nostr relay client
pub struct RelayClient {
    url: String,
    state: Arc<RwLock<RelayState>>,
    tx: Option<mpsc::Sender<String>>,
    rx: Option<mpsc::Receiver<String>>,
    tasks: Vec<JoinHandle<()>>,
}

impl RelayClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: Arc::new(RwLock::new(RelayState::Disconnected)),
            tx: None,
            rx: None,
            tasks: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn state(&self) -> RelayState {
        *self.state.read().await
    }

    /// Connect to relay
    pub async fn connect(&mut self) -> Result<()> {
        install_crypto_provider();
        *self.state.write().await = RelayState::Connecting;

        let (ws, _) = match connect_async(&self.url).await {
            Ok(conn) => conn,
            Err(e) => {
                *self.state.write().await = RelayState::Disconnected;
                return Err(WalletError::connect(&self.url, e));
            }
        };
        let (mut write, mut read) = ws.split();

        // Channel for outgoing messages
        let (out_tx, mut out_rx) = mpsc::channel::<String>(32);
        self.tx = Some(out_tx);

        // Channel for incoming messages
        let (in_tx, in_rx) = mpsc::channel::<String>(64);
        self.rx = Some(in_rx);

        let state = self.state.clone();
        *state.write().await = RelayState::Connected;

        // Writer task (tasks[0]): sends a close frame once every sender is gone
        let state_w = state.clone();
        self.tasks.push(tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if write.send(Message::Text(msg)).await.is_err() {
                    break;
                }
            }
            let _ = write.close().await;
            *state_w.write().await = RelayState::Disconnected;
        }));

        // Reader task
        let state_r = state.clone();
        self.tasks.push(tokio::spawn(async move {
            while let Some(Ok(msg)) = read.next().await {
                if let Message::Text(txt) = msg {
                    if in_tx.send(txt).await.is_err() {
                        break;
                    }
                }
            }
            *state_r.write().await = RelayState::Disconnected;
        }));

        Ok(())
    }

    /// Send raw message
    pub async fn send(&self, msg: &str) -> Result<()> {
        match &self.tx {
            Some(tx) => tx
                .send(msg.to_string())
                .await
                .map_err(|_| WalletError::NotConnected(self.url.clone())),
            None => Err(WalletError::NotConnected(self.url.clone())),
        }
    }

    async fn recv(&mut self) -> Option<RelayMessage> {
        let rx = self.rx.as_mut()?;
        loop {
            let raw = rx.recv().await?;
            match parse_relay_message(&raw) {
                Some(msg) => return Some(msg),
                None => tracing::trace!(relay = %self.url, "ignoring relay message: {}", raw),
            }
        }
    }

    /// Publish event (NIP-01)
    pub async fn publish(&self, event: &nostr::Event) -> Result<()> {
        let msg = json!(["EVENT", event]).to_string();
        self.send(&msg).await
    }

    /// Subscribe (NIP-01)
    pub async fn subscribe(&self, id: &str, filters: Vec<Value>) -> Result<()> {
        let mut msg = vec![json!("REQ"), json!(id)];
        msg.extend(filters);
        self.send(&Value::Array(msg).to_string()).await
    }

    /// Unsubscribe (NIP-01)
    pub async fn unsubscribe(&self, id: &str) -> Result<()> {
        let msg = json!(["CLOSE", id]).to_string();
        self.send(&msg).await
    }

    /// Collect stored events for `filter` until EOSE or CLOSED.
    ///
    /// Events with a bad signature or outside the filter are dropped.
    pub async fn query(&mut self, filter: &EventFilter) -> Result<Vec<nostr::Event>> {
        let sub_id = format!("zw-{:016x}", rand::random::<u64>());
        self.subscribe(&sub_id, vec![serde_json::to_value(filter)?]).await?;

        let mut events = Vec::new();
        while let Some(msg) = self.recv().await {
            match msg {
                RelayMessage::Event { sub_id: id, event } if id == sub_id => {
                    if event.verify().is_err() {
                        tracing::debug!(relay = %self.url, id = %event.id, "dropping event with invalid signature");
                    } else if !filter.matches(&event) {
                        tracing::debug!(relay = %self.url, id = %event.id, "dropping event outside filter");
                    } else {
                        events.push(*event);
                    }
                }
                RelayMessage::Eose { sub_id: id } if id == sub_id => break,
                RelayMessage::Closed { sub_id: id, message } if id == sub_id => {
                    tracing::warn!(relay = %self.url, "subscription closed by relay: {}", message);
                    break;
                }
                RelayMessage::Notice { message } => {
                    tracing::debug!(relay = %self.url, "notice: {}", message);
                }
                _ => {}
            }
        }
        let _ = self.unsubscribe(&sub_id).await;
        Ok(events)
    }

    /// Publish and wait for the relay's OK.
    pub async fn publish_and_confirm(&mut self, event: &nostr::Event) -> Result<()> {
        self.publish(event).await?;
        let event_id = event.id.to_hex();
        while let Some(msg) = self.recv().await {
            if let RelayMessage::Ok { event_id: id, accepted, message } = msg {
                if id != event_id {
                    continue;
                }
                return if accepted {
                    Ok(())
                } else {
                    Err(WalletError::rejected(&self.url, message.unwrap_or_default()))
                };
            }
        }
        Err(WalletError::NotConnected(self.url.clone()))
    }

    /// Close the connection and stop the I/O tasks.
    ///
    /// Dropping the sender lets the writer flush and send a close frame; it
    /// gets [`CLOSE_GRACE`] to do so before both tasks are aborted.
    pub async fn close(&mut self) {
        self.tx = None;
        self.rx = None;
        let mut tasks = std::mem::take(&mut self.tasks);
        if let Some(writer) = tasks.first_mut() {
            if timeout(CLOSE_GRACE, writer).await.is_err() {
                tracing::debug!(relay = %self.url, "writer did not finish closing");
            }
        }
        for task in tasks {
            task.abort();
        }
        *self.state.write().await = RelayState::Disconnected;
    }
}

impl Drop for RelayClient {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Parse relay message
pub fn parse_relay_message(msg: &str) -> Option<RelayMessage> {
    let arr: Vec<Value> = serde_json::from_str(msg).ok()?;
    let cmd = arr.first()?.as_str()?;
    match cmd {
        "EVENT" => {
            let sub_id = arr.get(1)?.as_str()?.to_string();
            let event: nostr::Event = serde_json::from_value(arr.get(2)?.clone()).ok()?;
            Some(RelayMessage::Event { sub_id, event: Box::new(event) })
        }
        "OK" => {
            let event_id = arr.get(1)?.as_str()?.to_string();
            let accepted = arr.get(2)?.as_bool()?;
            let message = arr.get(3).and_then(|v| v.as_str()).map(String::from);
            Some(RelayMessage::Ok { event_id, accepted, message })
        }
        "EOSE" => {
            let sub_id = arr.get(1)?.as_str()?.to_string();
            Some(RelayMessage::Eose { sub_id })
        }
        "CLOSED" => {
            let sub_id = arr.get(1)?.as_str()?.to_string();
            let message = arr.get(2).and_then(|v| v.as_str()).unwrap_or_default().to_string();
            Some(RelayMessage::Closed { sub_id, message })
        }
        "NOTICE" => {
            let message = arr.get(1)?.as_str()?.to_string();
            Some(RelayMessage::Notice { message })
        }
        _ => None,
    }
}

/// Relay message types
#[derive(Debug)]
pub enum RelayMessage {
    Event { sub_id: String, event: Box<nostr::Event> },
    Ok { event_id: String, accepted: bool, message: Option<String> },
    Eose { sub_id: String },
    Closed { sub_id: String, message: String },
    Notice { message: String },
}

/// One-shot relay pool. Owned by a single query or publish call.
pub struct RelayPool {
    clients: Vec<RelayClient>,
    timeout: Duration,
}

impl RelayPool {
    /// Duplicate URLs are collapsed, first occurrence keeps its position.
    pub fn new(urls: &[String], timeout: Duration) -> Self {
        let mut seen = HashSet::new();
        let clients = urls
            .iter()
            .filter(|u| seen.insert(u.as_str()))
            .map(|u| RelayClient::new(u.clone()))
            .collect();
        Self { clients, timeout }
    }

    pub fn urls(&self) -> Vec<&str> {
        self.clients.iter().map(|c| c.url()).collect()
    }

    /// Query every relay concurrently.
    ///
    /// Results are merged in relay order and de-duplicated by event id. Fails
    /// only when every relay failed.
    pub async fn query_sync(&mut self, filter: &EventFilter) -> Result<Vec<nostr::Event>> {
        let limit = self.timeout;
        let results = join_all(self.clients.iter_mut().map(|client| async move {
            let url = client.url().to_string();
            let outcome = timeout(limit, async {
                client.connect().await?;
                client.query(filter).await
            })
            .await
            .unwrap_or_else(|_| Err(WalletError::Timeout(url.clone())));
            (url, outcome)
        }))
        .await;

        let mut seen = HashSet::new();
        let mut events = Vec::new();
        let mut failures = Vec::new();
        let total = results.len();
        for (url, outcome) in results {
            match outcome {
                Ok(batch) => {
                    tracing::debug!(relay = %url, count = batch.len(), "query answered");
                    events.extend(batch.into_iter().filter(|e| seen.insert(e.id)));
                }
                Err(e) => {
                    tracing::warn!(relay = %url, "query failed: {}", e);
                    failures.push(e.to_string());
                }
            }
        }

        if total > 0 && failures.len() == total {
            return Err(WalletError::Query(failures.join("; ")));
        }
        Ok(events)
    }

    /// Publish to every relay concurrently and wait for all attempts to settle.
    pub async fn publish(&mut self, event: &nostr::Event) -> Vec<(String, Result<()>)> {
        let limit = self.timeout;
        join_all(self.clients.iter_mut().map(|client| async move {
            let url = client.url().to_string();
            let outcome = timeout(limit, async {
                client.connect().await?;
                client.publish_and_confirm(event).await
            })
            .await
            .unwrap_or_else(|_| Err(WalletError::Timeout(url.clone())));
            (url, outcome)
        }))
        .await
    }

    /// Release every connection.
    pub async fn close(mut self) {
        for client in self.clients.iter_mut() {
            client.close().await;
        }
    }
}
