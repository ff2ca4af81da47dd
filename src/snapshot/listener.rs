//! Background listener feeding the snapshot store from account pushes.
//!
//! One task owns the socket and the [`AccountSet`]. Every decoded push is
//! folded into the set and a fresh [`Snapshot`](super::Snapshot) is
//! published. On connection loss the store is marked stale, the task
//! reconnects with full-jitter backoff, resubscribes every watched account
//! and reloads the set once so changes missed during the gap are picked up.
//! Reconnects never give up; once the backoff reaches its cap the task keeps
//! trying at that delay until the node is back or the listener is shut down.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use solana_pubkey::Pubkey;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::error::{SnapshotError, SnapshotResult};
use super::model::AccountSet;
use super::store::SnapshotStore;
use super::subscriptions::SubscriptionManager;
use super::types::{RpcMessage, RpcRequest};
use crate::program::client::Ledger;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Connection timeout duration for WebSocket connections
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Consecutive failed reconnects after which each further failure is
    /// logged as an error
    pub escalate_after: u32,
    /// Base delay for exponential backoff (ms)
    pub base_delay_ms: u64,
    /// Maximum delay for exponential backoff (ms)
    pub max_delay_ms: u64,
    /// Interval for client ping (seconds)
    pub ping_interval_secs: u64,
    /// Connection is considered dead if no pong arrives within this time (seconds)
    pub pong_timeout_secs: u64,
    /// Commitment level requested for pushes
    pub commitment: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            escalate_after: 10,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
            ping_interval_secs: 30,
            pong_timeout_secs: 60,
            commitment: "confirmed".to_string(),
        }
    }
}

impl ListenerConfig {
    /// Full jitter: uniform between 0 and the exponential delay, capped.
    fn reconnect_delay(&self, attempt: u32) -> Duration {
        let max_delay = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let jittered = rand::thread_rng().gen_range(0..=max_delay);
        Duration::from_millis(jittered.min(self.max_delay_ms))
    }
}

enum ListenerCommand {
    Shutdown,
}

/// Handle to the running listener task
pub struct SnapshotListener {
    cmd_tx: mpsc::Sender<ListenerCommand>,
    handle: tokio::task::JoinHandle<()>,
}

impl SnapshotListener {
    /// Connect, subscribe every watched account and spawn the listener task.
    ///
    /// The store should already hold the bootstrap snapshot built from
    /// `accounts`. When `ledger` is given, the account set is reloaded from
    /// it after every reconnect.
    pub async fn start(
        url: &str,
        config: ListenerConfig,
        accounts: AccountSet,
        store: Arc<SnapshotStore>,
        ledger: Option<Arc<dyn Ledger>>,
    ) -> SnapshotResult<Self> {
        let (mut sink, source) = connect(url).await?;
        let mut handler = PushHandler::new(accounts, store);
        subscribe_all(&mut sink, &mut handler.subscriptions, &config.commitment).await?;
        tracing::info!(
            url,
            accounts = handler.subscriptions.watched().len(),
            "Account subscription listener connected"
        );

        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let ctx = ListenerContext {
            url: url.to_string(),
            config,
            handler,
            ledger,
        };
        let handle = tokio::spawn(connection_task(sink, source, cmd_rx, ctx));
        Ok(Self { cmd_tx, handle })
    }

    /// Check if the listener task is still running
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Close the socket and wait for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.cmd_tx.send(ListenerCommand::Shutdown).await;
        let _ = self.handle.await;
    }
}

// ============================================================================
// Push handling
// ============================================================================

/// Folds node messages into the account set and publishes snapshots
pub(crate) struct PushHandler {
    pub(crate) subscriptions: SubscriptionManager,
    pub(crate) accounts: AccountSet,
    store: Arc<SnapshotStore>,
    slot: u64,
    account_slots: HashMap<Pubkey, u64>,
}

impl PushHandler {
    pub(crate) fn new(accounts: AccountSet, store: Arc<SnapshotStore>) -> Self {
        Self {
            subscriptions: SubscriptionManager::new(accounts.watched_accounts()),
            accounts,
            store,
            slot: 0,
            account_slots: HashMap::new(),
        }
    }

    /// Handle one text frame. Malformed pushes are logged and dropped; the
    /// last good snapshot stays published.
    pub(crate) fn handle_message(&mut self, text: &str) {
        let message: RpcMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping unparseable push");
                return;
            }
        };

        match message {
            RpcMessage::Response(response) => {
                if let Some(error) = response.error {
                    let pubkey = self.subscriptions.reject(response.id);
                    tracing::warn!(
                        request_id = response.id,
                        account = ?pubkey,
                        error = %SnapshotError::SubscriptionFailed(error.message),
                        "Subscription refused"
                    );
                } else if let Some(subscription) = response.result.as_ref().and_then(|v| v.as_u64()) {
                    if let Some(pubkey) = self.subscriptions.confirm(response.id, subscription) {
                        tracing::debug!(account = %pubkey, subscription, "Subscribed");
                    }
                }
            }
            RpcMessage::Notification(note) if note.method == "accountNotification" => {
                let subscription = note.params.subscription;
                let Some(pubkey) = self.subscriptions.account_for(subscription) else {
                    tracing::debug!(subscription, "Push for unknown subscription");
                    return;
                };
                let slot = note.params.result.context.slot;
                if self.account_slots.get(&pubkey).is_some_and(|last| slot < *last) {
                    tracing::debug!(account = %pubkey, slot, "Dropping out-of-order push");
                    return;
                }
                let data = match note.params.result.value.decode() {
                    Ok(data) => data,
                    Err(e) => {
                        tracing::warn!(account = %pubkey, error = %e, "Dropping undecodable push");
                        return;
                    }
                };
                match self.accounts.apply(&pubkey, &data) {
                    Ok(true) => {
                        self.account_slots.insert(pubkey, slot);
                        self.slot = self.slot.max(slot);
                        self.store.publish(self.accounts.to_snapshot(self.slot));
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(account = %pubkey, error = %e, "Dropping malformed account push");
                    }
                }
            }
            RpcMessage::Notification(note) => {
                tracing::debug!(method = %note.method, "Ignoring notification");
            }
        }
    }

    /// Replace the account set with a fresh load and publish it.
    fn reload(&mut self, accounts: AccountSet) {
        self.accounts = accounts;
        self.store.publish(self.accounts.to_snapshot(self.slot));
    }
}

// ============================================================================
// Connection task
// ============================================================================

struct ListenerContext {
    url: String,
    config: ListenerConfig,
    handler: PushHandler,
    ledger: Option<Arc<dyn Ledger>>,
}

enum LoopExit {
    Shutdown,
    Lost(String),
}

async fn connect(url: &str) -> SnapshotResult<(WsSink, WsSource)> {
    let (stream, _) = tokio::time::timeout(CONNECTION_TIMEOUT, connect_async(url))
        .await
        .map_err(|_| SnapshotError::Timeout)?
        .map_err(SnapshotError::from)?;
    Ok(stream.split())
}

async fn subscribe_all(
    sink: &mut WsSink,
    subscriptions: &mut SubscriptionManager,
    commitment: &str,
) -> SnapshotResult<()> {
    for (id, pubkey) in subscriptions.begin_resubscribe() {
        let request = RpcRequest::account_subscribe(id, &pubkey, commitment);
        let json = serde_json::to_string(&request)?;
        sink.send(Message::Text(json.into())).await?;
    }
    Ok(())
}

async fn connection_task(
    mut sink: WsSink,
    mut source: WsSource,
    mut cmd_rx: mpsc::Receiver<ListenerCommand>,
    mut ctx: ListenerContext,
) {
    loop {
        match session_loop(&mut sink, &mut source, &mut cmd_rx, &mut ctx).await {
            LoopExit::Shutdown => {
                let _ = sink
                    .send(Message::Close(Some(CloseFrame {
                        code: tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode::Normal,
                        reason: "Client disconnect".into(),
                    })))
                    .await;
                tracing::info!("Account subscription listener stopped");
                return;
            }
            LoopExit::Lost(reason) => {
                ctx.handler.store.mark_stale();
                tracing::warn!(%reason, "Account subscription lost, serving stale snapshot");
                match reconnect(&mut ctx, &mut cmd_rx).await {
                    Some((new_sink, new_source)) => {
                        sink = new_sink;
                        source = new_source;
                    }
                    None => {
                        tracing::info!("Account subscription listener stopped while reconnecting");
                        return;
                    }
                }
            }
        }
    }
}

/// Pump one connection until it drops or a shutdown is requested.
async fn session_loop(
    sink: &mut WsSink,
    source: &mut WsSource,
    cmd_rx: &mut mpsc::Receiver<ListenerCommand>,
    ctx: &mut ListenerContext,
) -> LoopExit {
    let pong_timeout = Duration::from_secs(ctx.config.pong_timeout_secs);
    let mut ping_interval = interval(Duration::from_secs(ctx.config.ping_interval_secs));
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_pong = Instant::now();
    let mut awaiting_pong = false;

    loop {
        tokio::select! {
            msg = source.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => ctx.handler.handle_message(text.as_str()),
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sink.send(Message::Pong(data)).await {
                            tracing::warn!("Failed to send pong: {}", e);
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        last_pong = Instant::now();
                        awaiting_pong = false;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .as_ref()
                            .map(|f| format!("code: {}, reason: {}", f.code, f.reason))
                            .unwrap_or_else(|| "no reason".to_string());
                        return LoopExit::Lost(reason);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return LoopExit::Lost(SnapshotError::from(e).to_string()),
                    None => return LoopExit::Lost("Stream ended".to_string()),
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ListenerCommand::Shutdown) | None => return LoopExit::Shutdown,
                }
            }

            _ = ping_interval.tick() => {
                if awaiting_pong && last_pong.elapsed() > pong_timeout {
                    return LoopExit::Lost(SnapshotError::PingTimeout.to_string());
                }
                if let Err(e) = sink.send(Message::Ping(Vec::new().into())).await {
                    tracing::warn!("Failed to send periodic ping: {}", e);
                } else {
                    awaiting_pong = true;
                }
            }
        }
    }
}

/// Reconnect with backoff, resubscribe and resynchronise.
///
/// Returns `None` only when a shutdown arrives while waiting.
async fn reconnect(
    ctx: &mut ListenerContext,
    cmd_rx: &mut mpsc::Receiver<ListenerCommand>,
) -> Option<(WsSink, WsSource)> {
    let mut attempt = 0u32;
    loop {
        attempt = attempt.saturating_add(1);
        let delay = ctx.config.reconnect_delay(attempt);
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting account subscription");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            cmd = cmd_rx.recv() => match cmd {
                Some(ListenerCommand::Shutdown) | None => return None,
            },
        }

        let result = match connect(&ctx.url).await {
            Ok((mut sink, source)) => {
                subscribe_all(&mut sink, &mut ctx.handler.subscriptions, &ctx.config.commitment)
                    .await
                    .map(|()| (sink, source))
            }
            Err(e) => Err(e),
        };
        let (sink, source) = match result {
            Ok(pair) => pair,
            Err(e) if attempt >= ctx.config.escalate_after => {
                tracing::error!(attempt, error = %e, "Reconnect failed, still serving stale snapshot");
                continue;
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Reconnect failed");
                continue;
            }
        };

        if let Some(ledger) = &ctx.ledger {
            let state_key = ctx.handler.accounts.state_key;
            let margin_key = ctx.handler.accounts.margin_key;
            match AccountSet::load(ledger.as_ref(), state_key, margin_key).await {
                Ok(accounts) => ctx.handler.reload(accounts),
                Err(e) => tracing::warn!(error = %e, "Resync after reconnect failed, waiting for pushes"),
            }
        }

        tracing::info!(attempt, "Account subscription re-established");
        return Some((sink, source));
    }
}
