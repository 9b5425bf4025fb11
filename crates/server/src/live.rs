// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live change propagation for viewers.
//!
//! Committed row changes are published by the persistence layer into a
//! [`ChangeHub`] and fanned out to every connected viewer over WebSocket.
//! Each viewer scopes its stream to a set of operation ids. Updates are
//! informational only: clients still query canonical state over HTTP.
//!
//! # Delivery rules
//!
//! - Only changes to watched operations are forwarded
//! - Bursts for the same operation are coalesced behind a short debounce
//! - A hidden viewer only receives `Delete` class changes
//! - A low-frequency poll catches writes the notification channel missed
//! - Failures are logged and counted, never sent to the viewer

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{
    SinkExt,
    stream::{SplitSink, StreamExt},
};
use muster_persistence::{
    ChangeKind, ChangeNotification, ChangeSink, ChangeTable, Persistence, PersistenceError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::{Mutex, broadcast, broadcast::error::RecvError};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::AppState;

/// Tuning for the live change stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveConfig {
    /// How long a change waits for further changes to the same operation.
    pub debounce: Duration,
    /// How often the fallback poll runs for a visible viewer.
    pub poll_interval: Duration,
    /// How far back the fallback poll looks for stamped writes.
    pub recent_window: Duration,
    /// Capacity of the shared notification channel.
    pub buffer: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(50),
            poll_interval: Duration::from_secs(5),
            recent_window: Duration::from_secs(10),
            buffer: 256,
        }
    }
}

/// Errors raised while serving a live stream.
#[derive(Debug, Error)]
pub enum LiveError {
    #[error("invalid live message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("websocket transport failed: {0}")]
    Transport(#[from] axum::Error),
    #[error("change poll failed: {0}")]
    Poll(#[from] PersistenceError),
}

/// Shared fan-out point between the persistence layer and viewers.
///
/// Registered with the persistence adapter as its [`ChangeSink`].
#[derive(Debug)]
pub struct ChangeHub {
    tx: broadcast::Sender<ChangeNotification>,
}

impl ChangeHub {
    /// Creates a hub whose channel holds up to `buffer` undelivered changes.
    ///
    /// Viewers that fall further behind observe a lag and resynchronize.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        let (tx, _rx) = broadcast::channel(buffer.max(1));
        Self { tx }
    }

    /// Subscribes to all future changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotification> {
        self.tx.subscribe()
    }

    /// Returns the number of connected subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl ChangeSink for ChangeHub {
    fn publish(&self, change: &ChangeNotification) {
        match self.tx.send(*change) {
            Ok(receivers) => {
                debug!(
                    operation_id = change.operation_id,
                    table = ?change.table,
                    kind = ?change.kind,
                    receivers,
                    "Published change"
                );
            }
            Err(_) => {
                // Nobody is watching.
                debug!(operation_id = change.operation_id, "No viewers for change");
            }
        }
    }
}

/// Messages a viewer may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Replaces the set of watched operations.
    Watch { operation_ids: Vec<i64> },
    /// Reports whether the viewer is currently on screen.
    Visibility { visible: bool },
}

/// What triggered an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    Notification,
    Poll,
    Resync,
}

/// Messages pushed to a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once after the upgrade completes.
    Connected { timestamp: OffsetDateTime },
    /// A watched operation changed and should be refetched.
    OperationChanged {
        operation_id: i64,
        source: UpdateSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table: Option<ChangeTable>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<ChangeKind>,
    },
}

impl ServerMessage {
    const fn resync(operation_id: i64, source: UpdateSource) -> Self {
        Self::OperationChanged {
            operation_id,
            source,
            table: None,
            kind: None,
        }
    }
}

/// Health counters for one viewer subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionHealth {
    /// Consecutive fallback poll failures. Reset by a successful poll.
    pub retry_count: u32,
    /// Changes dropped because the viewer fell behind the channel.
    pub lagged_changes: u64,
    /// Viewer messages that could not be decoded.
    pub rejected_messages: u64,
    /// Updates sent to the viewer.
    pub dispatched: u64,
    /// Commit time of the last change accepted for this viewer.
    pub last_event_at: Option<OffsetDateTime>,
    /// When the last successful poll ran.
    pub last_poll_at: Option<OffsetDateTime>,
}

impl SubscriptionHealth {
    pub const fn record_poll_success(&mut self, at: OffsetDateTime) {
        self.retry_count = 0;
        self.last_poll_at = Some(at);
    }

    pub const fn record_poll_failure(&mut self) {
        self.retry_count = self.retry_count.saturating_add(1);
    }

    pub const fn record_rejected_message(&mut self) {
        self.rejected_messages = self.rejected_messages.saturating_add(1);
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingUpdate {
    due: Instant,
    table: ChangeTable,
    kind: ChangeKind,
}

/// Per-viewer filtering and debounce state.
///
/// Pure bookkeeping: the socket loop feeds it inputs and sends whatever it
/// hands back.
#[derive(Debug, Clone)]
pub struct Subscription {
    watched: BTreeSet<i64>,
    visible: bool,
    pending: BTreeMap<i64, PendingUpdate>,
    resync: BTreeSet<i64>,
    health: SubscriptionHealth,
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

impl Subscription {
    /// A visible viewer watching nothing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            watched: BTreeSet::new(),
            visible: true,
            pending: BTreeMap::new(),
            resync: BTreeSet::new(),
            health: SubscriptionHealth {
                retry_count: 0,
                lagged_changes: 0,
                rejected_messages: 0,
                dispatched: 0,
                last_event_at: None,
                last_poll_at: None,
            },
        }
    }

    #[must_use]
    pub const fn health(&self) -> &SubscriptionHealth {
        &self.health
    }

    pub const fn health_mut(&mut self) -> &mut SubscriptionHealth {
        &mut self.health
    }

    /// The watched operation ids in ascending order.
    #[must_use]
    pub fn watched_ids(&self) -> Vec<i64> {
        self.watched.iter().copied().collect()
    }

    /// Whether the fallback poll should run for this viewer.
    #[must_use]
    pub fn should_poll(&self) -> bool {
        self.visible && !self.watched.is_empty()
    }

    /// Applies a viewer message.
    ///
    /// Returning to view schedules a refresh of every watched operation,
    /// since non-delete changes were suppressed while hidden.
    pub fn handle_client_message(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::Watch { operation_ids } => {
                self.watched = operation_ids.into_iter().collect();
                let watched: &BTreeSet<i64> = &self.watched;
                self.pending.retain(|id, _| watched.contains(id));
                self.resync.retain(|id| watched.contains(id));
                debug!(watched = ?self.watched, "Viewer watch set replaced");
            }
            ClientMessage::Visibility { visible } => {
                if visible && !self.visible {
                    self.resync.extend(self.watched.iter().copied());
                }
                self.visible = visible;
                debug!(visible, "Viewer visibility changed");
            }
        }
    }

    /// Considers a committed change for this viewer.
    ///
    /// Returns `true` when an update was scheduled.
    pub fn observe(
        &mut self,
        change: &ChangeNotification,
        now: Instant,
        debounce: Duration,
    ) -> bool {
        if !self.watched.contains(&change.operation_id) {
            return false;
        }
        if !self.visible && !change.is_delete() {
            return false;
        }

        self.health.last_event_at = Some(change.at);
        let due: Instant = now + debounce;
        self.pending
            .entry(change.operation_id)
            .and_modify(|pending| {
                // A delete in the burst outranks later inserts or updates.
                if !matches!(pending.kind, ChangeKind::Delete) {
                    pending.kind = change.kind;
                    pending.table = change.table;
                }
            })
            .or_insert(PendingUpdate {
                due,
                table: change.table,
                kind: change.kind,
            });
        true
    }

    /// Records a channel lag and schedules a refresh of everything watched.
    pub fn record_lag(&mut self, skipped: u64) {
        self.health.lagged_changes = self.health.lagged_changes.saturating_add(skipped);
        self.resync.extend(self.watched.iter().copied());
    }

    /// The earliest instant at which an update becomes deliverable.
    #[must_use]
    pub fn next_due(&self, now: Instant) -> Option<Instant> {
        if !self.resync.is_empty() {
            return Some(now);
        }
        self.pending.values().map(|pending| pending.due).min()
    }

    /// Removes and returns every update that is due at `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<ServerMessage> {
        let mut messages: Vec<ServerMessage> = Vec::new();

        let due_ids: Vec<i64> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.due <= now)
            .map(|(id, _)| *id)
            .collect();
        for operation_id in due_ids {
            if let Some(pending) = self.pending.remove(&operation_id) {
                self.resync.remove(&operation_id);
                messages.push(ServerMessage::OperationChanged {
                    operation_id,
                    source: UpdateSource::Notification,
                    table: Some(pending.table),
                    kind: Some(pending.kind),
                });
            }
        }

        let resync: BTreeSet<i64> = std::mem::take(&mut self.resync);
        messages.extend(
            resync
                .into_iter()
                .filter(|id| !self.pending.contains_key(id))
                .map(|id| ServerMessage::resync(id, UpdateSource::Resync)),
        );

        self.health.dispatched = self
            .health
            .dispatched
            .saturating_add(u64::try_from(messages.len()).unwrap_or(u64::MAX));
        messages
    }

    /// Turns a poll result into updates.
    ///
    /// Operations with a notification already in flight are skipped.
    pub fn observe_poll(
        &mut self,
        changed: &BTreeSet<i64>,
        at: OffsetDateTime,
    ) -> Vec<ServerMessage> {
        self.health.record_poll_success(at);
        let messages: Vec<ServerMessage> = changed
            .iter()
            .filter(|id| self.watched.contains(id) && !self.pending.contains_key(id))
            .map(|id| ServerMessage::resync(*id, UpdateSource::Poll))
            .collect();
        self.health.dispatched = self
            .health
            .dispatched
            .saturating_add(u64::try_from(messages.len()).unwrap_or(u64::MAX));
        messages
    }
}

/// Decodes a viewer text frame.
///
/// # Errors
///
/// Returns [`LiveError::Json`] if the frame is not a known message.
pub fn decode_client_message(text: &str) -> Result<ClientMessage, LiveError> {
    Ok(serde_json::from_str(text)?)
}

/// Asks the store which watched operations were written to recently.
///
/// # Errors
///
/// Returns [`LiveError::Poll`] if the scan fails.
pub async fn poll_recent_changes(
    persistence: &Mutex<Persistence>,
    operation_ids: &[i64],
    recent_window: Duration,
) -> Result<BTreeSet<i64>, LiveError> {
    let since: OffsetDateTime = OffsetDateTime::now_utc() - recent_window;
    let mut persistence = persistence.lock().await;
    Ok(persistence.operations_changed_since(since, operation_ids)?)
}

type ViewerSink = SplitSink<WebSocket, Message>;

async fn send_all(sender: &mut ViewerSink, messages: &[ServerMessage]) -> Result<(), LiveError> {
    for message in messages {
        let json: String = serde_json::to_string(message)?;
        sender.send(Message::Text(json.into())).await?;
    }
    Ok(())
}

/// Handler for GET `/live`.
///
/// Upgrades the connection and streams change updates until the viewer
/// disconnects.
pub async fn live_handler(
    ws: WebSocketUpgrade,
    AxumState(app_state): AxumState<AppState>,
) -> Response {
    debug!(
        viewers = app_state.hub.receiver_count(),
        "Upgrading live change stream connection"
    );
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    info!("Viewer connected to live change stream");

    let config: LiveConfig = app_state.live;
    let (mut sender, mut receiver) = socket.split();
    let mut changes: broadcast::Receiver<ChangeNotification> = app_state.hub.subscribe();
    let mut subscription: Subscription = Subscription::new();

    let mut poll = tokio::time::interval(config.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately and there is nothing to poll yet.
    poll.tick().await;

    let connected: ServerMessage = ServerMessage::Connected {
        timestamp: OffsetDateTime::now_utc(),
    };
    if let Err(error) = send_all(&mut sender, &[connected]).await {
        warn!(%error, "Failed to send connection confirmation");
        return;
    }

    loop {
        let next_due: Option<Instant> = subscription.next_due(Instant::now());
        let deadline: tokio::time::Instant =
            tokio::time::Instant::from_std(next_due.unwrap_or_else(Instant::now));

        let outgoing: Vec<ServerMessage> = tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match decode_client_message(text.as_str()) {
                        Ok(message) => subscription.handle_client_message(message),
                        Err(error) => {
                            subscription.health_mut().record_rejected_message();
                            warn!(%error, "Ignoring viewer message");
                        }
                    }
                    Vec::new()
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("Viewer closed the stream");
                    break;
                }
                Some(Ok(_)) => Vec::new(),
                Some(Err(error)) => {
                    warn!(%error, "WebSocket receive error");
                    break;
                }
            },
            received = changes.recv() => match received {
                Ok(change) => {
                    subscription.observe(&change, Instant::now(), config.debounce);
                    Vec::new()
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Viewer lagged behind the change channel");
                    subscription.record_lag(skipped);
                    Vec::new()
                }
                Err(RecvError::Closed) => {
                    debug!("Change channel closed");
                    break;
                }
            },
            _ = poll.tick() => {
                if subscription.should_poll() {
                    let watched: Vec<i64> = subscription.watched_ids();
                    let polled: Result<BTreeSet<i64>, LiveError> = poll_recent_changes(
                        &app_state.persistence,
                        &watched,
                        config.recent_window,
                    )
                    .await;
                    match polled {
                        Ok(changed) => {
                            subscription.observe_poll(&changed, OffsetDateTime::now_utc())
                        }
                        Err(error) => {
                            subscription.health_mut().record_poll_failure();
                            warn!(
                                %error,
                                retry_count = subscription.health().retry_count,
                                "Fallback poll failed"
                            );
                            Vec::new()
                        }
                    }
                } else {
                    Vec::new()
                }
            },
            () = tokio::time::sleep_until(deadline), if next_due.is_some() => {
                subscription.take_due(Instant::now())
            },
        };

        if outgoing.is_empty() {
            continue;
        }
        if let Err(error) = send_all(&mut sender, &outgoing).await {
            debug!(%error, "Viewer went away while sending");
            break;
        }
    }

    let health: &SubscriptionHealth = subscription.health();
    info!(
        dispatched = health.dispatched,
        lagged = health.lagged_changes,
        rejected = health.rejected_messages,
        "Viewer disconnected from live change stream"
    );
}

/// Builds the hub and persistence adapter pair used by the server.
///
/// # Errors
///
/// Returns an error if the database cannot be opened.
pub fn connect_with_hub(
    database: Option<&str>,
    buffer: usize,
) -> Result<(Persistence, Arc<ChangeHub>), PersistenceError> {
    let hub: Arc<ChangeHub> = Arc::new(ChangeHub::new(buffer));
    let persistence: Persistence = match database {
        Some(path) => {
            info!(path, "Using file-based database");
            Persistence::new_with_file(path)?
        }
        None => {
            info!("Using in-memory database");
            Persistence::new_in_memory()?
        }
    };
    let sink: Arc<dyn ChangeSink> = Arc::<ChangeHub>::clone(&hub);
    Ok((persistence.with_change_sink(sink), hub))
}
