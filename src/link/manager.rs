// Copyright 2026 MedBox Companion Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Connection lifecycle engine for the MedBox link.
//!
//! One coordinating owner plus two transient workers: a handshake task
//! that lives only while `Connecting` and a read loop that lives only
//! while `Connected`. Transitions are serialized through a single mutex;
//! workers carry a generation number and stand down silently when a later
//! `connect` or `disconnect` has superseded them. Events are never
//! delivered while the state lock is held.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::time;
use tracing::{debug, error, info, warn};

use super::catalogue::{Catalogue, PeerDescriptor};
use super::error::LinkError;
use super::events::{EventBus, LinkEvent};
use super::matcher;
use super::transport::{Connector, LinkStream};

/// Bound on the handshake wait unless overridden.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(20);

/// Inbound framing buffer size.
const READ_BUFFER_BYTES: usize = 1024;

/// Lifecycle state of the single peer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Connecting,
    Connected,
}

struct Inner {
    state: LinkState,
    /// Bumped on every connect/disconnect; stale workers compare and stand down.
    generation: u64,
    peer: Option<PeerDescriptor>,
    writer: Option<WriteHalf<Box<dyn LinkStream>>>,
    cancel: Option<watch::Sender<bool>>,
    target_name: String,
    target_address: String,
}

impl Inner {
    /// Cancel any in-flight handshake and release the active stream.
    /// Emits nothing; the caller decides which event the edge deserves.
    fn teardown(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(true);
        }
        self.writer = None;
        self.peer = None;
    }
}

/// Manager for the single MedBox connection.
pub struct LinkManager {
    connector: Arc<dyn Connector>,
    catalogue: Arc<dyn Catalogue>,
    events: EventBus,
    handshake_timeout: Option<Duration>,
    inner: Arc<Mutex<Inner>>,
    /// Serializes senders among themselves. Never taken by `disconnect`,
    /// so a stalled write cannot block cancellation.
    send_lock: Mutex<()>,
}

impl LinkManager {
    pub fn new(connector: Arc<dyn Connector>, catalogue: Arc<dyn Catalogue>) -> Self {
        Self {
            connector,
            catalogue,
            events: EventBus::new(),
            handshake_timeout: Some(DEFAULT_HANDSHAKE_TIMEOUT),
            inner: Arc::new(Mutex::new(Inner {
                state: LinkState::Idle,
                generation: 0,
                peer: None,
                writer: None,
                cancel: None,
                target_name: matcher::DEFAULT_TARGET_NAME.to_string(),
                target_address: String::new(),
            })),
            send_lock: Mutex::new(()),
        }
    }

    /// Bound the handshake wait; `None` waits until the transport gives up.
    pub fn with_handshake_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Subscribe to link events. Any number of independent subscribers.
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> LinkState {
        self.inner.lock().await.state
    }

    pub async fn is_connected(&self) -> bool {
        self.state().await == LinkState::Connected
    }

    /// Peer of the current connection or attempt, if any.
    pub async fn peer(&self) -> Option<PeerDescriptor> {
        self.inner.lock().await.peer.clone()
    }

    pub async fn set_target_name(&self, name: &str) {
        self.inner.lock().await.target_name = name.to_string();
    }

    pub async fn set_target_address(&self, address: &str) {
        self.inner.lock().await.target_address = address.to_string();
    }

    /// Scan the paired catalogue for MedBox candidates.
    ///
    /// Emits `DevicesFound` when the scan yields at least one candidate
    /// (which, per the matcher's fallback policy, is whenever the
    /// catalogue itself is non-empty).
    pub async fn scan(&self) -> Vec<PeerDescriptor> {
        let catalogue = self.catalogue.list_paired().await;
        let candidates = matcher::find_candidates(&catalogue);
        if !candidates.is_empty() {
            self.events
                .emit(LinkEvent::DevicesFound(candidates.clone()));
        }
        candidates
    }

    /// Connect to the configured target.
    ///
    /// Resolves the target from the paired catalogue, tears down any
    /// in-flight attempt or live connection, and starts a fresh handshake.
    /// Returns `Err` (and emits `Error`) when the transport is unusable or
    /// no target resolves; the handshake outcome itself arrives as an
    /// event.
    pub async fn connect(&self) -> Result<(), LinkError> {
        if let Err(e) = self.connector.ensure_ready().await {
            warn!("Transport not ready: {}", e);
            self.events.emit(LinkEvent::Error(e.to_string()));
            return Err(e);
        }

        let (preferred_name, preferred_address) = {
            let inner = self.inner.lock().await;
            (inner.target_name.clone(), inner.target_address.clone())
        };

        let catalogue = self.catalogue.list_paired().await;
        let Some(peer) = matcher::resolve_target(&catalogue, &preferred_name, &preferred_address)
        else {
            let e = LinkError::TargetNotFound(preferred_name);
            warn!("{}", e);
            self.events.emit(LinkEvent::Error(e.to_string()));
            return Err(e);
        };

        self.start_attempt(peer).await;
        Ok(())
    }

    /// Connect to a specific catalogue entry, remembering it as the
    /// preferred target for later reconnects.
    pub async fn connect_to(&self, peer: &PeerDescriptor) -> Result<(), LinkError> {
        {
            let mut inner = self.inner.lock().await;
            inner.target_name = peer.name.clone().unwrap_or_default();
            inner.target_address = peer.address.clone();
        }
        self.connect().await
    }

    /// Send one command line. Fails fast unless `Connected`; a write
    /// failure emits `Error` but does not tear down the read path.
    ///
    /// The write itself runs outside the state mutex, racing the
    /// attempt's cancel signal, so `disconnect()` stays prompt even when
    /// the peer has stopped draining and the write pends.
    pub async fn send(&self, command: &str) -> Result<(), LinkError> {
        let _sending = self.send_lock.lock().await;

        // Check out the writer under the lock, write without it.
        let mut inner = self.inner.lock().await;
        if inner.state != LinkState::Connected {
            drop(inner);
            let e = LinkError::NotConnected;
            warn!("Dropping command {:?}: {}", command, e);
            self.events.emit(LinkEvent::Error(e.to_string()));
            return Err(e);
        }
        let writer = inner.writer.take();
        let cancel = inner.cancel.as_ref().map(|tx| tx.subscribe());
        let generation = inner.generation;
        drop(inner);

        let (Some(mut writer), Some(mut cancel)) = (writer, cancel) else {
            let e = LinkError::NotConnected;
            warn!("Dropping command {:?}: {}", command, e);
            self.events.emit(LinkEvent::Error(e.to_string()));
            return Err(e);
        };

        let line = format!("{command}\n");
        let outcome = tokio::select! {
            _ = cancel.changed() => None,
            result = async {
                writer.write_all(line.as_bytes()).await?;
                writer.flush().await?;
                Ok::<(), std::io::Error>(())
            } => Some(result),
        };

        let Some(result) = outcome else {
            // Torn down mid-write; this half is the last handle on the
            // stream, dropping it completes the release.
            drop(writer);
            let e = LinkError::NotConnected;
            warn!("Dropping command {:?}: link closed during send", command);
            self.events.emit(LinkEvent::Error(e.to_string()));
            return Err(e);
        };

        // Restore the writer unless the link moved on meanwhile.
        {
            let mut inner = self.inner.lock().await;
            if inner.generation == generation && inner.state == LinkState::Connected {
                inner.writer = Some(writer);
            }
        }

        match result {
            Ok(()) => {
                debug!("Command sent: {}", command);
                Ok(())
            }
            Err(e) => {
                // A single write hiccup must not kill a healthy read path.
                let e = LinkError::SendFailed(e.to_string());
                error!("{}", e);
                self.events.emit(LinkEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Drop the connection or abandon the in-flight handshake.
    /// Idempotent: a no-op while `Idle`, with no event.
    pub async fn disconnect(&self) {
        {
            let mut inner = self.inner.lock().await;
            if inner.state == LinkState::Idle {
                return;
            }
            inner.teardown();
            inner.generation += 1;
            inner.state = LinkState::Idle;
        }
        info!("Disconnected by request");
        self.events
            .emit(LinkEvent::StatusChanged("Disconnected".to_string()));
    }

    /// Supersede whatever is in flight and begin a fresh attempt.
    async fn start_attempt(&self, peer: PeerDescriptor) {
        let (generation, cancel_rx) = {
            let mut inner = self.inner.lock().await;
            inner.teardown();
            inner.generation += 1;
            inner.state = LinkState::Connecting;
            inner.peer = Some(peer.clone());

            let (cancel_tx, cancel_rx) = watch::channel(false);
            inner.cancel = Some(cancel_tx);
            (inner.generation, cancel_rx)
        };

        info!("Connecting to {} [{}]", peer.display_name(), peer.address);

        let connector = Arc::clone(&self.connector);
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        let timeout = self.handshake_timeout;
        tokio::spawn(async move {
            Self::handshake_task(connector, inner, events, peer, generation, cancel_rx, timeout)
                .await;
        });
    }

    /// Worker for the `Connecting` phase.
    async fn handshake_task(
        connector: Arc<dyn Connector>,
        inner: Arc<Mutex<Inner>>,
        events: EventBus,
        peer: PeerDescriptor,
        generation: u64,
        mut cancel: watch::Receiver<bool>,
        timeout: Option<Duration>,
    ) {
        let connect = async {
            match timeout {
                Some(bound) => match time::timeout(bound, connector.connect(&peer)).await {
                    Ok(result) => result,
                    Err(_) => Err(LinkError::HandshakeTimedOut(bound)),
                },
                None => connector.connect(&peer).await,
            }
        };

        let result = tokio::select! {
            _ = cancel.changed() => {
                debug!("Handshake to {} abandoned", peer.address);
                return;
            }
            result = connect => result,
        };

        match result {
            Ok(stream) => {
                let display_name = peer.display_name().to_string();
                {
                    let mut guard = inner.lock().await;
                    if guard.generation != generation {
                        // Superseded while the peer was accepting; the new
                        // attempt owns the link now.
                        debug!("Discarding stale connection to {}", peer.address);
                        return;
                    }

                    let (read_half, write_half) = tokio::io::split(stream);
                    guard.writer = Some(write_half);
                    guard.state = LinkState::Connected;

                    let inner = Arc::clone(&inner);
                    let events = events.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        Self::read_loop(read_half, inner, events, generation, cancel).await;
                    });
                }
                info!("Connected to {}", display_name);
                events.emit(LinkEvent::StatusChanged(format!(
                    "{}{display_name}",
                    super::events::CONNECTED_STATUS_PREFIX
                )));
            }
            Err(e) => {
                {
                    let mut guard = inner.lock().await;
                    if guard.generation != generation {
                        return;
                    }
                    guard.teardown();
                    guard.state = LinkState::Idle;
                }
                warn!("Connection to {} failed: {}", peer.address, e);
                events.emit(LinkEvent::Error(e.to_string()));
            }
        }
    }

    /// Worker for the `Connected` phase. Sole owner of the read half;
    /// frames inbound bytes into trimmed lines and forwards them.
    async fn read_loop(
        read_half: ReadHalf<Box<dyn LinkStream>>,
        inner: Arc<Mutex<Inner>>,
        events: EventBus,
        generation: u64,
        mut cancel: watch::Receiver<bool>,
    ) {
        let mut reader = BufReader::with_capacity(READ_BUFFER_BYTES, read_half);
        let mut line = String::new();

        loop {
            line.clear();

            let read = tokio::select! {
                _ = cancel.changed() => {
                    debug!("Read loop stopped");
                    return;
                }
                read = reader.read_line(&mut line) => read,
            };

            match read {
                Ok(0) => {
                    info!("Connection closed by remote");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        debug!("Received: {}", trimmed);
                        events.emit(LinkEvent::DataReceived(trimmed.to_string()));
                    }
                }
                Err(e) => {
                    error!("Read error: {}", e);
                    break;
                }
            }
        }

        // Read failure or EOF after a successful handshake: an expected
        // operational event, surfaced as a status, not an error.
        {
            let mut guard = inner.lock().await;
            if guard.generation != generation {
                return;
            }
            guard.teardown();
            guard.state = LinkState::Idle;
        }
        events.emit(LinkEvent::StatusChanged("Connection lost".to_string()));
    }
}
