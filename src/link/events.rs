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

//! Link event bus.
//!
//! A broadcast channel so UI, logger, and test harness can observe the
//! link independently. Delivery preserves producer order per worker; a
//! slow subscriber lags and drops, it never blocks the link.

use tokio::sync::broadcast;

use super::catalogue::PeerDescriptor;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Prefix of the status line announcing a live connection; the peer's
/// display name follows. Shared with consumers that mirror the status.
pub const CONNECTED_STATUS_PREFIX: &str = "Connected to MedBox: ";

/// Events emitted by the link manager.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// Human-readable status string, emitted on every transition boundary.
    StatusChanged(String),
    /// Trimmed text line received from the MedBox while connected.
    DataReceived(String),
    /// Human-readable failure description.
    Error(String),
    /// A discovery scan yielded candidate peers.
    DevicesFound(Vec<PeerDescriptor>),
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LinkEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.tx.subscribe()
    }

    pub(crate) fn emit(&self, event: LinkEvent) {
        // Fails only when nobody is subscribed, which is fine.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
