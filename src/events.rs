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

//! Event processing and state mirroring.

use std::sync::Arc;

use tracing::{error, info};

use crate::commands::reply_indicates_success;
use crate::link::{LinkEvent, CONNECTED_STATUS_PREFIX};
use crate::state::AppState;

/// Consumes link events, keeps `AppState` current, and applies the
/// caller-side reply heuristic.
pub struct EventProcessor {
    state: Arc<AppState>,
}

impl EventProcessor {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Process a single event.
    pub fn process_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::StatusChanged(status) => {
                info!("Link status: {}", status);
                if let Some(device) = status.strip_prefix(CONNECTED_STATUS_PREFIX) {
                    self.state.set_connected(device.to_string());
                } else if status.contains("Disconnected") || status.contains("Connection lost") {
                    self.state.set_disconnected();
                }
            }
            LinkEvent::DataReceived(reply) => {
                if reply_indicates_success(&reply) {
                    info!("MedBox acknowledged: {}", reply);
                } else {
                    info!("MedBox replied: {}", reply);
                }
                self.state.set_last_reply(reply);
            }
            LinkEvent::Error(e) => {
                error!("Link error: {}", e);
                self.state.set_error();
            }
            LinkEvent::DevicesFound(peers) => {
                info!("Found {} candidate device(s)", peers.len());
                for peer in &peers {
                    info!("  {} [{}]", peer.display_name(), peer.address);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LinkStatus;

    #[test]
    fn test_connected_status_updates_state() {
        let state = AppState::new();
        let mut processor = EventProcessor::new(state.clone());

        processor.process_event(LinkEvent::StatusChanged(format!(
            "{CONNECTED_STATUS_PREFIX}HC-05"
        )));
        assert_eq!(state.get_status(), LinkStatus::Connected);
        assert_eq!(state.get_device_name(), Some("HC-05".to_string()));

        processor.process_event(LinkEvent::StatusChanged("Connection lost".to_string()));
        assert_eq!(state.get_status(), LinkStatus::Disconnected);
        assert_eq!(state.get_device_name(), None);
    }

    #[test]
    fn test_reply_is_recorded() {
        let state = AppState::new();
        let mut processor = EventProcessor::new(state.clone());

        processor.process_event(LinkEvent::DataReceived("Box1 OK".to_string()));
        assert_eq!(state.get_last_reply(), Some("Box1 OK".to_string()));
    }

    #[test]
    fn test_error_marks_state() {
        let state = AppState::new();
        let mut processor = EventProcessor::new(state.clone());

        processor.process_event(LinkEvent::Error("Connection failed".to_string()));
        assert_eq!(state.get_status(), LinkStatus::Error);
    }
}
