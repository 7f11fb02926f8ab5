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

//! Application state management.

use parking_lot::RwLock;
use std::sync::Arc;

/// Connection status as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Disconnected => "Device Disconnected",
            LinkStatus::Connecting => "Connecting...",
            LinkStatus::Connected => "Device Connected",
            LinkStatus::Error => "Error",
        }
    }
}

/// Shared application state, mirrored from link events for display.
#[derive(Debug)]
pub struct AppState {
    /// Current link status.
    pub link_status: RwLock<LinkStatus>,

    /// Connected device name.
    pub connected_device: RwLock<Option<String>>,

    /// Last reply line received from the MedBox.
    pub last_reply: RwLock<Option<String>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            link_status: RwLock::new(LinkStatus::Disconnected),
            connected_device: RwLock::new(None),
            last_reply: RwLock::new(None),
        }
    }
}

impl AppState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_connecting(&self) {
        *self.link_status.write() = LinkStatus::Connecting;
    }

    pub fn set_connected(&self, device_name: String) {
        *self.link_status.write() = LinkStatus::Connected;
        *self.connected_device.write() = Some(device_name);
    }

    pub fn set_disconnected(&self) {
        *self.link_status.write() = LinkStatus::Disconnected;
        *self.connected_device.write() = None;
    }

    pub fn set_error(&self) {
        *self.link_status.write() = LinkStatus::Error;
    }

    pub fn get_status(&self) -> LinkStatus {
        *self.link_status.read()
    }

    pub fn get_device_name(&self) -> Option<String> {
        self.connected_device.read().clone()
    }

    pub fn set_last_reply(&self, reply: String) {
        *self.last_reply.write() = Some(reply);
    }

    pub fn get_last_reply(&self) -> Option<String> {
        self.last_reply.read().clone()
    }
}
