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

//! Paired-device catalogue adapter.

use async_trait::async_trait;
use tracing::{debug, warn};

/// Immutable snapshot of a paired peer from the host catalogue.
///
/// The address is the stable identity key; the name may be absent for
/// peers that never advertised one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDescriptor {
    pub name: Option<String>,
    pub address: String,
}

impl PeerDescriptor {
    pub fn new(name: Option<&str>, address: &str) -> Self {
        Self {
            name: name.map(str::to_string),
            address: address.to_string(),
        }
    }

    /// Name for display, falling back to the address.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }
}

/// Read-only view of the host's paired-device list.
///
/// Listing is infallible: an unavailable or disabled transport yields an
/// empty catalogue, not an error. Absence of peers is a degenerate result
/// set at this layer.
#[async_trait]
pub trait Catalogue: Send + Sync {
    async fn list_paired(&self) -> Vec<PeerDescriptor>;
}

/// Catalogue backed by a BlueZ adapter.
pub struct BluezCatalogue {
    adapter: bluer::Adapter,
}

impl BluezCatalogue {
    pub fn new(adapter: bluer::Adapter) -> Self {
        Self { adapter }
    }
}

#[async_trait]
impl Catalogue for BluezCatalogue {
    async fn list_paired(&self) -> Vec<PeerDescriptor> {
        if !self.adapter.is_powered().await.unwrap_or(false) {
            debug!("Adapter is off, returning empty catalogue");
            return Vec::new();
        }

        let addresses = match self.adapter.device_addresses().await {
            Ok(addresses) => addresses,
            Err(e) => {
                warn!("Failed to enumerate devices: {}", e);
                return Vec::new();
            }
        };

        let mut peers = Vec::new();
        for address in addresses {
            let device = match self.adapter.device(address) {
                Ok(device) => device,
                Err(_) => continue,
            };
            if !device.is_paired().await.unwrap_or(false) {
                continue;
            }
            let name = device.name().await.ok().flatten();
            peers.push(PeerDescriptor {
                name,
                address: address.to_string(),
            });
        }

        debug!("Catalogue holds {} paired peers", peers.len());
        peers
    }
}

/// Fixed catalogue for tests and demos.
pub struct StaticCatalogue {
    peers: Vec<PeerDescriptor>,
}

impl StaticCatalogue {
    pub fn new(peers: Vec<PeerDescriptor>) -> Self {
        Self { peers }
    }
}

#[async_trait]
impl Catalogue for StaticCatalogue {
    async fn list_paired(&self) -> Vec<PeerDescriptor> {
        self.peers.clone()
    }
}
