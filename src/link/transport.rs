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

//! Transport seam: how a resolved peer becomes a byte stream.

use async_trait::async_trait;
use bluer::rfcomm::{SocketAddr, Stream};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use super::catalogue::PeerDescriptor;
use super::error::LinkError;

/// RFCOMM channel serial-bridge modules expose their stream service on.
pub const DEFAULT_RFCOMM_CHANNEL: u8 = 1;

/// Duplex byte stream to the peer.
pub trait LinkStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> LinkStream for T {}

/// Establishes a stream to a resolved peer.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Check that the transport can attempt a connection at all.
    async fn ensure_ready(&self) -> Result<(), LinkError>;

    /// Open a stream to the peer. Suspends until the peer accepts or the
    /// attempt fails; the caller bounds the wait.
    async fn connect(&self, peer: &PeerDescriptor) -> Result<Box<dyn LinkStream>, LinkError>;
}

/// Connector over BlueZ RFCOMM.
pub struct RfcommConnector {
    adapter: bluer::Adapter,
    channel: u8,
}

impl RfcommConnector {
    /// Bring up a BlueZ session on the default adapter.
    pub async fn new(channel: u8) -> Result<Self, LinkError> {
        let session = bluer::Session::new()
            .await
            .map_err(|_| LinkError::Unavailable)?;
        let adapter = session
            .default_adapter()
            .await
            .map_err(|_| LinkError::Unavailable)?;
        info!("Using Bluetooth adapter: {}", adapter.name());
        Ok(Self { adapter, channel })
    }

    pub fn adapter(&self) -> &bluer::Adapter {
        &self.adapter
    }
}

#[async_trait]
impl Connector for RfcommConnector {
    async fn ensure_ready(&self) -> Result<(), LinkError> {
        match self.adapter.is_powered().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(LinkError::Disabled),
            Err(_) => Err(LinkError::Unavailable),
        }
    }

    async fn connect(&self, peer: &PeerDescriptor) -> Result<Box<dyn LinkStream>, LinkError> {
        let address: bluer::Address = peer
            .address
            .parse()
            .map_err(|_| LinkError::TargetNotFound(peer.address.clone()))?;

        debug!("Opening RFCOMM channel {} to {}", self.channel, address);
        let stream = Stream::connect(SocketAddr::new(address, self.channel))
            .await
            .map_err(|e| LinkError::HandshakeFailed(e.to_string()))?;

        Ok(Box::new(stream))
    }
}
