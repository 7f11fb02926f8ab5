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

//! Device link module.
//!
//! Manages the single Bluetooth serial connection to the MedBox: peer
//! discovery over the paired catalogue, connection lifecycle, and the
//! line-oriented event stream.

mod catalogue;
mod error;
mod events;
mod manager;
pub mod matcher;
mod transport;

pub use catalogue::{BluezCatalogue, Catalogue, PeerDescriptor, StaticCatalogue};
pub use error::{LinkError, LinkResult};
pub use events::{EventBus, LinkEvent, CONNECTED_STATUS_PREFIX};
pub use manager::{LinkManager, LinkState, DEFAULT_HANDSHAKE_TIMEOUT};
pub use transport::{Connector, LinkStream, RfcommConnector, DEFAULT_RFCOMM_CHANNEL};
