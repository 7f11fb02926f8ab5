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

//! Link failure taxonomy.
//!
//! Every variant carries a display string suitable for direct presentation
//! to the user; the manager performs no localization.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    /// Host transport absent. Fatal for this session, no retry attempted.
    #[error("Bluetooth not supported")]
    Unavailable,

    /// Transport present but turned off. Recovery is caller-driven.
    #[error("Bluetooth is disabled")]
    Disabled,

    /// No peer resolves from the catalogue.
    #[error("Device not found: {0}")]
    TargetNotFound(String),

    /// Connect attempt rejected at the transport layer.
    #[error("Connection failed: {0}")]
    HandshakeFailed(String),

    /// The peer did not accept within the configured bound.
    #[error("Connection timed out after {}s", .0.as_secs())]
    HandshakeTimedOut(Duration),

    /// A command was issued while the link was not connected.
    #[error("Not connected to MedBox")]
    NotConnected,

    /// Write failure while nominally connected. Does not change state.
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LinkResult<T> = Result<T, LinkError>;
