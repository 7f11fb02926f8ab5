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

//! MedBox compartment command protocol.
//!
//! Commands are opaque text lines to the link layer; this module is the
//! caller-side vocabulary. Replies are free-form text with no correlation
//! to commands; success is detected by substring convention only.

use std::fmt;

/// Commands understood by the MedBox firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxCommand {
    /// Light the compartment indicator (medication reminder).
    LedOn(u8),
    LedOff(u8),
    /// Drive the compartment lid actuator.
    Open(u8),
    Close(u8),
}

impl BoxCommand {
    pub fn compartment(&self) -> u8 {
        match *self {
            BoxCommand::LedOn(n)
            | BoxCommand::LedOff(n)
            | BoxCommand::Open(n)
            | BoxCommand::Close(n) => n,
        }
    }

    /// The delayed counterpart the companion schedules after sending this
    /// command: indicators turn themselves off, lids close themselves.
    pub fn follow_up(&self) -> Option<BoxCommand> {
        match *self {
            BoxCommand::LedOn(n) => Some(BoxCommand::LedOff(n)),
            BoxCommand::Open(n) => Some(BoxCommand::Close(n)),
            BoxCommand::LedOff(_) | BoxCommand::Close(_) => None,
        }
    }
}

impl fmt::Display for BoxCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            BoxCommand::LedOn(n) => write!(f, "Box{n}_LED_ON"),
            BoxCommand::LedOff(n) => write!(f, "Box{n}_LED_OFF"),
            BoxCommand::Open(n) => write!(f, "Box{n}_OPEN"),
            BoxCommand::Close(n) => write!(f, "Box{n}_CLOSE"),
        }
    }
}

/// Whether a peer reply signals success, by the ACK/OK convention.
pub fn reply_indicates_success(reply: &str) -> bool {
    reply.contains("ACK") || reply.contains("OK")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(BoxCommand::LedOn(1).to_string(), "Box1_LED_ON");
        assert_eq!(BoxCommand::LedOff(2).to_string(), "Box2_LED_OFF");
        assert_eq!(BoxCommand::Open(3).to_string(), "Box3_OPEN");
        assert_eq!(BoxCommand::Close(4).to_string(), "Box4_CLOSE");
    }

    #[test]
    fn test_follow_ups() {
        assert_eq!(
            BoxCommand::LedOn(1).follow_up(),
            Some(BoxCommand::LedOff(1))
        );
        assert_eq!(BoxCommand::Open(2).follow_up(), Some(BoxCommand::Close(2)));
        assert_eq!(BoxCommand::LedOff(1).follow_up(), None);
        assert_eq!(BoxCommand::Close(2).follow_up(), None);
    }

    #[test]
    fn test_reply_success_heuristic() {
        assert!(reply_indicates_success("OK"));
        assert!(reply_indicates_success("Box1 ACK"));
        assert!(reply_indicates_success("SERVO OK DONE"));
        assert!(!reply_indicates_success("error: jammed"));
        // Case-sensitive by convention: the firmware replies in caps.
        assert!(!reply_indicates_success("ok"));
    }
}
