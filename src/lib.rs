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

//! MedBox desktop companion library.
//!
//! The `link` module is the core: the Bluetooth serial connection
//! lifecycle engine. The rest is companion plumbing around it.

pub mod commands;
pub mod config;
pub mod events;
pub mod link;
pub mod state;
