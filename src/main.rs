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

//! MedBox Desktop Companion

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medbox_desktop::commands::BoxCommand;
use medbox_desktop::config::{Config, DispenserConfig};
use medbox_desktop::events::EventProcessor;
use medbox_desktop::link::{BluezCatalogue, LinkManager, RfcommConnector};
use medbox_desktop::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medbox_desktop=info".parse().unwrap()),
        )
        .init();

    info!(
        "Starting MedBox Companion v{}...",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded");

    // Bring up the Bluetooth link manager
    let connector = RfcommConnector::new(config.bluetooth.channel).await?;
    let catalogue = BluezCatalogue::new(connector.adapter().clone());
    let manager = Arc::new(
        LinkManager::new(Arc::new(connector), Arc::new(catalogue))
            .with_handshake_timeout(config.handshake_timeout()),
    );
    manager.set_target_name(&config.bluetooth.device_name).await;
    manager
        .set_target_address(&config.bluetooth.device_address)
        .await;

    // Create application state and mirror link events into it
    let state = AppState::new();
    let mut events = manager.subscribe();
    let state_events = state.clone();
    tokio::spawn(async move {
        let mut processor = EventProcessor::new(state_events);
        loop {
            match events.recv().await {
                Ok(event) => processor.process_event(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Event subscriber lagged, dropped {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    println!("MedBox Companion ready. Type 'help' for commands.");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_line(&manager, &state, &config.dispenser, line.trim()).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    manager.disconnect().await;
    info!("MedBox Companion stopped");
    Ok(())
}

/// Execute one console command. Returns `false` to quit.
async fn handle_line(
    manager: &Arc<LinkManager>,
    state: &Arc<AppState>,
    dispenser: &DispenserConfig,
    line: &str,
) -> bool {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return true;
    };

    match verb {
        "scan" | "devices" => {
            let found = manager.scan().await;
            if found.is_empty() {
                println!("No MedBox devices found. Please pair a device first.");
            } else {
                println!("Choose which device to connect to:");
                for peer in &found {
                    println!("  {} [{}]", peer.display_name(), peer.address);
                }
            }
        }
        "connect" => {
            if let Some(target) = words.next() {
                // Addresses contain colons; anything else is a name.
                if target.contains(':') {
                    manager.set_target_address(target).await;
                } else {
                    manager.set_target_name(target).await;
                    manager.set_target_address("").await;
                }
            }
            if manager.connect().await.is_ok() {
                state.set_connecting();
                println!("Connecting to MedBox...");
            }
        }
        "disconnect" => {
            manager.disconnect().await;
        }
        "open" | "close" | "led" => {
            match parse_box_command(verb, &mut words) {
                Some(command) => dispatch(manager, dispenser, command).await,
                None => println!("Usage: open N | close N | led N on|off"),
            }
        }
        "send" => {
            let raw = line["send".len()..].trim();
            if raw.is_empty() {
                println!("Usage: send <raw command line>");
            } else {
                let _ = manager.send(raw).await;
            }
        }
        "status" => {
            println!("{}", state.get_status().as_str());
            if let Some(device) = state.get_device_name() {
                println!("Device: {}", device);
            }
            if let Some(reply) = state.get_last_reply() {
                println!("Last reply: {}", reply);
            }
        }
        "help" => {
            println!("Commands:");
            println!("  scan                 list paired MedBox candidates");
            println!("  connect [name|addr]  connect to the MedBox");
            println!("  disconnect           drop the connection");
            println!("  open N / close N     drive compartment N's lid");
            println!("  led N on|off         compartment N's reminder light");
            println!("  send <line>          send a raw command line");
            println!("  status               show link status");
            println!("  quit                 exit");
        }
        "quit" | "exit" => return false,
        other => println!("Unknown command: {other} (try 'help')"),
    }

    true
}

fn parse_box_command<'a>(
    verb: &str,
    words: &mut impl Iterator<Item = &'a str>,
) -> Option<BoxCommand> {
    let compartment: u8 = words.next()?.parse().ok()?;
    match verb {
        "open" => Some(BoxCommand::Open(compartment)),
        "close" => Some(BoxCommand::Close(compartment)),
        "led" => match words.next()? {
            "on" => Some(BoxCommand::LedOn(compartment)),
            "off" => Some(BoxCommand::LedOff(compartment)),
            _ => None,
        },
        _ => None,
    }
}

/// Send a compartment command and schedule its timed follow-up: reminder
/// lights turn themselves off and lids close themselves after the
/// configured delays, matching the dispenser's expected routine.
async fn dispatch(manager: &Arc<LinkManager>, dispenser: &DispenserConfig, command: BoxCommand) {
    if manager.send(&command.to_string()).await.is_err() {
        println!("Please connect to MedBox first");
        return;
    }

    let Some(follow_up) = command.follow_up() else {
        return;
    };
    let delay_secs = match command {
        BoxCommand::LedOn(_) => dispenser.led_auto_off_secs,
        BoxCommand::Open(_) => dispenser.lid_auto_close_secs,
        _ => 0,
    };
    if delay_secs == 0 {
        return;
    }

    let manager = Arc::clone(manager);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        // The link may have dropped meanwhile; the failure is already
        // surfaced as an event.
        if manager.send(&follow_up.to_string()).await.is_ok() {
            info!("Auto follow-up sent: {}", follow_up);
        }
    });
}
