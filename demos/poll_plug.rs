// SPDX-License-Identifier: MPL-2.0

//! Plug polling example.
//!
//! Sets up a coordinator for one Edimax plug, prints its entities and then
//! prints every snapshot for two polling intervals.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example poll_plug -- <host> [username] [password]
//! cargo run --example poll_plug -- --mock
//! ```
//!
//! # Example
//!
//! ```bash
//! cargo run --example poll_plug -- 192.168.1.60
//! cargo run --example poll_plug -- 192.168.1.60 admin secret
//! cargo run --example poll_plug -- --mock
//! ```

use std::env;

use edimax_plug::entity::{Entity, SensorEntity, SwitchEntity};
use edimax_plug::{Backend, PlugConfig, Subscribable, entity, setup, teardown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <host> [username] [password]", args[0]);
        eprintln!("       {} --mock", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  cargo run --example poll_plug -- 192.168.1.60");
        eprintln!("  cargo run --example poll_plug -- 192.168.1.60 admin secret");
        eprintln!("  cargo run --example poll_plug -- --mock");
        std::process::exit(1);
    }

    let config = if args[1] == "--mock" {
        PlugConfig::new("in-memory").with_backend(Backend::Mock)
    } else {
        let mut config = PlugConfig::new(args[1].as_str());
        if args.len() >= 4 {
            config = config.with_credentials(&args[2], &args[3]);
        }
        config
    };

    println!("=== Edimax Plug Monitor ===");
    println!("Host:    {}", config.host);
    println!("Backend: {:?}", config.backend);
    println!();

    // Setup polls once, so entities have values right away
    let coordinator = setup(&config).await?;

    if let Some(snapshot) = coordinator.latest_snapshot() {
        let info = &snapshot.info;
        println!("Model:    {}", info.product_name);
        println!("Firmware: {}", info.firmware_version);
        println!("Serial:   {}", info.serial_number);
        println!();
    }

    for sensor in entity::sensors(&coordinator) {
        println!(
            "{:<32} {:>10} {}",
            sensor.unique_id(),
            sensor
                .native_value()
                .map_or_else(|| "unknown".to_string(), |v| format!("{v:.2}")),
            sensor.unit_of_measurement()
        );
    }
    for switch in entity::switches(&coordinator) {
        println!("{:<32} {:>10?}", switch.unique_id(), switch.is_on());
    }
    println!();

    coordinator.subscribe(|snapshot| {
        println!(
            "[{}] {:>8.1} W  {:>8.3} kWh  relay {}",
            snapshot.fetched_at.format("%H:%M:%S"),
            snapshot.power_watts,
            snapshot.energy_today_kwh,
            snapshot.power_state()
        );
    });
    coordinator.on_availability_changed(|available| {
        println!("Plug is now {}", if available { "available" } else { "unavailable" });
    });

    println!("Polling every {}s...", coordinator.interval().as_secs());
    tokio::time::sleep(coordinator.interval() * 2 + std::time::Duration::from_secs(1)).await;

    if let Some(err) = coordinator.last_error() {
        println!("Last error: {} ({:?})", err.message, err.kind);
    }

    teardown(coordinator).await;
    println!("Done.");

    Ok(())
}
