// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `edimax_plug` - poll Edimax smart plugs and expose them as entities.
//!
//! A [`Coordinator`] polls one plug on a fixed interval and keeps the last
//! good [`Snapshot`](state::Snapshot). Sensor and switch entities read from
//! that snapshot; switching the plug goes through the coordinator so the
//! snapshot is refreshed right after the write.
//!
//! # Features
//!
//! - **Telemetry**: current power draw and today's energy consumption
//! - **Control**: switch the relay on and off
//! - **Resilience**: failed polls keep the last snapshot and mark the plug
//!   unavailable until the next successful poll
//!
//! # Quick Start
//!
//! ```no_run
//! use edimax_plug::entity::{SensorEntity, SwitchEntity};
//! use edimax_plug::subscription::Subscribable;
//! use edimax_plug::{PlugConfig, entity, setup, teardown};
//!
//! #[tokio::main]
//! async fn main() -> edimax_plug::Result<()> {
//!     let config = PlugConfig::new("192.168.1.100").with_name("Desk");
//!     let coordinator = setup(&config).await?;
//!
//!     coordinator.subscribe(|snapshot| {
//!         println!("{} W, {} kWh today", snapshot.power_watts, snapshot.energy_today_kwh);
//!     });
//!
//!     for sensor in entity::sensors(&coordinator) {
//!         println!("{:?} {}", sensor.native_value(), sensor.unit_of_measurement());
//!     }
//!
//!     let switch = entity::switches(&coordinator).remove(0);
//!     switch.turn_on().await?;
//!
//!     teardown(coordinator).await;
//!     Ok(())
//! }
//! ```
//!
//! # Without hardware
//!
//! Select [`Backend::Mock`] to run against an in-memory plug:
//!
//! ```
//! use edimax_plug::{Backend, PlugConfig, setup, teardown};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> edimax_plug::Result<()> {
//! let config = PlugConfig::new("unused").with_backend(Backend::Mock);
//! let coordinator = setup(&config).await?;
//!
//! let snapshot = coordinator.latest_snapshot().expect("set up");
//! assert_eq!(snapshot.power_watts, 10.0);
//!
//! teardown(coordinator).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
mod coordinator;
pub mod entity;
pub mod error;
mod integration;
pub mod protocol;
pub mod state;
pub mod subscription;
pub mod types;

pub use config::{Backend, PlugConfig};
pub use coordinator::{Coordinator, LastError};
pub use error::{DeviceError, Error, ErrorKind, ParseError, ProtocolError, Result, ValueError};
pub use integration::{setup, setup_with_client, teardown};
pub use protocol::{DeviceClient, MockSmartPlug, PlugClient};
#[cfg(feature = "http")]
pub use protocol::{HttpClient, HttpConfig};
pub use state::{DeviceInfo, Snapshot};
pub use subscription::{CallbackRegistry, Subscribable, SubscriptionId};
pub use types::PowerState;
