// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point-in-time plug telemetry.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::PowerState;

/// Identity and firmware of a plug.
///
/// Fetched once on the first successful poll and reused afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Serial number; the plug reports its MAC address here.
    pub serial_number: String,
    /// Hardware model, e.g. `SP2101W`.
    pub product_name: String,
    /// Name shown to users.
    pub display_name: String,
    /// Firmware version string.
    pub firmware_version: String,
    /// Vendor (customer) code.
    pub vendor: String,
}

/// Immutable capture of everything a poll returned.
///
/// Snapshots are never edited in place: the coordinator builds a new one on
/// every successful poll and swaps it in.
///
/// # Examples
///
/// ```
/// use edimax_plug::state::{DeviceInfo, Snapshot};
/// use edimax_plug::types::PowerState;
///
/// let info = DeviceInfo {
///     serial_number: "74DA38000001".into(),
///     product_name: "SP2101W".into(),
///     display_name: "Desk".into(),
///     firmware_version: "2.03".into(),
///     vendor: "Edimax".into(),
/// };
/// let snapshot = Snapshot::new(info, 12.5, 0.3, PowerState::On);
/// assert!(snapshot.is_on);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Device identity.
    pub info: DeviceInfo,
    /// Instantaneous draw in Watts.
    pub power_watts: f64,
    /// Energy consumed today in kWh.
    pub energy_today_kwh: f64,
    /// Relay state.
    pub is_on: bool,
    /// When the poll completed.
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Builds a snapshot stamped with the current time.
    #[must_use]
    pub fn new(info: DeviceInfo, power_watts: f64, energy_today_kwh: f64, state: PowerState) -> Self {
        Self {
            info,
            power_watts,
            energy_today_kwh,
            is_on: state.is_on(),
            fetched_at: Utc::now(),
        }
    }

    /// Relay state as a [`PowerState`].
    #[must_use]
    pub fn power_state(&self) -> PowerState {
        PowerState::from(self.is_on)
    }
}
