// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The plug's relay as a switch entity.

use serde_json::json;

use super::{Entity, EntityCategory, SWITCHES, SwitchDescription, SwitchEntity};
use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::protocol::DeviceClient;

/// Write-through view of the relay.
///
/// Reads come from the coordinator's snapshot. Writes go to the plug and are
/// followed by a forced refresh, so [`is_on`](SwitchEntity::is_on) reflects
/// the plug's actual state once the call returns.
#[derive(Debug, Clone)]
pub struct PowerSwitch<C: DeviceClient> {
    coordinator: Coordinator<C>,
    description: &'static SwitchDescription,
    unique_id: String,
}

impl<C: DeviceClient> PowerSwitch<C> {
    /// Creates a switch for a plug with the given serial number.
    #[must_use]
    pub fn new(
        coordinator: Coordinator<C>,
        description: &'static SwitchDescription,
        serial_number: &str,
    ) -> Self {
        Self {
            coordinator,
            description,
            unique_id: format!("{serial_number}_{}", description.key),
        }
    }

    /// Switches on or off.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`](crate::Error::OperationFailed) if
    /// the plug could not be switched.
    pub async fn set_on(&self, on: bool) -> Result<()> {
        self.coordinator.set_power(on).await
    }
}

/// Builds the switches the plug supports.
///
/// Returns nothing until the coordinator has a snapshot.
#[must_use]
pub fn switches<C: DeviceClient>(coordinator: &Coordinator<C>) -> Vec<PowerSwitch<C>> {
    let Some(snapshot) = coordinator.latest_snapshot() else {
        return Vec::new();
    };

    SWITCHES
        .iter()
        .filter(|description| (description.has_fn)(&snapshot))
        .map(|description| {
            PowerSwitch::new(
                coordinator.clone(),
                description,
                &snapshot.info.serial_number,
            )
        })
        .collect()
}

impl<C: DeviceClient> Entity for PowerSwitch<C> {
    fn platform(&self) -> &'static str {
        "switch"
    }

    fn key(&self) -> &'static str {
        self.description.key
    }

    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> String {
        format!("{} {}", self.coordinator.name(), self.description.name)
    }

    fn entity_category(&self) -> EntityCategory {
        self.description.entity_category
    }

    fn available(&self) -> bool {
        self.coordinator.is_available()
    }

    fn state_json(&self) -> serde_json::Value {
        let state = self.is_on().map(|on| if on { "on" } else { "off" });
        json!({
            "state": state,
            "available": self.available(),
        })
    }
}

impl<C: DeviceClient> SwitchEntity for PowerSwitch<C> {
    fn is_on(&self) -> Option<bool> {
        let snapshot = self.coordinator.latest_snapshot()?;
        (self.description.is_on_fn)(&snapshot)
    }

    async fn turn_on(&self) -> Result<()> {
        self.set_on(true).await
    }

    async fn turn_off(&self) -> Result<()> {
        self.set_on(false).await
    }
}
