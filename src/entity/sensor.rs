// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power and energy sensors.

use serde_json::json;

use super::{Entity, EntityCategory, SENSORS, SensorDescription, SensorEntity};
use crate::coordinator::Coordinator;
use crate::protocol::DeviceClient;

/// A numeric reading taken from the coordinator's snapshot.
#[derive(Debug, Clone)]
pub struct Sensor<C: DeviceClient> {
    coordinator: Coordinator<C>,
    description: &'static SensorDescription,
    unique_id: String,
}

impl<C: DeviceClient> Sensor<C> {
    /// Creates a sensor for a plug with the given serial number.
    #[must_use]
    pub fn new(
        coordinator: Coordinator<C>,
        description: &'static SensorDescription,
        serial_number: &str,
    ) -> Self {
        Self {
            coordinator,
            description,
            unique_id: format!("{serial_number}_{}", description.key),
        }
    }

    /// Returns the description this sensor was built from.
    #[must_use]
    pub fn description(&self) -> &'static SensorDescription {
        self.description
    }
}

/// Builds the sensors the plug supports.
///
/// Returns nothing until the coordinator has a snapshot.
#[must_use]
pub fn sensors<C: DeviceClient>(coordinator: &Coordinator<C>) -> Vec<Sensor<C>> {
    let Some(snapshot) = coordinator.latest_snapshot() else {
        return Vec::new();
    };

    SENSORS
        .iter()
        .filter(|description| (description.has_fn)(&snapshot))
        .map(|description| {
            Sensor::new(
                coordinator.clone(),
                description,
                &snapshot.info.serial_number,
            )
        })
        .collect()
}

impl<C: DeviceClient> Entity for Sensor<C> {
    fn platform(&self) -> &'static str {
        "sensor"
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
        json!({
            "state": self.native_value(),
            "unit_of_measurement": self.description.unit,
            "device_class": self.description.device_class,
            "state_class": self.description.state_class,
            "suggested_display_precision": self.description.display_precision,
            "available": self.available(),
        })
    }
}

impl<C: DeviceClient> SensorEntity for Sensor<C> {
    fn native_value(&self) -> Option<f64> {
        let snapshot = self.coordinator.latest_snapshot()?;
        (self.description.value_fn)(&snapshot)
    }

    fn unit_of_measurement(&self) -> &'static str {
        self.description.unit
    }
}
