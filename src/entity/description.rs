// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Declarative entity tables.

use serde::Serialize;

use crate::state::Snapshot;

/// Section of the host UI an entity is listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    /// Settings the user can change.
    Config,
    /// Read-only device health information.
    Diagnostic,
}

/// Physical quantity a sensor measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorDeviceClass {
    /// Instantaneous power.
    Power,
    /// Accumulated energy.
    Energy,
}

/// How a sensor's values relate over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    /// A current reading.
    Measurement,
}

/// One row of the [`SENSORS`] table.
#[derive(Debug, Clone, Copy)]
pub struct SensorDescription {
    /// Stable key, used in the unique ID.
    pub key: &'static str,
    /// Display name suffix.
    pub name: &'static str,
    /// Measured quantity.
    pub device_class: SensorDeviceClass,
    /// Temporal behaviour.
    pub state_class: StateClass,
    /// Unit of the value.
    pub unit: &'static str,
    /// Suggested number of decimals.
    pub display_precision: u8,
    /// UI section.
    pub entity_category: EntityCategory,
    /// Whether the host should enable the entity on creation.
    pub enabled_by_default: bool,
    /// Whether the plug supports this sensor.
    pub has_fn: fn(&Snapshot) -> bool,
    /// Reads the value from a snapshot.
    pub value_fn: fn(&Snapshot) -> Option<f64>,
}

/// One row of the [`SWITCHES`] table.
#[derive(Debug, Clone, Copy)]
pub struct SwitchDescription {
    /// Stable key, used in the unique ID.
    pub key: &'static str,
    /// Display name suffix.
    pub name: &'static str,
    /// UI section.
    pub entity_category: EntityCategory,
    /// Whether the plug supports this switch.
    pub has_fn: fn(&Snapshot) -> bool,
    /// Reads the state from a snapshot.
    pub is_on_fn: fn(&Snapshot) -> Option<bool>,
}

/// Sensors every plug may expose.
pub static SENSORS: [SensorDescription; 2] = [
    SensorDescription {
        key: "current_power",
        name: "Current power",
        device_class: SensorDeviceClass::Power,
        state_class: StateClass::Measurement,
        unit: "W",
        display_precision: 0,
        entity_category: EntityCategory::Diagnostic,
        enabled_by_default: false,
        has_fn: |_| true,
        value_fn: |s| Some(s.power_watts),
    },
    SensorDescription {
        key: "total_power",
        name: "Energy today",
        device_class: SensorDeviceClass::Energy,
        state_class: StateClass::Measurement,
        unit: "kWh",
        display_precision: 2,
        entity_category: EntityCategory::Diagnostic,
        enabled_by_default: false,
        has_fn: |_| true,
        value_fn: |s| Some(s.energy_today_kwh),
    },
];

/// Switches every plug may expose.
pub static SWITCHES: [SwitchDescription; 1] = [SwitchDescription {
    key: "onoff",
    name: "Power",
    entity_category: EntityCategory::Config,
    has_fn: |_| true,
    is_on_fn: |s| Some(s.is_on),
}];
