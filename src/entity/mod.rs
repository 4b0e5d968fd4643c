// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entities exposed to the host platform.
//!
//! Each entity is a view over the coordinator's latest [`Snapshot`](crate::state::Snapshot).
//! Which entities exist and how they read the snapshot is declared in the
//! [`SENSORS`] and [`SWITCHES`] tables; [`sensors`] and [`switches`]
//! instantiate the entries whose `has_fn` holds for the plug.
//!
//! Entities report `None` until the coordinator has a snapshot. Once they
//! have a value they keep reporting the latest one, even while the plug is
//! unreachable; [`Entity::available`] tells the host the value is stale.

mod description;
mod sensor;
mod switch;

pub use description::{
    EntityCategory, SENSORS, SWITCHES, SensorDescription, SensorDeviceClass, StateClass,
    SwitchDescription,
};
pub use sensor::{Sensor, sensors};
pub use switch::{PowerSwitch, switches};

use std::future::Future;

use crate::error::Result;

/// What the host platform needs from every entity.
pub trait Entity: Send + Sync {
    /// Platform the entity belongs to, e.g. `"sensor"`.
    fn platform(&self) -> &'static str;

    /// Key from the description table.
    fn key(&self) -> &'static str;

    /// Stable identifier: `{serial_number}_{key}`.
    fn unique_id(&self) -> &str;

    /// Display name.
    fn name(&self) -> String;

    /// Whether the entity belongs to the config or diagnostic section.
    fn entity_category(&self) -> EntityCategory;

    /// `true` while the most recent poll succeeded.
    fn available(&self) -> bool;

    /// Current state serialized for the host.
    fn state_json(&self) -> serde_json::Value;
}

/// A read-only numeric entity.
pub trait SensorEntity: Entity {
    /// Latest reading, or `None` before the first poll.
    fn native_value(&self) -> Option<f64>;

    /// Unit of [`native_value`](Self::native_value).
    fn unit_of_measurement(&self) -> &'static str;
}

/// An entity that can be switched on and off.
pub trait SwitchEntity: Entity {
    /// Latest relay state, or `None` before the first poll.
    fn is_on(&self) -> Option<bool>;

    /// Switches on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`](crate::Error::OperationFailed) if
    /// the plug could not be switched.
    fn turn_on(&self) -> impl Future<Output = Result<()>> + Send;

    /// Switches off.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`](crate::Error::OperationFailed) if
    /// the plug could not be switched.
    fn turn_off(&self) -> impl Future<Output = Result<()>> + Send;
}
