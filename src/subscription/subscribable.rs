// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for sources of plug snapshots.

use crate::state::Snapshot;
use crate::subscription::SubscriptionId;

/// Trait for types that publish plug snapshots.
///
/// # Examples
///
/// ```no_run
/// use edimax_plug::{PlugConfig, setup};
/// use edimax_plug::subscription::Subscribable;
///
/// # async fn example() -> edimax_plug::Result<()> {
/// let coordinator = setup(&PlugConfig::new("192.168.1.100")).await?;
///
/// let sub_id = coordinator.subscribe(|snapshot| {
///     println!("{} W", snapshot.power_watts);
/// });
///
/// coordinator.unsubscribe(sub_id);
/// # Ok(())
/// # }
/// ```
pub trait Subscribable {
    /// Subscribes to new snapshots.
    ///
    /// The callback runs after every successful poll. It runs synchronously
    /// on the polling task and must not block.
    fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static;

    /// Subscribes to availability transitions.
    ///
    /// The callback receives `false` when a poll fails after a success and
    /// `true` when polling recovers.
    fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static;

    /// Unsubscribes a callback by its subscription ID.
    ///
    /// Returns `true` if the subscription was found and removed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
