// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for coordinator updates.
//!
//! - [`SubscriptionId`] - A unique identifier for a subscription, used to unsubscribe
//! - [`CallbackRegistry`] - Registry that stores callbacks and dispatches updates
//! - [`Subscribable`] - Trait for types that publish snapshots
//!
//! Snapshot listeners only hear about successful polls. A failed poll is
//! reported through the availability listeners instead, and only when it
//! changes the plug's availability.

mod callback;
mod subscribable;

pub use callback::{CallbackRegistry, SubscriptionId};
pub use subscribable::Subscribable;
