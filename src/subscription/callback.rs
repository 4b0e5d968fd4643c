// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for coordinator subscriptions.
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Registry for storing and dispatching callbacks

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::state::Snapshot;

/// Unique identifier for a subscription.
///
/// Returned when subscribing and used to unsubscribe later. IDs are unique
/// within a coordinator's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

type SnapshotCallback = Arc<dyn Fn(&Snapshot) + Send + Sync>;

type AvailabilityCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Registry of coordinator listeners.
///
/// Dispatch is synchronous. Callbacks are cloned out of the registry before
/// being invoked, so a callback may itself subscribe or unsubscribe.
pub struct CallbackRegistry {
    next_id: AtomicU64,
    snapshot_callbacks: RwLock<HashMap<SubscriptionId, SnapshotCallback>>,
    availability_callbacks: RwLock<HashMap<SubscriptionId, AvailabilityCallback>>,
}

impl CallbackRegistry {
    /// Creates a new empty callback registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            snapshot_callbacks: RwLock::new(HashMap::new()),
            availability_callbacks: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a callback invoked with every new snapshot.
    pub fn on_snapshot<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.snapshot_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback invoked when the plug becomes reachable (`true`)
    /// or unreachable (`false`).
    pub fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.availability_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Unregisters a callback by its subscription ID.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.snapshot_callbacks.write().remove(&id).is_some()
            || self.availability_callbacks.write().remove(&id).is_some()
    }

    /// Clears all callbacks.
    pub fn clear(&self) {
        self.snapshot_callbacks.write().clear();
        self.availability_callbacks.write().clear();
    }

    /// Calls every snapshot callback with `snapshot`.
    pub fn dispatch_snapshot(&self, snapshot: &Snapshot) {
        let callbacks: Vec<_> = self.snapshot_callbacks.read().values().cloned().collect();
        for callback in callbacks {
            callback(snapshot);
        }
    }

    /// Calls every availability callback.
    pub fn dispatch_availability(&self, available: bool) {
        let callbacks: Vec<_> = self
            .availability_callbacks
            .read()
            .values()
            .cloned()
            .collect();
        for callback in callbacks {
            callback(available);
        }
    }

    /// Returns the total number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.snapshot_callbacks.read().len() + self.availability_callbacks.read().len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    use crate::state::DeviceInfo;
    use crate::types::PowerState;

    fn snapshot(watts: f64) -> Snapshot {
        let info = DeviceInfo {
            serial_number: "00:00:00:01".to_string(),
            product_name: "mocked".to_string(),
            display_name: "SmartPlug".to_string(),
            firmware_version: "1.0".to_string(),
            vendor: "edimax".to_string(),
        };
        Snapshot::new(info, watts, 1.0, PowerState::On)
    }

    #[test]
    fn subscription_id_display() {
        let id = SubscriptionId::new(42);
        assert_eq!(id.to_string(), "Sub(42)");
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn registry_new_is_empty() {
        let registry = CallbackRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.callback_count(), 0);
    }

    #[test]
    fn registry_snapshot_callback() {
        let registry = CallbackRegistry::new();
        let received = Arc::new(RwLock::new(None::<f64>));
        let received_clone = received.clone();

        let id = registry.on_snapshot(move |snapshot| {
            *received_clone.write() = Some(snapshot.power_watts);
        });

        registry.dispatch_snapshot(&snapshot(42.0));
        assert_eq!(*received.read(), Some(42.0));

        assert!(registry.unsubscribe(id));
        registry.dispatch_snapshot(&snapshot(7.0));
        assert_eq!(*received.read(), Some(42.0));
    }

    #[test]
    fn registry_availability_callback() {
        let registry = CallbackRegistry::new();
        let transitions = Arc::new(RwLock::new(Vec::new()));
        let transitions_clone = transitions.clone();

        registry.on_availability_changed(move |available| {
            transitions_clone.write().push(available);
        });

        registry.dispatch_availability(false);
        registry.dispatch_availability(true);

        assert_eq!(*transitions.read(), vec![false, true]);
    }

    #[test]
    fn snapshot_dispatch_skips_availability_listeners() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        registry.on_availability_changed(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
        registry.dispatch_snapshot(&snapshot(1.0));

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn callback_may_unsubscribe_itself() {
        let registry = Arc::new(CallbackRegistry::new());
        let counter = Arc::new(AtomicU32::new(0));
        let id_slot = Arc::new(RwLock::new(None::<SubscriptionId>));

        let registry_clone = registry.clone();
        let counter_clone = counter.clone();
        let id_slot_clone = id_slot.clone();
        let id = registry.on_snapshot(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *id_slot_clone.read() {
                registry_clone.unsubscribe(id);
            }
        });
        *id_slot.write() = Some(id);

        registry.dispatch_snapshot(&snapshot(1.0));
        registry.dispatch_snapshot(&snapshot(2.0));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_unsubscribe_nonexistent() {
        let registry = CallbackRegistry::new();
        assert!(!registry.unsubscribe(SubscriptionId::new(999)));
    }

    #[test]
    fn registry_unique_ids_and_clear() {
        let registry = CallbackRegistry::new();

        let id1 = registry.on_snapshot(|_| {});
        let id2 = registry.on_availability_changed(|_| {});
        assert_ne!(id1, id2);
        assert_eq!(registry.callback_count(), 2);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_debug() {
        let registry = CallbackRegistry::new();
        registry.on_snapshot(|_| {});

        let debug = format!("{registry:?}");
        assert!(debug.contains("CallbackRegistry"));
        assert!(debug.contains("callback_count"));
    }
}
