// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background polling task.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use super::Shared;
use crate::protocol::DeviceClient;

/// Polls every `interval` until shutdown is signalled or the coordinator is
/// dropped.
///
/// The first tick fires one interval after start, since setup has already
/// polled. Ticks missed while a poll overran are skipped, not queued.
pub(super) async fn run<C: DeviceClient>(
    shared: Weak<Shared<C>>,
    mut shutdown: watch::Receiver<bool>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // Also fires with Err once every sender is gone.
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                shared.tick().await;
            }
        }
    }

    tracing::debug!("Polling task exited");
}
