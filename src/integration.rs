// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entry points for the host platform.
//!
//! The host calls [`setup`] once per configured plug, keeps the returned
//! coordinator for as long as the plug is configured, and hands it back to
//! [`teardown`] when the plug is removed.

use crate::config::PlugConfig;
use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::protocol::{DeviceClient, PlugClient};

/// Sets up a plug using the client selected in `config`.
///
/// # Errors
///
/// Returns error if the client cannot be built, or
/// [`Error::SetupFailed`](crate::Error::SetupFailed) if the plug does not
/// answer the first poll.
///
/// # Examples
///
/// ```no_run
/// use edimax_plug::{PlugConfig, entity, setup, teardown};
///
/// # async fn example() -> edimax_plug::Result<()> {
/// let coordinator = setup(&PlugConfig::new("192.168.1.100")).await?;
/// let sensors = entity::sensors(&coordinator);
/// let switches = entity::switches(&coordinator);
///
/// teardown(coordinator).await;
/// # Ok(())
/// # }
/// ```
pub async fn setup(config: &PlugConfig) -> Result<Coordinator<PlugClient>> {
    let client = config.build_client()?;
    setup_with_client(config, client).await
}

/// Sets up a plug with a caller-supplied client.
///
/// # Errors
///
/// Returns [`Error::SetupFailed`](crate::Error::SetupFailed) if the plug does
/// not answer the first poll.
pub async fn setup_with_client<C: DeviceClient>(
    config: &PlugConfig,
    client: C,
) -> Result<Coordinator<C>> {
    tracing::info!(plug = %config.name, host = %config.host, "Setting up plug");
    Coordinator::setup(config.name.clone(), client).await
}

/// Stops polling a plug.
///
/// Waits for a poll in progress to finish. Other clones of the coordinator
/// stay readable but can no longer reach the plug.
pub async fn teardown<C: DeviceClient>(coordinator: Coordinator<C>) {
    coordinator.shutdown().await;
}
