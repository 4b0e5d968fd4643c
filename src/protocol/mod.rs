// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clients for talking to Edimax smart plugs.
//!
//! The coordinator only sees the [`DeviceClient`] trait. Two implementations
//! ship with the library:
//!
//! - [`HttpClient`]: the plug's XML-over-HTTP API (feature `http`)
//! - [`MockSmartPlug`]: an in-memory stand-in for development and tests
//!
//! [`PlugClient`] wraps both so the backend can be chosen from configuration.
//!
//! Clients never retry. A failed call is reported once and the coordinator's
//! next tick is the retry.

#[cfg(feature = "http")]
mod http;
mod mock;

#[cfg(feature = "http")]
pub use http::{HttpClient, HttpConfig};
pub use mock::{MockCall, MockSmartPlug};

use std::future::Future;

use crate::error::Result;
use crate::state::DeviceInfo;
use crate::types::PowerState;

/// Operations the coordinator needs from a plug.
///
/// All futures are `Send` so a coordinator can drive the client from a
/// spawned task. Implementations may be written with `async fn`.
pub trait DeviceClient: Send + Sync + 'static {
    /// Reads the relay state.
    ///
    /// # Errors
    ///
    /// Returns error if the plug cannot be reached or its reply is malformed.
    fn get_state(&self) -> impl Future<Output = Result<PowerState>> + Send;

    /// Switches the relay.
    ///
    /// # Errors
    ///
    /// Returns error if the plug cannot be reached or refuses the command.
    fn set_state(&self, state: PowerState) -> impl Future<Output = Result<()>> + Send;

    /// Reads model, firmware and MAC address.
    ///
    /// # Errors
    ///
    /// Returns error if the plug cannot be reached or its reply is malformed.
    fn get_info(&self) -> impl Future<Output = Result<DeviceInfo>> + Send;

    /// Reads the instantaneous draw in Watts.
    ///
    /// # Errors
    ///
    /// Returns error if the plug cannot be reached or its reply is malformed.
    fn get_power(&self) -> impl Future<Output = Result<f64>> + Send;

    /// Reads today's consumption in kWh.
    ///
    /// # Errors
    ///
    /// Returns error if the plug cannot be reached or its reply is malformed.
    fn get_energy_today(&self) -> impl Future<Output = Result<f64>> + Send;

    /// Switches the relay from a raw wire value.
    ///
    /// The value is validated before anything is sent, so an unsupported
    /// value never reaches the plug.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidPowerState`](crate::error::ValueError::InvalidPowerState)
    /// for anything other than `ON`, `on`, `OFF` or `off`, otherwise whatever
    /// [`set_state`](Self::set_state) returns.
    fn set_state_str(&self, value: &str) -> impl Future<Output = Result<()>> + Send {
        let parsed = value.parse::<PowerState>();
        async move { self.set_state(parsed?).await }
    }
}

/// Client chosen at setup time.
///
/// Selecting the backend is an explicit configuration decision
/// (see [`Backend`](crate::config::Backend)); nothing inside the library
/// swaps one for the other.
#[derive(Debug, Clone)]
pub enum PlugClient {
    /// A real plug reached over HTTP.
    #[cfg(feature = "http")]
    Http(HttpClient),
    /// The in-memory development plug.
    Mock(MockSmartPlug),
}

impl DeviceClient for PlugClient {
    async fn get_state(&self) -> Result<PowerState> {
        match self {
            #[cfg(feature = "http")]
            Self::Http(client) => client.get_state().await,
            Self::Mock(client) => client.get_state().await,
        }
    }

    async fn set_state(&self, state: PowerState) -> Result<()> {
        match self {
            #[cfg(feature = "http")]
            Self::Http(client) => client.set_state(state).await,
            Self::Mock(client) => client.set_state(state).await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            #[cfg(feature = "http")]
            Self::Http(client) => client.get_info().await,
            Self::Mock(client) => client.get_info().await,
        }
    }

    async fn get_power(&self) -> Result<f64> {
        match self {
            #[cfg(feature = "http")]
            Self::Http(client) => client.get_power().await,
            Self::Mock(client) => client.get_power().await,
        }
    }

    async fn get_energy_today(&self) -> Result<f64> {
        match self {
            #[cfg(feature = "http")]
            Self::Http(client) => client.get_energy_today().await,
            Self::Mock(client) => client.get_energy_today().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ValueError};

    #[tokio::test]
    async fn plug_client_dispatches_to_mock() {
        let mock = MockSmartPlug::new();
        let client = PlugClient::Mock(mock.clone());

        client.set_state(PowerState::On).await.unwrap();

        assert_eq!(client.get_state().await.unwrap(), PowerState::On);
        assert_eq!(mock.calls(), vec![MockCall::SetState(PowerState::On), MockCall::GetState]);
    }

    #[tokio::test]
    async fn set_state_str_rejects_before_calling_device() {
        let mock = MockSmartPlug::new();

        let err = mock.set_state_str("dim").await.unwrap_err();

        assert!(matches!(err, Error::Value(ValueError::InvalidPowerState(ref v)) if v == "dim"));
        assert!(mock.calls().is_empty());
        assert_eq!(mock.power_state(), PowerState::Off);
    }

    #[tokio::test]
    async fn set_state_str_accepts_lowercase() {
        let mock = MockSmartPlug::new();

        mock.set_state_str("on").await.unwrap();

        assert_eq!(mock.power_state(), PowerState::On);
    }
}
