// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory smart plug.
//!
//! Answers with fixed telemetry and keeps the relay state in memory, so the
//! rest of the stack can be exercised without hardware. It also records every
//! call and can be told to fail, which the coordinator tests rely on.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{ProtocolError, Result};
use crate::protocol::DeviceClient;
use crate::state::DeviceInfo;
use crate::types::PowerState;

/// A call received by a [`MockSmartPlug`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCall {
    /// `get_state`
    GetState,
    /// `set_state` with the requested state.
    SetState(PowerState),
    /// `get_info`
    GetInfo,
    /// `get_power`
    GetPower,
    /// `get_energy_today`
    GetEnergyToday,
}

/// Development stand-in for a physical plug.
///
/// Clones share state, so a test can keep one handle while the coordinator
/// owns another.
///
/// # Examples
///
/// ```
/// use edimax_plug::protocol::{DeviceClient, MockSmartPlug};
/// use edimax_plug::types::PowerState;
///
/// # async fn example() -> edimax_plug::Result<()> {
/// let plug = MockSmartPlug::new();
/// assert_eq!(plug.get_power().await?, 10.0);
///
/// plug.set_state(PowerState::On).await?;
/// assert_eq!(plug.get_state().await?, PowerState::On);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockSmartPlug {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<MockState>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[derive(Debug)]
struct MockState {
    power_state: PowerState,
    power_watts: f64,
    energy_today_kwh: f64,
    info: DeviceInfo,
    latency: Duration,
    offline: bool,
    fail_next: u32,
    reject_writes: bool,
    calls: Vec<MockCall>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            power_state: PowerState::Off,
            power_watts: MockSmartPlug::DEFAULT_POWER_WATTS,
            energy_today_kwh: MockSmartPlug::DEFAULT_ENERGY_TODAY_KWH,
            info: DeviceInfo {
                serial_number: "00:00:00:01".to_string(),
                product_name: "mocked".to_string(),
                display_name: "SmartPlug".to_string(),
                firmware_version: "1.0".to_string(),
                vendor: "edimax".to_string(),
            },
            latency: Duration::ZERO,
            offline: false,
            fail_next: 0,
            reject_writes: false,
            calls: Vec::new(),
        }
    }
}

/// Tracks concurrent calls for the lifetime of one request.
struct InFlight<'a>(&'a Inner);

impl<'a> InFlight<'a> {
    fn enter(inner: &'a Inner) -> Self {
        let now = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        inner.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(inner)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockSmartPlug {
    /// Power reading reported unless overridden.
    pub const DEFAULT_POWER_WATTS: f64 = 10.0;
    /// Daily energy reported unless overridden.
    pub const DEFAULT_ENERGY_TODAY_KWH: f64 = 1000.0;

    /// Creates a plug that is off and reports the default telemetry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial relay state.
    #[must_use]
    pub fn with_state(self, state: PowerState) -> Self {
        self.inner.state.lock().power_state = state;
        self
    }

    /// Sets the reported power draw.
    #[must_use]
    pub fn with_power(self, watts: f64) -> Self {
        self.set_power(watts);
        self
    }

    /// Sets the reported daily energy.
    #[must_use]
    pub fn with_energy_today(self, kwh: f64) -> Self {
        self.inner.state.lock().energy_today_kwh = kwh;
        self
    }

    /// Delays every call by `latency`.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.inner.state.lock().latency = latency;
        self
    }

    /// Changes the reported power draw.
    pub fn set_power(&self, watts: f64) {
        self.inner.state.lock().power_watts = watts;
    }

    /// Makes every call fail with a connection error until cleared.
    pub fn set_offline(&self, offline: bool) {
        self.inner.state.lock().offline = offline;
    }

    /// Makes the next `count` calls fail with a connection error.
    pub fn fail_next(&self, count: u32) {
        self.inner.state.lock().fail_next = count;
    }

    /// Makes `set_state` fail while reads keep working.
    pub fn reject_writes(&self, reject: bool) {
        self.inner.state.lock().reject_writes = reject;
    }

    /// Current relay state.
    #[must_use]
    pub fn power_state(&self) -> PowerState {
        self.inner.state.lock().power_state
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.inner.state.lock().calls.clone()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.inner.state.lock().calls.clear();
    }

    /// Highest number of calls that were ever in progress at once.
    #[must_use]
    pub fn max_concurrent_calls(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    async fn call<T>(&self, call: MockCall, read: impl FnOnce(&mut MockState) -> T) -> Result<T> {
        let _guard = InFlight::enter(&self.inner);

        let latency = {
            let mut state = self.inner.state.lock();
            state.calls.push(call);
            state.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.inner.state.lock();
        if state.offline {
            return Err(ProtocolError::ConnectionFailed("mock plug is offline".to_string()).into());
        }
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(ProtocolError::ConnectionFailed("injected failure".to_string()).into());
        }
        if state.reject_writes && matches!(call, MockCall::SetState(_)) {
            return Err(ProtocolError::ConnectionFailed("write rejected".to_string()).into());
        }
        Ok(read(&mut state))
    }
}

impl DeviceClient for MockSmartPlug {
    async fn get_state(&self) -> Result<PowerState> {
        self.call(MockCall::GetState, |s| s.power_state).await
    }

    async fn set_state(&self, state: PowerState) -> Result<()> {
        tracing::debug!(%state, "Mock plug switching");
        self.call(MockCall::SetState(state), |s| s.power_state = state)
            .await
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        self.call(MockCall::GetInfo, |s| s.info.clone()).await
    }

    async fn get_power(&self) -> Result<f64> {
        self.call(MockCall::GetPower, |s| s.power_watts).await
    }

    async fn get_energy_today(&self) -> Result<f64> {
        self.call(MockCall::GetEnergyToday, |s| s.energy_today_kwh)
            .await
    }
}
