// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling coordinator for a single plug.
//!
//! The coordinator owns the plug's client, polls it on a fixed interval and
//! keeps the most recent successful [`Snapshot`]. Entities read from that
//! snapshot instead of talking to the plug themselves.
//!
//! # Guarantees
//!
//! - After [`Coordinator::setup`] returns, [`latest_snapshot`](Coordinator::latest_snapshot)
//!   is always `Some`. Failed polls record an error but keep the old snapshot.
//! - Polls never overlap: a periodic tick that finds a poll in progress is
//!   skipped, and forced refreshes wait their turn.
//! - Every client call is bounded by [`Coordinator::DEFAULT_CALL_TIMEOUT`].

mod poller;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{Error, ErrorKind, ParseError, ProtocolError, Result};
use crate::protocol::DeviceClient;
use crate::state::{DeviceInfo, Snapshot};
use crate::subscription::{CallbackRegistry, Subscribable, SubscriptionId};
use crate::types::PowerState;

/// The most recent poll failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastError {
    /// Category of the failure.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// When the failure was recorded.
    pub at: DateTime<Utc>,
}

impl LastError {
    fn from_error(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            at: Utc::now(),
        }
    }
}

/// Polls one plug and shares its latest snapshot.
///
/// Cloning is cheap; clones share the same client, snapshot and polling
/// task.
///
/// # Examples
///
/// ```no_run
/// use edimax_plug::Coordinator;
/// use edimax_plug::protocol::HttpConfig;
///
/// # async fn example() -> edimax_plug::Result<()> {
/// let client = HttpConfig::new("192.168.1.100").into_client()?;
/// let coordinator = Coordinator::setup("desk", client).await?;
///
/// if let Some(snapshot) = coordinator.latest_snapshot() {
///     println!("{} W", snapshot.power_watts);
/// }
///
/// coordinator.set_power(false).await?;
/// coordinator.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct Coordinator<C: DeviceClient> {
    shared: Arc<Shared<C>>,
}

impl<C: DeviceClient> Clone for Coordinator<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

pub(crate) struct Shared<C> {
    name: String,
    /// Taken out at shutdown so the client is released even while entities
    /// still hold the coordinator.
    client: RwLock<Option<Arc<C>>>,
    interval: Duration,
    call_timeout: Duration,
    /// Held for the whole of every poll and write.
    refresh_lock: tokio::sync::Mutex<()>,
    latest: RwLock<Option<Arc<Snapshot>>>,
    info: RwLock<Option<DeviceInfo>>,
    last_error: RwLock<Option<LastError>>,
    available: AtomicBool,
    closed: AtomicBool,
    callbacks: CallbackRegistry,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<C: DeviceClient> Coordinator<C> {
    /// Time between periodic polls.
    pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);
    /// Upper bound on any single client call.
    pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a coordinator, performs the first poll and starts polling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SetupFailed`] if the first poll fails. No polling
    /// task is left running in that case.
    pub async fn setup(name: impl Into<String>, client: C) -> Result<Self> {
        let coordinator = Self::new(name.into(), client);

        if let Err(err) = coordinator.refresh().await {
            tracing::error!(plug = %coordinator.name(), error = %err, "Initial poll failed");
            coordinator.shared.closed.store(true, Ordering::SeqCst);
            return Err(Error::SetupFailed(Box::new(err)));
        }

        coordinator.start();
        tracing::info!(
            plug = %coordinator.name(),
            interval_secs = coordinator.interval().as_secs(),
            "Coordinator started"
        );
        Ok(coordinator)
    }

    fn new(name: String, client: C) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                name,
                client: RwLock::new(Some(Arc::new(client))),
                interval: Self::DEFAULT_SCAN_INTERVAL,
                call_timeout: Self::DEFAULT_CALL_TIMEOUT,
                refresh_lock: tokio::sync::Mutex::new(()),
                latest: RwLock::new(None),
                info: RwLock::new(None),
                last_error: RwLock::new(None),
                available: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                callbacks: CallbackRegistry::new(),
                shutdown_tx,
                task: Mutex::new(None),
            }),
        }
    }

    fn start(&self) {
        let handle = tokio::spawn(poller::run(
            Arc::downgrade(&self.shared),
            self.shared.shutdown_tx.subscribe(),
            self.shared.interval,
        ));
        *self.shared.task.lock() = Some(handle);
    }

    /// Returns the coordinator's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Returns the polling interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.shared.interval
    }

    /// Returns the most recent successful snapshot.
    #[must_use]
    pub fn latest_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.shared.latest.read().clone()
    }

    /// Returns the error from the last poll, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<LastError> {
        self.shared.last_error.read().clone()
    }

    /// Returns `true` if the last poll succeeded.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.shared.available.load(Ordering::SeqCst)
    }

    /// Returns `true` once the coordinator has been shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Polls the plug now, waiting for any poll already in progress.
    ///
    /// # Errors
    ///
    /// Returns the client error if the poll fails, or [`Error::Closed`] after
    /// shutdown.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>> {
        self.shared.ensure_open()?;
        let _guard = self.shared.refresh_lock.lock().await;
        self.shared.ensure_open()?;
        self.shared.refresh_locked().await
    }

    /// Polls the plug outside the regular schedule.
    ///
    /// Used after writes so entities see the effect without waiting for the
    /// next tick.
    ///
    /// # Errors
    ///
    /// Same as [`refresh`](Self::refresh).
    pub async fn force_refresh(&self) -> Result<Arc<Snapshot>> {
        tracing::debug!(plug = %self.shared.name, "Forced refresh");
        self.refresh().await
    }

    /// Switches the plug and refreshes the snapshot.
    ///
    /// The refresh is attempted whether or not the write succeeded. Its own
    /// outcome is recorded in [`last_error`](Self::last_error) but does not
    /// change the result of this call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] wrapping the client error if the
    /// write fails, or [`Error::Closed`] after shutdown.
    pub async fn set_power(&self, on: bool) -> Result<()> {
        let state = PowerState::from(on);
        let operation = if on { "switch plug on" } else { "switch plug off" };

        self.shared.ensure_open()?;
        let _guard = self.shared.refresh_lock.lock().await;
        self.shared.ensure_open()?;

        let client = self.shared.client()?;

        tracing::debug!(plug = %self.shared.name, %state, "Switching plug");
        let written = self.shared.bounded(client.set_state(state)).await;
        drop(client);
        if let Err(err) = &written {
            tracing::warn!(plug = %self.shared.name, %state, error = %err, "Switching plug failed");
        }

        tracing::debug!(plug = %self.shared.name, "Forced refresh");
        // Failure is already recorded in last_error.
        let _ = self.shared.refresh_locked().await;

        written.map_err(|err| Error::operation_failed(operation, err))
    }

    /// Stops polling and waits for any poll in progress to finish.
    ///
    /// Afterwards the client is released and never called again:
    /// [`refresh`](Self::refresh) and [`set_power`](Self::set_power) return
    /// [`Error::Closed`] and all listeners are dropped. The last snapshot stays readable. Calling this
    /// more than once is harmless.
    pub async fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.shutdown_tx.send_replace(true);

        let task = self.shared.task.lock().take();
        if let Some(task) = task
            && let Err(err) = task.await
            && err.is_panic()
        {
            tracing::error!(plug = %self.shared.name, "Polling task panicked");
        }

        // Drain writes and forced refreshes that got the lock before we closed.
        let guard = self.shared.refresh_lock.lock().await;
        let client = self.shared.client.write().take();
        drop(guard);
        drop(client);
        self.shared.callbacks.clear();

        tracing::info!(plug = %self.shared.name, "Coordinator stopped");
    }
}

impl<C: DeviceClient> Shared<C> {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }

    fn client(&self) -> Result<Arc<C>> {
        self.client.read().clone().ok_or(Error::Closed)
    }

    /// Runs a client call under the per-call timeout.
    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let millis = u64::try_from(self.call_timeout.as_millis()).unwrap_or(u64::MAX);
                Err(ProtocolError::Timeout(millis).into())
            }
        }
    }

    async fn fetch(&self) -> Result<Snapshot> {
        let client = self.client()?;
        let cached = self.info.read().clone();
        let info = match cached {
            Some(info) => info,
            None => {
                let info = self.bounded(client.get_info()).await?;
                *self.info.write() = Some(info.clone());
                info
            }
        };

        let state = self.bounded(client.get_state()).await?;
        let power = finite("power_watts", self.bounded(client.get_power()).await?)?;
        let energy = finite(
            "energy_today_kwh",
            self.bounded(client.get_energy_today()).await?,
        )?;

        Ok(Snapshot::new(info, power, energy, state))
    }

    /// Polls once. The caller must hold `refresh_lock`.
    async fn refresh_locked(&self) -> Result<Arc<Snapshot>> {
        match self.fetch().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.latest.write() = Some(Arc::clone(&snapshot));
                *self.last_error.write() = None;

                tracing::debug!(
                    plug = %self.name,
                    power_watts = snapshot.power_watts,
                    energy_today_kwh = snapshot.energy_today_kwh,
                    is_on = snapshot.is_on,
                    "Poll succeeded"
                );

                self.callbacks.dispatch_snapshot(&snapshot);
                if !self.available.swap(true, Ordering::SeqCst) {
                    tracing::info!(plug = %self.name, "Plug available");
                    self.callbacks.dispatch_availability(true);
                }
                Ok(snapshot)
            }
            Err(err) => {
                tracing::warn!(plug = %self.name, error = %err, "Poll failed");
                *self.last_error.write() = Some(LastError::from_error(&err));

                if self.available.swap(false, Ordering::SeqCst) {
                    self.callbacks.dispatch_availability(false);
                }
                Err(err)
            }
        }
    }

    /// One periodic tick. Skipped if a poll or write is already running.
    async fn tick(&self) {
        let Ok(_guard) = self.refresh_lock.try_lock() else {
            tracing::debug!(plug = %self.name, "Poll in progress, skipping tick");
            return;
        };
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        // Failure is already logged and recorded.
        let _ = self.refresh_locked().await;
    }
}

/// Rejects NaN and infinite readings so they never reach a snapshot.
fn finite(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParseError::InvalidValue {
            field: field.to_string(),
            message: format!("{value} is not a finite number"),
        }
        .into())
    }
}

impl<C: DeviceClient> Subscribable for Coordinator<C> {
    fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.shared.callbacks.on_snapshot(callback)
    }

    fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.shared.callbacks.on_availability_changed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.callbacks.unsubscribe(id)
    }
}

impl<C: DeviceClient> std::fmt::Debug for Coordinator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("name", &self.shared.name)
            .field("interval", &self.shared.interval)
            .field("available", &self.is_available())
            .field("closed", &self.is_closed())
            .field("callbacks", &self.shared.callbacks)
            .finish_non_exhaustive()
    }
}
