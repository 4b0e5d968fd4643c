// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator behavior against the in-memory plug, on a paused clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use edimax_plug::entity::{Entity, SensorEntity, SwitchEntity};
use edimax_plug::protocol::{DeviceClient, MockCall};
use edimax_plug::{
    Coordinator, DeviceInfo, Error, ErrorKind, MockSmartPlug, ParseError, PlugConfig, PowerState,
    ProtocolError, Result, Subscribable, entity, setup_with_client, teardown,
};
use tokio::time::sleep;

const INTERVAL: Duration = Coordinator::<MockSmartPlug>::DEFAULT_SCAN_INTERVAL;

/// Sleeps until just past the next scheduled tick.
async fn past_next_tick() {
    sleep(INTERVAL).await;
}

async fn started(plug: &MockSmartPlug) -> Coordinator<MockSmartPlug> {
    let coordinator = Coordinator::setup("Test plug", plug.clone()).await.unwrap();
    // Offset from the tick schedule so each sleep lands between ticks.
    sleep(Duration::from_secs(1)).await;
    coordinator
}

// ============================================================================
// Snapshot lifecycle
// ============================================================================

mod snapshot {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn snapshot_survives_failed_polls() {
        let plug = MockSmartPlug::new();
        let coordinator = started(&plug).await;
        let first = coordinator.latest_snapshot().unwrap();

        plug.set_offline(true);
        for _ in 0..3 {
            past_next_tick().await;
            let current = coordinator.latest_snapshot().unwrap();
            assert!(Arc::ptr_eq(&first, &current));
            assert!(!coordinator.is_available());
        }

        let last_error = coordinator.last_error().unwrap();
        assert_eq!(last_error.kind, ErrorKind::Connection);

        plug.set_offline(false);
        past_next_tick().await;

        assert!(coordinator.is_available());
        assert!(coordinator.last_error().is_none());
        assert!(!Arc::ptr_eq(&first, &coordinator.latest_snapshot().unwrap()));
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn entities_project_development_plug() {
        let plug = MockSmartPlug::new().with_state(PowerState::On);
        let coordinator = started(&plug).await;

        let values: Vec<_> = entity::sensors(&coordinator)
            .iter()
            .map(|sensor| (sensor.key(), sensor.native_value()))
            .collect();
        assert_eq!(
            values,
            vec![("current_power", Some(10.0)), ("total_power", Some(1000.0))]
        );

        let switch = entity::switches(&coordinator).remove(0);
        assert_eq!(switch.is_on(), Some(true));
        assert_eq!(switch.key(), "onoff");
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_poll_picks_up_new_readings() {
        let plug = MockSmartPlug::new().with_power(5.0);
        let coordinator = started(&plug).await;
        let sensor = entity::sensors(&coordinator).remove(0);

        plug.set_power(75.5);
        assert_eq!(sensor.native_value(), Some(5.0));

        past_next_tick().await;

        assert_eq!(sensor.native_value(), Some(75.5));
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn info_is_read_once() {
        let plug = MockSmartPlug::new();
        let coordinator = started(&plug).await;

        past_next_tick().await;
        past_next_tick().await;

        let info_calls = plug
            .calls()
            .iter()
            .filter(|call| **call == MockCall::GetInfo)
            .count();
        assert_eq!(info_calls, 1);
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn non_finite_reading_never_reaches_snapshot() {
        let plug = MockSmartPlug::new().with_energy_today(f64::NAN);

        let err = Coordinator::setup("Test plug", plug.clone())
            .await
            .unwrap_err();

        let Error::SetupFailed(cause) = err else {
            panic!("expected SetupFailed");
        };
        assert!(
            matches!(*cause, Error::Parse(ParseError::InvalidValue { ref field, .. }) if field == "energy_today_kwh")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn non_finite_poll_keeps_last_good_snapshot() {
        let plug = MockSmartPlug::new();
        let coordinator = started(&plug).await;
        let first = coordinator.latest_snapshot().unwrap();

        plug.set_power(f64::NAN);
        past_next_tick().await;

        assert!(Arc::ptr_eq(&first, &coordinator.latest_snapshot().unwrap()));
        assert!(!coordinator.is_available());
        assert_eq!(coordinator.last_error().unwrap().kind, ErrorKind::Parse);

        let sensors = entity::sensors(&coordinator);
        assert_eq!(sensors.len(), 2);
        assert_eq!(sensors[0].native_value(), Some(MockSmartPlug::DEFAULT_POWER_WATTS));
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_setup_reports_cause() {
        let plug = MockSmartPlug::new();
        plug.fail_next(1);

        let err = Coordinator::setup("Test plug", plug.clone())
            .await
            .unwrap_err();

        let Error::SetupFailed(cause) = err else {
            panic!("expected SetupFailed");
        };
        assert_eq!(cause.kind(), ErrorKind::Connection);

        // No polling task was left behind.
        plug.clear_calls();
        sleep(INTERVAL * 3).await;
        assert!(plug.calls().is_empty());
    }
}

// ============================================================================
// Concurrency
// ============================================================================

mod concurrency {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn polls_and_writes_never_overlap() {
        let plug = MockSmartPlug::new().with_latency(Duration::from_secs(5));
        let coordinator = Coordinator::setup("Slow plug", plug.clone()).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..2 {
            let coordinator = coordinator.clone();
            tasks.push(tokio::spawn(async move {
                coordinator.force_refresh().await.map(|_| ())
            }));
        }
        let writer = coordinator.clone();
        tasks.push(tokio::spawn(async move { writer.set_power(true).await }));

        // Long enough for the scheduled tick to land while the queue is busy.
        sleep(INTERVAL * 3).await;

        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(plug.max_concurrent_calls(), 1);
        assert_eq!(plug.power_state(), PowerState::On);
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn hung_call_is_cut_off() {
        let plug = MockSmartPlug::new().with_latency(Duration::from_secs(60));
        let start = tokio::time::Instant::now();

        let err = Coordinator::setup("Hung plug", plug).await.unwrap_err();

        let Error::SetupFailed(cause) = err else {
            panic!("expected SetupFailed");
        };
        assert!(matches!(*cause, Error::Protocol(ProtocolError::Timeout(10_000))));
        assert!(start.elapsed() < Duration::from_secs(60));
    }
}

// ============================================================================
// Switching
// ============================================================================

mod switching {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn write_is_followed_by_one_refresh() {
        let plug = MockSmartPlug::new().with_state(PowerState::On);
        let coordinator = started(&plug).await;
        let switch = entity::switches(&coordinator).remove(0);
        plug.clear_calls();

        switch.turn_off().await.unwrap();

        assert_eq!(
            plug.calls(),
            vec![
                MockCall::SetState(PowerState::Off),
                MockCall::GetState,
                MockCall::GetPower,
                MockCall::GetEnergyToday,
            ]
        );
        assert_eq!(switch.is_on(), Some(false));
        assert_eq!(switch.state_json()["state"], "off");
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_raw_state_leaves_plug_untouched() {
        let plug = MockSmartPlug::new().with_state(PowerState::On);

        for value in ["toggle", "On", "1", ""] {
            let err = plug.set_state_str(value).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidValue);
        }

        assert!(plug.calls().is_empty());
        assert_eq!(plug.power_state(), PowerState::On);
    }

    #[tokio::test(start_paused = true)]
    async fn write_failure_alone_keeps_plug_available() {
        let plug = MockSmartPlug::new();
        let coordinator = started(&plug).await;
        let switch = entity::switches(&coordinator).remove(0);

        plug.reject_writes(true);
        let err = switch.turn_on().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OperationFailed);
        assert!(switch.available());
        assert_eq!(switch.is_on(), Some(false));

        plug.reject_writes(false);
        plug.set_offline(true);
        assert!(switch.turn_on().await.is_err());
        assert!(!switch.available());
        assert_eq!(switch.is_on(), Some(false));
        coordinator.shutdown().await;
    }
}

// ============================================================================
// Listeners
// ============================================================================

mod listeners {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn listeners_see_successes_only() {
        let plug = MockSmartPlug::new();
        let coordinator = started(&plug).await;

        let snapshots = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&snapshots);
        coordinator.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let transitions = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen = Arc::clone(&transitions);
        coordinator.on_availability_changed(move |available| seen.lock().push(available));

        past_next_tick().await;
        assert_eq!(snapshots.load(Ordering::SeqCst), 1);

        plug.set_offline(true);
        past_next_tick().await;
        past_next_tick().await;
        assert_eq!(snapshots.load(Ordering::SeqCst), 1);

        plug.set_offline(false);
        past_next_tick().await;
        assert_eq!(snapshots.load(Ordering::SeqCst), 2);

        assert_eq!(*transitions.lock(), vec![false, true]);
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribed_listener_is_not_called() {
        let plug = MockSmartPlug::new();
        let coordinator = started(&plug).await;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = coordinator.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(coordinator.unsubscribe(id));
        coordinator.force_refresh().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        coordinator.shutdown().await;
    }
}

// ============================================================================
// Teardown
// ============================================================================

mod teardown {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn teardown_waits_for_poll_in_progress() {
        let plug = MockSmartPlug::new().with_latency(Duration::from_secs(2));
        let coordinator = Coordinator::setup("Slow plug", plug.clone()).await.unwrap();
        plug.clear_calls();

        let refresher = coordinator.clone();
        let in_flight = tokio::spawn(async move { refresher.force_refresh().await });
        sleep(Duration::from_secs(1)).await;

        coordinator.shutdown().await;

        assert!(in_flight.is_finished());
        assert!(in_flight.await.unwrap().is_ok());
        assert_eq!(plug.calls().len(), 3);
    }

    /// Client that records when it is dropped.
    struct TrackedPlug {
        plug: MockSmartPlug,
        dropped: Arc<AtomicBool>,
    }

    impl Drop for TrackedPlug {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    impl DeviceClient for TrackedPlug {
        async fn get_state(&self) -> Result<PowerState> {
            self.plug.get_state().await
        }

        async fn set_state(&self, state: PowerState) -> Result<()> {
            self.plug.set_state(state).await
        }

        async fn get_info(&self) -> Result<DeviceInfo> {
            self.plug.get_info().await
        }

        async fn get_power(&self) -> Result<f64> {
            self.plug.get_power().await
        }

        async fn get_energy_today(&self) -> Result<f64> {
            self.plug.get_energy_today().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_releases_client_while_entities_live() {
        let dropped = Arc::new(AtomicBool::new(false));
        let client = TrackedPlug {
            plug: MockSmartPlug::new().with_latency(Duration::from_secs(2)),
            dropped: Arc::clone(&dropped),
        };
        let coordinator = setup_with_client(&PlugConfig::new("mock"), client)
            .await
            .unwrap();
        let sensors = entity::sensors(&coordinator);
        let switch = entity::switches(&coordinator).remove(0);

        let refresher = coordinator.clone();
        let in_flight = tokio::spawn(async move { refresher.force_refresh().await });
        sleep(Duration::from_secs(1)).await;
        assert!(!dropped.load(Ordering::SeqCst));

        teardown(coordinator).await;

        assert!(in_flight.await.unwrap().is_ok());
        assert!(dropped.load(Ordering::SeqCst));
        assert_eq!(sensors[1].native_value(), Some(MockSmartPlug::DEFAULT_ENERGY_TODAY_KWH));
        assert!(matches!(switch.turn_on().await, Err(Error::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_coordinator_never_calls_plug() {
        let plug = MockSmartPlug::new();
        let coordinator = started(&plug).await;
        let sensor = entity::sensors(&coordinator).remove(0);

        coordinator.shutdown().await;
        coordinator.shutdown().await;
        plug.clear_calls();

        sleep(INTERVAL * 4).await;
        assert!(matches!(coordinator.force_refresh().await, Err(Error::Closed)));
        assert!(matches!(coordinator.set_power(true).await, Err(Error::Closed)));

        assert!(plug.calls().is_empty());
        assert!(coordinator.is_closed());
        assert_eq!(sensor.native_value(), Some(MockSmartPlug::DEFAULT_POWER_WATTS));
    }
}
