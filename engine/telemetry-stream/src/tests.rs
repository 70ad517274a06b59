//! Unit tests for the streaming driver

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use telemetry_engine::{DeviceCatalog, SimulationConfig, TelemetryEngine};
use tokio_test::{assert_err, assert_ok};

use crate::{
    StreamConfig, StreamDriver, StreamError, StreamHandle, StreamPayload,
    DEFAULT_STREAM_INTERVAL_MS,
};

fn create_test_driver() -> StreamDriver {
    let config = SimulationConfig { seed: Some(21), ..Default::default() };
    let engine = TelemetryEngine::new(Arc::new(DeviceCatalog::default_catalog()), config).unwrap();
    StreamDriver::new(Arc::new(engine))
}

fn counting_callback(counter: &Arc<AtomicUsize>) -> impl FnMut(StreamPayload) + Send {
    let counter = Arc::clone(counter);
    move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_immediate_stop_delivers_nothing() {
        let driver = create_test_driver();
        let calls = Arc::new(AtomicUsize::new(0));

        let handle =
            assert_ok!(driver.start(counting_callback(&calls), Duration::from_millis(100)));
        driver.stop(handle);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(driver.active_streams(), 0);
    }

    #[tokio::test]
    async fn test_deliveries_stop_after_stop() {
        let driver = create_test_driver();
        let calls = Arc::new(AtomicUsize::new(0));

        let handle = assert_ok!(driver.start(counting_callback(&calls), Duration::from_millis(20)));
        tokio::time::sleep(Duration::from_millis(150)).await;

        let stats = driver.stats(handle).unwrap();
        driver.stop(handle);
        let delivered = calls.load(Ordering::SeqCst);

        assert!(delivered >= 2, "expected at least two deliveries, got {delivered}");
        assert!(stats.delivered as usize <= delivered);
        assert_eq!(stats.failed, 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::SeqCst), delivered);
        assert!(driver.stats(handle).is_none());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let driver = create_test_driver();
        let calls = Arc::new(AtomicUsize::new(0));

        let handle = assert_ok!(driver.start(counting_callback(&calls), Duration::from_millis(50)));
        assert!(driver.is_active(handle));

        driver.stop(handle);
        driver.stop(handle);
        driver.stop(handle);

        assert!(!driver.is_active(handle));
        assert_eq!(driver.active_streams(), 0);
    }

    #[tokio::test]
    async fn test_stop_from_inside_callback() {
        let driver = Arc::new(create_test_driver());
        let calls = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<StreamHandle>>> = Arc::new(Mutex::new(None));

        let callback = {
            let driver = Arc::clone(&driver);
            let calls = Arc::clone(&calls);
            let slot = Arc::clone(&slot);
            move |_: StreamPayload| {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(handle) = *slot.lock() {
                    driver.stop(handle);
                }
            }
        };

        let handle = assert_ok!(driver.start(callback, Duration::from_millis(20)));
        *slot.lock() = Some(handle);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!driver.is_active(handle));
    }

    #[tokio::test]
    async fn test_stop_all() {
        let driver = create_test_driver();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            assert_ok!(driver.start(counting_callback(&calls), Duration::from_millis(100)));
        }
        assert_eq!(driver.active_streams(), 3);

        driver.stop_all();
        assert_eq!(driver.active_streams(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

#[cfg(test)]
mod misuse_tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let driver = create_test_driver();
        let calls = Arc::new(AtomicUsize::new(0));

        let err = assert_err!(driver.start(counting_callback(&calls), Duration::ZERO));
        assert_eq!(err, StreamError::InvalidInterval(Duration::ZERO));
        assert_eq!(driver.active_streams(), 0);
    }

    #[tokio::test]
    async fn test_foreign_handle_is_ignored() {
        let driver_a = create_test_driver();
        let driver_b = create_test_driver();
        let calls = Arc::new(AtomicUsize::new(0));

        let interval = Duration::from_millis(50);
        let handle_a = assert_ok!(driver_a.start(counting_callback(&calls), interval));
        let handle_b = assert_ok!(driver_b.start(counting_callback(&calls), interval));

        // Both drivers number their first stream 1
        assert_eq!(handle_a.id(), handle_b.id());

        driver_a.stop(handle_b);
        assert!(driver_a.is_active(handle_a));
        assert!(driver_b.is_active(handle_b));

        driver_a.stop_all();
        driver_b.stop_all();
    }

    #[test]
    fn test_start_outside_runtime() {
        let driver = create_test_driver();
        let result = driver.start(|_| {}, Duration::from_millis(10));
        assert_eq!(result.err(), Some(StreamError::NoRuntime));
    }
}

#[cfg(test)]
mod channel_tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_receives_payloads() {
        let driver = create_test_driver();
        let (handle, mut rx) = assert_ok!(driver.start_channel(Duration::from_millis(10)));

        let payload = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("payload within timeout")
            .expect("channel open");

        assert_eq!(payload.device_snapshots.len(), 8);
        assert_eq!(payload.kpis.total_devices, 8);
        assert!(payload.kpis.active_devices <= payload.kpis.total_devices);

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["deviceSnapshots"].is_array());
        assert!(json["kpis"]["activeDevices"].is_u64());

        driver.stop(handle);
    }

    #[tokio::test]
    async fn test_dropped_receiver_ends_stream() {
        let driver = create_test_driver();
        let (handle, rx) = assert_ok!(driver.start_channel(Duration::from_millis(10)));
        drop(rx);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!driver.is_active(handle));
        assert_eq!(driver.active_streams(), 0);
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_stream_config() {
        let config = StreamConfig::default();
        assert_eq!(config.interval_ms, DEFAULT_STREAM_INTERVAL_MS);
        assert_eq!(config.interval(), Duration::from_secs(5));
        assert!(config.validate().is_ok());

        let config = StreamConfig { interval_ms: 0 };
        assert_eq!(config.validate(), Err(StreamError::InvalidInterval(Duration::ZERO)));
    }
}
