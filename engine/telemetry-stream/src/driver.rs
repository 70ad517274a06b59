//! Streaming driver

use crate::error::StreamError;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, ReentrantMutex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use telemetry_engine::{DeviceSnapshot, KpiSummary, TelemetryEngine};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

static NEXT_DRIVER_ID: AtomicU64 = AtomicU64::new(1);

/// Composite payload delivered on every stream tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamPayload {
    pub timestamp: DateTime<Utc>,
    pub device_snapshots: Vec<DeviceSnapshot>,
    pub kpis: KpiSummary,
}

/// Identifies one running stream of one driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamHandle {
    driver_id: u64,
    stream_id: u64,
}

impl StreamHandle {
    pub fn id(&self) -> u64 {
        self.stream_id
    }
}

/// Delivery counters of one stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStats {
    /// Payloads handed to the subscriber
    pub delivered: u64,

    /// Ticks skipped because the engine returned an error
    pub failed: u64,
}

#[derive(Default)]
struct StreamCounters {
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Whether the subscriber still wants payloads
enum Delivery {
    Continue,
    Closed,
}

/// State shared between a stream task and the driver.
///
/// `gate` is held for the whole of a delivery and by `stop`, so a stop
/// either waits for the delivery in flight or prevents the next one. It is
/// re-entrant so the subscriber may stop its own stream.
struct StreamControl {
    gate: ReentrantMutex<()>,
    stopped: AtomicBool,
    counters: StreamCounters,
}

struct StreamEntry {
    control: Arc<StreamControl>,
    task: JoinHandle<()>,
}

type StreamMap = Arc<Mutex<HashMap<u64, StreamEntry>>>;

/// Runs telemetry streams over a shared engine
pub struct StreamDriver {
    id: u64,
    engine: Arc<TelemetryEngine>,
    streams: StreamMap,
    next_stream_id: AtomicU64,
}

impl StreamDriver {
    pub fn new(engine: Arc<TelemetryEngine>) -> Self {
        Self {
            id: NEXT_DRIVER_ID.fetch_add(1, Ordering::Relaxed),
            engine,
            streams: Arc::new(Mutex::new(HashMap::new())),
            next_stream_id: AtomicU64::new(1),
        }
    }

    /// Deliver a payload to `on_data` every `interval`, starting one full
    /// interval from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&self, mut on_data: F, interval: Duration) -> Result<StreamHandle, StreamError>
    where
        F: FnMut(StreamPayload) + Send + 'static,
    {
        self.spawn_stream(interval, move |payload| {
            on_data(payload);
            Delivery::Continue
        })
    }

    /// Deliver payloads into a channel. Dropping the receiver stops the stream.
    pub fn start_channel(
        &self,
        interval: Duration,
    ) -> Result<(StreamHandle, mpsc::UnboundedReceiver<StreamPayload>), StreamError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.spawn_stream(interval, move |payload| match tx.send(payload) {
            Ok(()) => Delivery::Continue,
            Err(_) => Delivery::Closed,
        })?;
        Ok((handle, rx))
    }

    /// Stop a stream. Unknown, foreign and already stopped handles are ignored.
    pub fn stop(&self, handle: StreamHandle) {
        if handle.driver_id != self.id {
            debug!("Ignoring stop for stream {} of another driver", handle.stream_id);
            return;
        }

        let entry = self.streams.lock().remove(&handle.stream_id);
        match entry {
            Some(entry) => {
                shutdown(&entry);
                info!("Stopped telemetry stream {}", handle.stream_id);
            }
            None => debug!("Stream {} is not running", handle.stream_id),
        }
    }

    /// Stop every stream of this driver
    pub fn stop_all(&self) {
        let entries: Vec<(u64, StreamEntry)> = self.streams.lock().drain().collect();
        for (stream_id, entry) in &entries {
            shutdown(entry);
            debug!("Stopped telemetry stream {}", stream_id);
        }
        if !entries.is_empty() {
            info!("Stopped {} telemetry streams", entries.len());
        }
    }

    /// Number of running streams
    pub fn active_streams(&self) -> usize {
        self.streams.lock().len()
    }

    pub fn is_active(&self, handle: StreamHandle) -> bool {
        handle.driver_id == self.id && self.streams.lock().contains_key(&handle.stream_id)
    }

    /// Delivery counters of a running stream
    pub fn stats(&self, handle: StreamHandle) -> Option<StreamStats> {
        if handle.driver_id != self.id {
            return None;
        }
        self.streams.lock().get(&handle.stream_id).map(|entry| {
            let counters = &entry.control.counters;
            StreamStats {
                delivered: counters.delivered.load(Ordering::Relaxed),
                failed: counters.failed.load(Ordering::Relaxed),
            }
        })
    }

    pub fn engine(&self) -> &Arc<TelemetryEngine> {
        &self.engine
    }

    fn spawn_stream<S>(&self, interval: Duration, sink: S) -> Result<StreamHandle, StreamError>
    where
        S: FnMut(StreamPayload) -> Delivery + Send + 'static,
    {
        if interval.is_zero() {
            return Err(StreamError::InvalidInterval(interval));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| StreamError::NoRuntime)?;

        let stream_id = self.next_stream_id.fetch_add(1, Ordering::Relaxed);
        let control = Arc::new(StreamControl {
            gate: ReentrantMutex::new(()),
            stopped: AtomicBool::new(false),
            counters: StreamCounters::default(),
        });

        // Hold the map lock across the spawn so the task cannot finish and
        // deregister before it is registered.
        let mut streams = self.streams.lock();
        let task = runtime.spawn(run_stream(
            stream_id,
            interval,
            Arc::clone(&self.engine),
            Arc::clone(&control),
            Arc::clone(&self.streams),
            sink,
        ));
        streams.insert(stream_id, StreamEntry { control, task });
        drop(streams);

        info!("Started telemetry stream {} every {:?}", stream_id, interval);
        Ok(StreamHandle { driver_id: self.id, stream_id })
    }
}

impl Drop for StreamDriver {
    fn drop(&mut self) {
        self.stop_all();
    }
}

fn shutdown(entry: &StreamEntry) {
    let _gate = entry.control.gate.lock();
    entry.control.stopped.store(true, Ordering::SeqCst);
    entry.task.abort();
}

async fn run_stream<S>(
    stream_id: u64,
    period: Duration,
    engine: Arc<TelemetryEngine>,
    control: Arc<StreamControl>,
    streams: StreamMap,
    mut sink: S,
) where
    S: FnMut(StreamPayload) -> Delivery + Send + 'static,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !deliver(stream_id, &engine, &control, &mut sink) {
            break;
        }
    }

    // Stopped streams were already removed by the driver
    if !control.stopped.swap(true, Ordering::SeqCst) {
        streams.lock().remove(&stream_id);
        info!("Telemetry stream {} closed by its subscriber", stream_id);
    }
}

/// Run one tick under the gate. Returns false once the stream must end.
fn deliver<S>(
    stream_id: u64,
    engine: &TelemetryEngine,
    control: &StreamControl,
    sink: &mut S,
) -> bool
where
    S: FnMut(StreamPayload) -> Delivery,
{
    let _gate = control.gate.lock();
    if control.stopped.load(Ordering::SeqCst) {
        return false;
    }

    let payload = match build_payload(engine) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Telemetry stream {} skipped a tick: {}", stream_id, e);
            control.counters.failed.fetch_add(1, Ordering::Relaxed);
            return true;
        }
    };

    debug!(
        "Stream {} delivering {} snapshots",
        stream_id,
        payload.device_snapshots.len()
    );
    let delivery = sink(payload);
    control.counters.delivered.fetch_add(1, Ordering::Relaxed);

    match delivery {
        Delivery::Continue => !control.stopped.load(Ordering::SeqCst),
        Delivery::Closed => false,
    }
}

fn build_payload(engine: &TelemetryEngine) -> telemetry_engine::Result<StreamPayload> {
    let device_snapshots = engine.snapshot_all()?;
    let kpis = engine.kpi_summary()?;
    Ok(StreamPayload { timestamp: Utc::now(), device_snapshots, kpis })
}
