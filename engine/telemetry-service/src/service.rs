//! Service state management and component initialization

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

use device_catalog::DeviceCatalog;
use telemetry_engine::{
    sort_snapshots, DeviceSnapshot, KpiSummary, SortOrder, TelemetryEngine, TimeSeriesPoint,
};
use telemetry_stream::StreamDriver;

use crate::config::ServiceConfig;

/// Service state containing all initialized components
pub struct ServiceState {
    /// Service configuration
    pub config: ServiceConfig,

    /// Shared telemetry engine
    pub engine: Arc<TelemetryEngine>,

    /// Stream driver over `engine`
    pub driver: StreamDriver,

    /// Service start time
    pub started_at: DateTime<Utc>,
}

impl ServiceState {
    /// Create a new service state with all components initialized
    pub fn new(config: ServiceConfig) -> Result<Self> {
        info!("Initializing service components...");

        let catalog = match &config.service.catalog_file {
            Some(path) => {
                info!("Loading device catalog from {:?}", path);
                DeviceCatalog::load_from_file(path)
                    .with_context(|| format!("Failed to load device catalog: {:?}", path))?
            }
            None => DeviceCatalog::default_catalog(),
        };
        info!("Device catalog ready with {} devices", catalog.len());

        let engine = TelemetryEngine::new(Arc::new(catalog), config.simulation.clone())
            .context("Failed to create TelemetryEngine")?;
        let engine = Arc::new(engine);
        let driver = StreamDriver::new(Arc::clone(&engine));

        Ok(Self { config, engine, driver, started_at: Utc::now() })
    }

    /// Stream payloads to `out` as JSON lines until the stream ends, `ticks`
    /// payloads were written or the streams are stopped. Returns the number
    /// of payloads written.
    pub async fn run_stream<W: Write + Send>(&self, ticks: Option<u64>, mut out: W) -> Result<u64> {
        let interval = self.config.stream.interval();
        let (handle, mut rx) =
            self.driver.start_channel(interval).context("Failed to start telemetry stream")?;
        info!("Streaming telemetry every {:?}", interval);

        let mut written = 0u64;
        while let Some(payload) = rx.recv().await {
            let line = serde_json::to_string(&payload).context("Failed to serialize payload")?;
            writeln!(out, "{line}").context("Failed to write payload")?;
            out.flush().context("Failed to flush output")?;
            written += 1;
            debug!("Wrote payload {}", written);

            if ticks.is_some_and(|limit| written >= limit) {
                break;
            }
        }

        self.driver.stop(handle);
        Ok(written)
    }

    /// One snapshot pass, ordered for display
    pub fn snapshot(&self, order: SortOrder) -> Result<Vec<DeviceSnapshot>> {
        let mut snapshots = self.engine.snapshot_all()?;
        sort_snapshots(&mut snapshots, order);
        Ok(snapshots)
    }

    pub fn kpi(&self) -> Result<KpiSummary> {
        Ok(self.engine.kpi_summary()?)
    }

    pub fn series(&self, window: usize, interval_hours: f64) -> Result<Vec<TimeSeriesPoint>> {
        Ok(self.engine.time_series(window, interval_hours)?)
    }

    /// Stop every running stream
    pub fn stop_streams(&self) {
        self.driver.stop_all();
    }

    /// Shutdown all components
    pub fn shutdown(&self) {
        self.driver.stop_all();

        let metrics = self.engine.metrics();
        let uptime = Utc::now() - self.started_at;
        info!(
            "Service ran for {}s: {} ticks, {} status flips, {} KPI summaries",
            uptime.num_seconds(),
            metrics.ticks_processed,
            metrics.status_flips,
            metrics.kpi_computations
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry_engine::{SortDirection, SortKey};
    use telemetry_stream::StreamPayload;
    use tokio_test::{assert_err, assert_ok};

    fn create_test_state() -> ServiceState {
        let mut config = ServiceConfig::default();
        config.simulation.seed = Some(31);
        config.stream.interval_ms = 10;
        ServiceState::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_run_stream_stops_after_ticks() {
        let state = create_test_state();
        let mut out = Vec::new();

        let written = assert_ok!(state.run_stream(Some(3), &mut out).await);
        assert_eq!(written, 3);
        assert_eq!(state.driver.active_streams(), 0);

        let text = String::from_utf8(out).unwrap();
        let payloads: Vec<StreamPayload> =
            text.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
        assert_eq!(payloads.len(), 3);
        assert!(payloads.iter().all(|p| p.device_snapshots.len() == 8));
    }

    #[tokio::test]
    async fn test_stop_streams_ends_run() {
        let state = Arc::new(create_test_state());
        let task = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.run_stream(None, std::io::sink()).await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(60)).await;
        state.stop_streams();

        let joined = assert_ok!(tokio::time::timeout(std::time::Duration::from_secs(2), task).await);
        let written = assert_ok!(assert_ok!(joined));
        assert!(written >= 1);
    }

    #[test]
    fn test_snapshot_ordering() {
        let state = create_test_state();
        let order = SortOrder::new(SortKey::Id, SortDirection::Descending);

        let snapshots = state.snapshot(order).unwrap();
        assert_eq!(snapshots.first().map(|s| s.id()), Some("DEV-1008"));
        assert_eq!(snapshots.last().map(|s| s.id()), Some("DEV-1001"));
    }

    #[test]
    fn test_custom_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        DeviceCatalog::default_catalog().save_to_file(&path).unwrap();

        let mut config = ServiceConfig::default();
        config.service.catalog_file = Some(path);
        let state = assert_ok!(ServiceState::new(config));
        assert_eq!(state.engine.catalog().len(), 8);
    }

    #[test]
    fn test_missing_catalog_file() {
        let mut config = ServiceConfig::default();
        config.service.catalog_file = Some(std::path::PathBuf::from("/nonexistent/catalog.json"));
        let err = ServiceState::new(config).err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("Failed to load device catalog: \"/nonexistent/catalog.json\""));
    }

    #[test]
    fn test_series_rejects_bad_interval() {
        let state = create_test_state();
        assert_ok!(state.series(4, 1.0));
        assert_err!(state.series(4, 0.0));
    }
}
