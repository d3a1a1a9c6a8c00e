use crate::errors::AppResult;
use crate::logger::SensorLogger;
use crate::models::TickSummary;
use crate::registry;
use crate::sensors::SensorSource;
use crate::store::SpreadsheetStore;
use tokio::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

/// Owns everything the daemon keeps between ticks. Ticks run strictly one
/// after another; any error ends the loop.
pub struct Poller<S, R> {
    store: S,
    sensors: R,
    logger: SensorLogger,
    interval: Duration,
}

impl<S: SpreadsheetStore, R: SensorSource> Poller<S, R> {
    pub fn new(store: S, sensors: R, interval: Duration) -> Self {
        Self {
            store,
            sensors,
            logger: SensorLogger::new(),
            interval,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn logger(&self) -> &SensorLogger {
        &self.logger
    }

    pub async fn run_tick(&mut self) -> AppResult<TickSummary> {
        let readings = self.sensors.list_sensors().await?;
        let mut summary = TickSummary {
            sensors: readings.len(),
            ..TickSummary::default()
        };

        for reading in &readings {
            for metric in registry::metric_names() {
                let outcome = self.logger.log_if_new(reading, metric, &self.store).await?;
                tracing::trace!(metric = %metric, sensor_id = %reading.id, outcome = outcome.as_str(), "handled reading");
                summary.record(outcome);
            }
        }

        tracing::debug!(
            sensors = summary.sensors,
            logged = summary.logged,
            duplicates = summary.duplicates,
            "poll tick finished"
        );
        Ok(summary)
    }

    pub async fn run_forever(&mut self) -> AppResult<()> {
        loop {
            self.run_tick().await?;
            tokio::time::sleep(self.interval).await;
        }
    }
}
