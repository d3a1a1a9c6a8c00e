use crate::errors::{AppError, AppResult};
use crate::models::{LogOutcome, SensorReading};
use crate::registry;
use crate::store::SpreadsheetStore;
use crate::worksheets::WorksheetResolver;
use std::collections::HashMap;

/// Row index new readings are inserted at: directly below the header, so the
/// newest reading is always on top.
pub const DATA_ROW_INDEX: u32 = 2;

/// Writes readings to per-metric worksheets, skipping a reading whose
/// timestamp matches the last one logged for the same metric.
#[derive(Debug, Default)]
pub struct SensorLogger {
    resolver: WorksheetResolver,
    last_timestamps: HashMap<String, String>,
}

impl SensorLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_timestamp(&self, metric: &str) -> Option<&str> {
        self.last_timestamps.get(metric).map(String::as_str)
    }

    pub async fn log_if_new<S: SpreadsheetStore>(
        &mut self,
        reading: &SensorReading,
        metric: &str,
        store: &S,
    ) -> AppResult<LogOutcome> {
        let row = row_for(reading, metric)?;

        if self.last_timestamp(metric) == Some(reading.time.as_str()) {
            tracing::debug!(metric = %metric, sensor_id = %reading.id, time = %reading.time, "reading already logged");
            return Ok(LogOutcome::Duplicate);
        }

        self.last_timestamps.insert(metric.to_string(), reading.time.clone());
        let sheet = self.resolver.resolve(store, metric).await?;
        store.insert_row(&sheet, &row, DATA_ROW_INDEX).await?;

        tracing::info!(metric = %metric, sensor_id = %reading.id, time = %reading.time, "logged reading");
        Ok(LogOutcome::Logged)
    }
}

/// Extracts the metric's registry fields from `reading`, in column order.
pub fn row_for(reading: &SensorReading, metric: &str) -> AppResult<Vec<String>> {
    registry::fields_for(metric)?
        .iter()
        .map(|field| {
            reading
                .field(field)
                .map(ToString::to_string)
                .ok_or_else(|| AppError::MissingField {
                    metric: metric.to_string(),
                    field: field.to_string(),
                })
        })
        .collect()
}
