use crate::errors::{AppError, AppResult};

/// Supported metrics and the reading fields written, in column order, to the
/// worksheet named after each metric.
pub const METRICS: &[(&str, &[&str])] = &[
    ("temperature", &["id", "time", "temperature"]),
    ("humidity", &["id", "time", "humidity"]),
];

pub fn metric_names() -> impl Iterator<Item = &'static str> {
    METRICS.iter().map(|(name, _)| *name)
}

pub fn is_supported(metric: &str) -> bool {
    METRICS.iter().any(|(name, _)| *name == metric)
}

pub fn fields_for(metric: &str) -> AppResult<&'static [&'static str]> {
    METRICS
        .iter()
        .find(|(name, _)| *name == metric)
        .map(|(_, fields)| *fields)
        .ok_or_else(|| AppError::InvalidMetric {
            metric: metric.to_string(),
            supported: metric_names().map(ToString::to_string).collect(),
        })
}
