use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("CONFIG_INVALID: {0}")]
    Config(String),
    #[error("AUTH_FAILURE: {0}")]
    Auth(String),
    #[error("SENSOR_FAILURE: {0}")]
    Sensor(String),
    #[error("PARSE_FAILURE: {0}")]
    Parse(String),
    #[error("INVALID_METRIC: \"{metric}\" is not a valid metric (use [{}])", .supported.join(", "))]
    InvalidMetric {
        metric: String,
        supported: Vec<String>,
    },
    #[error("MISSING_FIELD: reading has no \"{field}\" field required by metric \"{metric}\"")]
    MissingField { metric: String, field: String },
    #[error("REMOTE_STORE: {0}")]
    RemoteStore(String),
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::RemoteStore(format!("unexpected payload: {}", value))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        Self::RemoteStore(value.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Self::Auth(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn invalid_metric_lists_supported_names() {
        let error = AppError::InvalidMetric {
            metric: "bogus".to_string(),
            supported: vec!["temperature".to_string(), "humidity".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "INVALID_METRIC: \"bogus\" is not a valid metric (use [temperature, humidity])"
        );
    }
}
