use crate::errors::{AppError, AppResult};
use crate::poller::DEFAULT_POLL_INTERVAL;
use crate::sensors::SensorCommand;
use crate::store::auth::SPREADSHEETS_SCOPE;
use std::path::{Path, PathBuf};
use tokio::time::Duration;

pub const ENV_SPREADSHEET_KEY: &str = "GOOGLE_SPREADSHEET_KEY";
pub const ENV_CREDENTIALS: &str = "TELLDUS_SHEETS_CREDENTIALS";
pub const ENV_POLL_INTERVAL_SECS: &str = "TELLDUS_SHEETS_POLL_INTERVAL_SECS";
pub const ENV_SENSOR_COMMAND: &str = "TELLDUS_SHEETS_SENSOR_COMMAND";
pub const ENV_LOG_FORMAT: &str = "TELLDUS_SHEETS_LOG_FORMAT";
pub const CREDENTIALS_FILE_NAME: &str = "credentials.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub spreadsheet_key: String,
    pub credentials_path: PathBuf,
    pub poll_interval: Duration,
    pub sensor_command: SensorCommand,
    pub scope: String,
}

impl DaemonConfig {
    pub fn from_env() -> AppResult<Self> {
        let program_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_lookup(|name| std::env::var(name).ok(), &program_dir)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, program_dir: &Path) -> AppResult<Self> {
        let spreadsheet_key = lookup(ENV_SPREADSHEET_KEY)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::Config(format!("environment variable {} must be set", ENV_SPREADSHEET_KEY)))?;

        let credentials_path = lookup(ENV_CREDENTIALS)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| program_dir.join(CREDENTIALS_FILE_NAME));

        let poll_interval = match lookup(ENV_POLL_INTERVAL_SECS) {
            Some(raw) => parse_interval(&raw)?,
            None => DEFAULT_POLL_INTERVAL,
        };

        let sensor_command = match lookup(ENV_SENSOR_COMMAND) {
            Some(raw) => SensorCommand::parse(&raw)
                .ok_or_else(|| AppError::Config(format!("{} must name a command", ENV_SENSOR_COMMAND)))?,
            None => SensorCommand::default(),
        };

        Ok(Self {
            spreadsheet_key,
            credentials_path,
            poll_interval,
            sensor_command,
            scope: SPREADSHEETS_SCOPE.to_string(),
        })
    }
}

fn parse_interval(raw: &str) -> AppResult<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(AppError::Config(format!(
            "{} must be a positive number of seconds, got {:?}",
            ENV_POLL_INTERVAL_SECS, raw
        ))),
    }
}

pub fn log_format_from_env() -> LogFormat {
    match std::env::var(ENV_LOG_FORMAT) {
        Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::{DaemonConfig, ENV_CREDENTIALS, ENV_POLL_INTERVAL_SECS, ENV_SENSOR_COMMAND, ENV_SPREADSHEET_KEY};
    use crate::errors::AppError;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use tokio::time::Duration;

    fn load(vars: &[(&str, &str)]) -> Result<DaemonConfig, AppError> {
        let env: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        DaemonConfig::from_lookup(|name| env.get(name).cloned(), Path::new("/opt/telldus-sheets"))
    }

    #[test]
    fn defaults_follow_program_location() {
        let config = load(&[(ENV_SPREADSHEET_KEY, "sheet-key")]).expect("config");
        assert_eq!(config.spreadsheet_key, "sheet-key");
        assert_eq!(config.credentials_path, PathBuf::from("/opt/telldus-sheets/credentials.json"));
        assert_eq!(config.poll_interval, Duration::from_secs(20));
        assert_eq!(config.sensor_command.to_string(), "tdtool --list-sensors");
    }

    #[test]
    fn missing_spreadsheet_key_is_fatal() {
        let err = load(&[]).expect_err("missing key");
        assert!(matches!(err, AppError::Config(_)));
        let err = load(&[(ENV_SPREADSHEET_KEY, "   ")]).expect_err("blank key");
        assert!(err.to_string().contains(ENV_SPREADSHEET_KEY));
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            (ENV_SPREADSHEET_KEY, "k"),
            (ENV_CREDENTIALS, "/etc/telldus/key.json"),
            (ENV_POLL_INTERVAL_SECS, "45"),
            (ENV_SENSOR_COMMAND, "bash mock-tdtool.sh"),
        ])
        .expect("config");
        assert_eq!(config.credentials_path, PathBuf::from("/etc/telldus/key.json"));
        assert_eq!(config.poll_interval, Duration::from_secs(45));
        assert_eq!(config.sensor_command.program, "bash");
    }

    #[test]
    fn rejects_bad_interval_and_empty_command() {
        assert!(load(&[(ENV_SPREADSHEET_KEY, "k"), (ENV_POLL_INTERVAL_SECS, "0")]).is_err());
        assert!(load(&[(ENV_SPREADSHEET_KEY, "k"), (ENV_POLL_INTERVAL_SECS, "soon")]).is_err());
        assert!(load(&[(ENV_SPREADSHEET_KEY, "k"), (ENV_SENSOR_COMMAND, " ")]).is_err());
    }
}
