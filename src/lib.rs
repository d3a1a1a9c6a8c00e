//! Polls the Telldus bridge through `tdtool --list-sensors` and records new
//! temperature and humidity readings in a Google Spreadsheet, one worksheet
//! per metric, newest reading first.

pub mod config;
pub mod errors;
pub mod logger;
pub mod models;
pub mod poller;
pub mod registry;
pub mod sensors;
pub mod store;
pub mod worksheets;

use crate::config::{DaemonConfig, LogFormat};
use crate::errors::{AppError, AppResult};
use crate::poller::Poller;
use crate::sensors::CommandSensorSource;
use crate::store::auth::{ServiceAccountKey, TokenProvider};
use crate::store::GoogleSheetsStore;

pub async fn run() -> AppResult<()> {
    init_tracing(config::log_format_from_env()).map_err(AppError::Config)?;

    let config = DaemonConfig::from_env()?;
    tracing::info!(
        credentials = %config.credentials_path.display(),
        interval_secs = config.poll_interval.as_secs(),
        command = %config.sensor_command,
        "starting sensor sync"
    );

    let key = ServiceAccountKey::from_file(&config.credentials_path)?;
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;
    let tokens = TokenProvider::new(key, config.scope.clone(), http.clone());
    let store = GoogleSheetsStore::open(config.spreadsheet_key.clone(), tokens, http).await?;

    let sensors = CommandSensorSource::new(config.sensor_command.clone());
    let mut poller = Poller::new(store, sensors, config.poll_interval);
    poller.run_forever().await.inspect_err(|error| {
        tracing::error!(error = %error, "sensor sync stopped");
    })
}

fn init_tracing(format: LogFormat) -> Result<(), String> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
    .map_err(|error| error.to_string())
}
