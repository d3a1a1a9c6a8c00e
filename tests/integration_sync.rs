#![cfg(unix)]

use telldus_sheets_lib::errors::AppError;
use telldus_sheets_lib::poller::Poller;
use telldus_sheets_lib::sensors::{CommandSensorSource, SensorCommand, SensorSource};
use telldus_sheets_lib::store::MemoryStore;
use tokio::time::Duration;

fn mock_tdtool(scenario: &str) -> CommandSensorSource {
    CommandSensorSource::new(SensorCommand::new(
        "bash",
        ["tests/fixtures/mock-tdtool.sh", scenario],
    ))
}

#[tokio::test]
async fn lists_sensors_from_tool_output() {
    let readings = mock_tdtool("--list-sensors").list_sensors().await.expect("list sensors");
    assert_eq!(readings.len(), 2);
    assert_eq!(readings[0].id, "135");
    assert_eq!(readings[0].time, "2024-01-05 12:00:00");
    assert_eq!(readings[0].field("humidity"), Some("42"));
    assert_eq!(readings[1].field("protocol"), Some("mandolyn"));
}

#[tokio::test]
async fn nonzero_exit_is_sensor_failure() {
    let err = mock_tdtool("--fail").list_sensors().await.expect_err("tool failed");
    assert!(matches!(err, AppError::Sensor(_)));
    assert!(err.to_string().contains("could not connect"));
}

#[tokio::test]
async fn malformed_output_fails_whole_listing() {
    let err = mock_tdtool("--malformed").list_sensors().await.expect_err("malformed");
    assert!(matches!(err, AppError::Parse(_)));
}

#[tokio::test]
async fn missing_tool_is_reported() {
    let source = CommandSensorSource::new(SensorCommand::new("tdtool-definitely-not-installed", ["--list-sensors"]));
    let err = source.list_sensors().await.expect_err("missing tool");
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn tick_writes_both_metrics_for_every_sensor() {
    let mut poller = Poller::new(MemoryStore::new(), mock_tdtool("--list-sensors"), Duration::from_millis(1));

    let summary = poller.run_tick().await.expect("tick");

    assert_eq!(summary.sensors, 2);
    // Both sensors share one dedup entry per metric; their timestamps differ,
    // so each gets its own row.
    assert_eq!(summary.logged, 4);
    let temperature = poller.store().rows("temperature").expect("temperature rows");
    assert_eq!(temperature[0], vec!["id", "time", "temperature"]);
    assert_eq!(temperature[1], vec!["136", "2024-01-05 12:00:05", "4.0"]);
    assert_eq!(temperature[2], vec!["135", "2024-01-05 12:00:00", "21.5"]);
    assert_eq!(poller.store().worksheet_titles(), vec!["humidity", "temperature"]);
}

#[tokio::test]
async fn sensor_without_humidity_aborts_tick_after_temperature_row() {
    let mut poller = Poller::new(MemoryStore::new(), mock_tdtool("--split"), Duration::from_millis(1));

    let err = poller.run_tick().await.expect_err("humidity is missing on first sensor");

    match err {
        AppError::MissingField { metric, field } => {
            assert_eq!(metric, "humidity");
            assert_eq!(field, "humidity");
        }
        other => panic!("unexpected error: {other}"),
    }
    let temperature = poller.store().rows("temperature").expect("temperature rows");
    assert_eq!(temperature, vec![vec!["id", "time", "temperature"], vec!["1", "100", "21.5"]]);
    assert!(poller.store().rows("humidity").is_none());
}
