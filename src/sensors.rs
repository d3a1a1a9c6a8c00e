use crate::errors::{AppError, AppResult};
use crate::models::SensorReading;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::process::Stdio;
use tokio::process::Command;

pub const DEFAULT_SENSOR_PROGRAM: &str = "tdtool";
pub const DEFAULT_SENSOR_ARGS: &[&str] = &["--list-sensors"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SensorCommand {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program, parts))
    }
}

impl Default for SensorCommand {
    fn default() -> Self {
        Self::new(DEFAULT_SENSOR_PROGRAM, DEFAULT_SENSOR_ARGS.iter().copied())
    }
}

impl fmt::Display for SensorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

pub trait SensorSource: Send + Sync {
    /// Takes a fresh snapshot of every sensor the bridge currently reports.
    fn list_sensors(&self) -> impl Future<Output = AppResult<Vec<SensorReading>>> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct CommandSensorSource {
    command: SensorCommand,
}

impl CommandSensorSource {
    pub fn new(command: SensorCommand) -> Self {
        Self { command }
    }
}

impl SensorSource for CommandSensorSource {
    async fn list_sensors(&self) -> AppResult<Vec<SensorReading>> {
        let output = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|error| {
                if error.kind() == std::io::ErrorKind::NotFound {
                    AppError::Sensor(format!("`{}` not found; is it installed and on PATH?", self.command.program))
                } else {
                    AppError::Sensor(format!("failed to spawn `{}`: {}", self.command, error))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Sensor(format!(
                "`{}` exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let readings = parse_sensor_listing(&stdout)?;
        tracing::debug!(command = %self.command, sensors = readings.len(), "listed sensors");
        Ok(readings)
    }
}

/// Parses newline separated listing output. Blank lines are skipped; any other
/// malformed line fails the whole listing.
pub fn parse_sensor_listing(raw: &str) -> AppResult<Vec<SensorReading>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            parse_sensor_line(line).map_err(|error| match error {
                AppError::Parse(message) => AppError::Parse(format!("line {}: {}", index + 1, message)),
                other => other,
            })
        })
        .collect()
}

pub fn parse_sensor_line(line: &str) -> AppResult<SensorReading> {
    let mut fields = BTreeMap::new();
    // Stray or trailing tabs produce empty tokens.
    for token in line.split('\t').filter(|token| !token.is_empty()) {
        let Some((key, value)) = token.split_once('=') else {
            return Err(AppError::Parse(format!("token {:?} is not a key=value pair", token)));
        };
        if key.is_empty() {
            return Err(AppError::Parse(format!("token {:?} has an empty key", token)));
        }
        fields.insert(key.to_string(), value.to_string());
    }

    let id = fields
        .remove("id")
        .ok_or_else(|| AppError::Parse("reading has no id field".to_string()))?;
    let time = fields
        .remove("time")
        .ok_or_else(|| AppError::Parse("reading has no time field".to_string()))?;

    Ok(SensorReading {
        id,
        time,
        values: fields,
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_sensor_line, parse_sensor_listing, SensorCommand};
    use crate::errors::AppError;

    #[test]
    fn parses_tab_separated_pairs() {
        let reading = parse_sensor_line(
            "type=sensor\tprotocol=fineoffset\tmodel=temperaturehumidity\tid=135\ttemperature=21.5\thumidity=42\ttime=2024-01-05 12:00:00",
        )
        .expect("parse line");
        assert_eq!(reading.id, "135");
        assert_eq!(reading.time, "2024-01-05 12:00:00");
        assert_eq!(reading.field("temperature"), Some("21.5"));
        assert_eq!(reading.field("humidity"), Some("42"));
        assert_eq!(reading.field("protocol"), Some("fineoffset"));
        assert_eq!(reading.values.len(), 5);
    }

    #[test]
    fn field_order_does_not_matter() {
        let a = parse_sensor_line("id=1\ttime=100\ttemperature=21.5").expect("a");
        let b = parse_sensor_line("temperature=21.5\ttime=100\tid=1").expect("b");
        assert_eq!(a, b);
    }

    #[test]
    fn splits_only_on_first_equals() {
        let reading = parse_sensor_line("id=1\ttime=100\tnote=a=b").expect("parse line");
        assert_eq!(reading.field("note"), Some("a=b"));
    }

    #[test]
    fn rejects_token_without_equals() {
        let err = parse_sensor_line("id=1\ttime=100\tgarbage").expect_err("malformed");
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn rejects_missing_time() {
        let err = parse_sensor_line("id=1\ttemperature=20").expect_err("no time");
        assert!(err.to_string().contains("time"));
    }

    #[test]
    fn listing_splits_real_newlines_and_skips_blanks() {
        let readings = parse_sensor_listing("id=1\ttime=100\ttemperature=21.5\r\n\nid=2\ttime=101\thumidity=55\n")
            .expect("parse listing");
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1].id, "2");
        assert_eq!(readings[1].field("humidity"), Some("55"));
    }

    #[test]
    fn listing_reports_offending_line() {
        let err = parse_sensor_listing("id=1\ttime=100\nbroken line\n").expect_err("malformed");
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn command_line_parsing() {
        assert_eq!(SensorCommand::default().to_string(), "tdtool --list-sensors");
        let custom = SensorCommand::parse("  bash ./mock.sh  ").expect("command");
        assert_eq!(custom.program, "bash");
        assert_eq!(custom.args, vec!["./mock.sh"]);
        assert!(SensorCommand::parse("   ").is_none());
    }
}
