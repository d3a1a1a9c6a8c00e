use std::collections::BTreeMap;

/// One line of sensor listing output. `id` and `time` are always present;
/// everything else the tool reported lives in `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorReading {
    pub id: String,
    pub time: String,
    pub values: BTreeMap<String, String>,
}

impl SensorReading {
    pub fn new(id: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            time: time.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "id" => Some(self.id.as_str()),
            "time" => Some(self.time.as_str()),
            other => self.values.get(other).map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorksheetHandle {
    pub sheet_id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    Logged,
    Duplicate,
}

impl LogOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Logged => "logged",
            Self::Duplicate => "duplicate",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub sensors: usize,
    pub logged: usize,
    pub duplicates: usize,
}

impl TickSummary {
    pub fn record(&mut self, outcome: LogOutcome) {
        match outcome {
            LogOutcome::Logged => self.logged += 1,
            LogOutcome::Duplicate => self.duplicates += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LogOutcome, SensorReading, TickSummary};

    #[test]
    fn field_covers_required_and_open_values() {
        let reading = SensorReading::new("135", "1700000000").with_value("temperature", "21.5");
        assert_eq!(reading.field("id"), Some("135"));
        assert_eq!(reading.field("time"), Some("1700000000"));
        assert_eq!(reading.field("temperature"), Some("21.5"));
        assert_eq!(reading.field("humidity"), None);
    }

    #[test]
    fn summary_counts_each_outcome() {
        let mut summary = TickSummary::default();
        summary.record(LogOutcome::Logged);
        summary.record(LogOutcome::Duplicate);
        summary.record(LogOutcome::Duplicate);
        assert_eq!((summary.logged, summary.duplicates), (1, 2));
        assert_eq!(LogOutcome::Duplicate.as_str(), "duplicate");
    }
}
