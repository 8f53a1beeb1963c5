use chrono::{DateTime, Utc};

/// One event as returned by an event source. Never built by the classifier or renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    pub time: DateTime<Utc>,
    pub event_id: u32,
    pub provider: String,
    pub level: u8,
    pub message: String,
    pub raw_xml: Option<String>,
}

impl LogRecord {
    pub fn level_name(&self) -> &'static str { level_name(self.level) }

    /// Message flattened to a single line for the report.
    pub fn message_line(&self) -> String {
        self.message.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

pub fn level_name(l: u8) -> &'static str { match l { 1 => "Critical", 2 => "Error", 3 => "Warning", 0 | 4 => "Information", 5 => "Verbose", _ => "Other" } }
