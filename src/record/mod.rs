// Record module - The normalized shape every input line is turned into

mod level;

pub use level::Level;

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::borrow::Cow;

/// Ordered map of the non-promoted keys of a structured line
pub type Fields = serde_json::Map<String, Value>;

/// Container prefix added by kail / multi-pod log streamers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KailPrefix {
    pub namespace: String,
    pub pod: String,
    pub container: String,
}

impl KailPrefix {
    /// Expand `{namespace}`, `{pod}` and `{container}` in a format string
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{namespace}", &self.namespace)
            .replace("{pod}", &self.pod)
            .replace("{container}", &self.container)
    }
}

/// A parsed log line. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    timestamp: Option<DateTime<Utc>>,
    level: Level,
    message: String,
    fields: Fields,
    raw: String,
    prefix: Option<KailPrefix>,
    structured: bool,
}

impl LogRecord {
    /// Record for a line that decoded as a JSON object
    pub fn structured(
        raw: impl Into<String>,
        level: Level,
        message: impl Into<String>,
        timestamp: Option<DateTime<Utc>>,
        fields: Fields,
        prefix: Option<KailPrefix>,
    ) -> Self {
        Self {
            timestamp,
            level,
            message: message.into(),
            fields,
            raw: raw.into(),
            prefix,
            structured: true,
        }
    }

    /// Record for a line that is not structured data
    pub fn unparsed(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            timestamp: None,
            level: Level::Unknown,
            message: raw.clone(),
            fields: Fields::new(),
            raw,
            prefix: None,
            structured: false,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn prefix(&self) -> Option<&KailPrefix> {
        self.prefix.as_ref()
    }

    pub fn is_structured(&self) -> bool {
        self.structured
    }

    /// Resolve a field name to its textual value.
    ///
    /// Keys in `fields` win (a dotted name descends into nested objects), then
    /// the pseudo-fields `message`/`msg`, `level` and `raw`.
    pub fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        if let Some(value) = self.field_value(name) {
            return Some(value_text(value));
        }

        match name {
            "message" | "msg" => Some(Cow::Borrowed(self.message.as_str())),
            "level" => Some(Cow::Borrowed(self.level.as_str())),
            "raw" => Some(Cow::Borrowed(self.raw.as_str())),
            _ => None,
        }
    }

    /// Find a value in `fields`, trying the literal key before a dotted path
    pub fn field_value(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.fields.get(name) {
            return Some(value);
        }

        let mut parts = name.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Strings by content, everything else by its JSON text
pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}
