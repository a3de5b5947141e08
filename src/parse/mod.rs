// Parse module - Turns raw lines into normalized log records

pub mod timestamp;

use crate::record::{Fields, KailPrefix, Level, LogRecord};
use regex::Regex;
use serde_json::Value;

/// Keys recognized as the level, first one present wins
pub const LEVEL_KEYS: [&str; 4] = ["level", "severity", "lvl", "loglevel"];
/// Keys recognized as the message
pub const MESSAGE_KEYS: [&str; 2] = ["msg", "message"];
/// Keys recognized as the timestamp
pub const TIMESTAMP_KEYS: [&str; 4] = ["ts", "time", "timestamp", "@timestamp"];

const KAIL_PREFIX_PATTERN: &str =
    r"^(?P<namespace>[^/\s]+)/(?P<pod>[^\[\s]+)\[(?P<container>[^\]]+)\]: (?P<line>.*)$";

/// User-supplied source keys for the promoted attributes.
///
/// When a key is set and present in a line it takes precedence over the
/// built-in aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyOverrides {
    pub level: Option<String>,
    pub message: Option<String>,
    pub timestamp: Option<String>,
}

impl KeyOverrides {
    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.message.is_none() && self.timestamp.is_none()
    }
}

/// Line parser holding the compiled prefix matcher and key overrides
#[derive(Debug, Clone)]
pub struct Parser {
    keys: KeyOverrides,
    kail_re: Regex,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(KeyOverrides::default())
    }
}

impl Parser {
    pub fn new(keys: KeyOverrides) -> Self {
        Self {
            keys,
            // The pattern is a constant; failing here is a programming error.
            kail_re: Regex::new(KAIL_PREFIX_PATTERN).expect("valid kail prefix pattern"),
        }
    }

    /// Parse one line. Every input yields exactly one record; lines that are
    /// not a JSON object come back as an unparsed record.
    pub fn parse(&self, line: &str) -> LogRecord {
        let (prefix, body) = match self.kail_re.captures(line) {
            Some(caps) => (
                Some(KailPrefix {
                    namespace: caps["namespace"].to_string(),
                    pod: caps["pod"].to_string(),
                    container: caps["container"].to_string(),
                }),
                caps.name("line").map_or("", |m| m.as_str()),
            ),
            None => (None, line),
        };

        if !body.trim_start().starts_with('{') {
            return LogRecord::unparsed(line);
        }

        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => self.normalize(line, map, prefix),
            _ => LogRecord::unparsed(line),
        }
    }

    fn normalize(&self, line: &str, map: Fields, prefix: Option<KailPrefix>) -> LogRecord {
        let level_key = resolve_key(&map, self.keys.level.as_deref(), &LEVEL_KEYS);
        let message_key = resolve_key(&map, self.keys.message.as_deref(), &MESSAGE_KEYS);
        let ts_key = resolve_key(&map, self.keys.timestamp.as_deref(), &TIMESTAMP_KEYS);

        let level = level_key
            .and_then(|k| map.get(k))
            .map(level_from_value)
            .unwrap_or(Level::Unknown);

        let message = message_key
            .and_then(|k| map.get(k))
            .map(|v| match v {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            })
            .unwrap_or_default();

        let timestamp = ts_key
            .and_then(|k| map.get(k))
            .and_then(timestamp::parse_value);

        let mut fields = Fields::new();
        for (key, value) in &map {
            let key = key.as_str();
            if Some(key) == level_key {
                // Keep what we could not classify so it still shows up
                if level == Level::Unknown {
                    fields.insert("level".to_string(), value.clone());
                }
                continue;
            }
            if Some(key) == message_key {
                continue;
            }
            if Some(key) == ts_key && timestamp.is_some() {
                continue;
            }
            fields.insert(key.to_string(), value.clone());
        }

        LogRecord::structured(line, level, message, timestamp, fields, prefix)
    }
}

/// Pick the source key for an attribute: the override if present, else the first alias present
fn resolve_key<'a>(
    map: &Fields,
    preferred: Option<&'a str>,
    aliases: &[&'a str],
) -> Option<&'a str> {
    if let Some(key) = preferred {
        if map.contains_key(key) {
            return Some(key);
        }
    }
    aliases.iter().copied().find(|k| map.contains_key(*k))
}

fn level_from_value(value: &Value) -> Level {
    match value {
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => Level::from_number(n),
            Err(_) => Level::normalize(s),
        },
        Value::Number(n) => n.as_f64().map(Level::from_number).unwrap_or(Level::Unknown),
        _ => Level::Unknown,
    }
}
