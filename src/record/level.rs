use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Normalized log severity.
///
/// `Unknown` sits outside the ordering: it has no rank, so it never satisfies
/// a minimum-level threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Unknown,
}

impl Level {
    /// All ranked levels, least severe first
    pub const RANKED: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
            Level::Unknown => "unknown",
        }
    }

    /// Upper-case display label
    pub fn label(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
            Level::Unknown => "UNKNOWN",
        }
    }

    /// Position in the severity order, `None` for `Unknown`
    pub fn rank(&self) -> Option<u8> {
        match self {
            Level::Trace => Some(0),
            Level::Debug => Some(1),
            Level::Info => Some(2),
            Level::Warn => Some(3),
            Level::Error => Some(4),
            Level::Fatal => Some(5),
            Level::Unknown => None,
        }
    }

    /// True when both levels are ranked and `self` is at least as severe as `min`
    pub fn at_least(&self, min: Level) -> bool {
        match (self.rank(), min.rank()) {
            (Some(a), Some(b)) => a >= b,
            _ => false,
        }
    }

    /// Normalize a level name from a log line, case-insensitively.
    pub fn normalize(s: &str) -> Level {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" | "trc" => Level::Trace,
            "debug" | "dbg" => Level::Debug,
            "info" | "information" | "informational" | "notice" => Level::Info,
            "warn" | "warning" => Level::Warn,
            "error" | "err" => Level::Error,
            "fatal" | "critical" | "crit" | "panic" | "dpanic" | "emerg" | "emergency"
            | "alert" => Level::Fatal,
            _ => Level::Unknown,
        }
    }

    /// Map a numeric level on the pino/bunyan scale.
    pub fn from_number(n: f64) -> Level {
        match n as i64 {
            10 => Level::Trace,
            20 => Level::Debug,
            30 => Level::Info,
            40 => Level::Warn,
            50 => Level::Error,
            60 => Level::Fatal,
            _ => Level::Unknown,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parsing for user input (CLI flags), unlike [`Level::normalize`]
impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match Level::normalize(s) {
            Level::Unknown => Err(format!(
                "unknown level '{}', expected one of: trace, debug, info, warn, error, fatal",
                s
            )),
            level => Ok(level),
        }
    }
}
