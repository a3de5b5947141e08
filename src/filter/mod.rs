// Filter module - Per-record emit/drop decisions

use crate::error::{Result, SnazyError};
use crate::record::{Level, LogRecord};
use chrono::{DateTime, Utc};
use regex::Regex;

/// A single condition a record must satisfy
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Ranked level at or above the minimum; unknown levels never pass
    LevelAtLeast(Level),
    /// Level is one of the listed ones
    LevelIn(Vec<Level>),
    /// Field text matches the pattern
    RegexMatch { field: String, pattern: Regex },
    /// Field text equals the value exactly
    FieldEquals { field: String, value: String },
    /// Timestamp at or after the instant
    TimeAfter(DateTime<Utc>),
    /// Timestamp at or before the instant
    TimeBefore(DateTime<Utc>),
    /// Raw line does not match the pattern
    SkipRaw(Regex),
}

impl Predicate {
    /// Build a `RegexMatch` from `FIELD=REGEX`
    pub fn regex_match(spec: &str) -> Result<Self> {
        let (field, pattern) = split_assignment(spec)?;
        Ok(Predicate::RegexMatch {
            field: field.to_string(),
            pattern: compile(pattern)?,
        })
    }

    /// Build a `FieldEquals` from `FIELD=VALUE`
    pub fn field_equals(spec: &str) -> Result<Self> {
        let (field, value) = split_assignment(spec)?;
        Ok(Predicate::FieldEquals {
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    pub fn skip_raw(pattern: &str) -> Result<Self> {
        Ok(Predicate::SkipRaw(compile(pattern)?))
    }

    pub fn holds(&self, record: &LogRecord) -> bool {
        match self {
            Predicate::LevelAtLeast(min) => record.level().at_least(*min),
            Predicate::LevelIn(levels) => levels.contains(&record.level()),
            Predicate::RegexMatch { field, pattern } => record
                .lookup(field)
                .map(|text| pattern.is_match(&text))
                .unwrap_or(false),
            Predicate::FieldEquals { field, value } => record
                .lookup(field)
                .map(|text| text == value.as_str())
                .unwrap_or(false),
            Predicate::TimeAfter(t) => record.timestamp().is_some_and(|ts| ts >= *t),
            Predicate::TimeBefore(t) => record.timestamp().is_some_and(|ts| ts <= *t),
            Predicate::SkipRaw(pattern) => !pattern.is_match(record.raw()),
        }
    }
}

/// Conjunction of predicates; empty accepts everything
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    predicates: Vec<Predicate>,
}

impl FilterSpec {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn accepts(&self, record: &LogRecord) -> bool {
        self.predicates.iter().all(|p| p.holds(record))
    }
}

/// Compile a user pattern, mapping failures to a setup error
pub fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| SnazyError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

fn split_assignment(spec: &str) -> Result<(&str, &str)> {
    match spec.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok((field, value)),
        _ => Err(SnazyError::InvalidArgument(format!(
            "'{}': expected FIELD=VALUE",
            spec
        ))),
    }
}
