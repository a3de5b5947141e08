// Render module - Turns accepted records into display lines

mod value;

use crate::error::{Result, SnazyError};
use crate::filter::compile;
use crate::record::{Level, LogRecord};
use chrono::format::{Item, StrftimeItems};
use colored::{Color, ColoredString, Colorize};
use regex::Regex;
use std::fmt::Write;

pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";
pub const DEFAULT_PREFIX_FORMAT: &str = "{namespace}/{pod}[{container}]";

/// Colors handed out to highlight patterns, in order
const HIGHLIGHT_COLORS: [Color; 5] = [
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::Red,
    Color::Blue,
];

/// Width the level label is padded to
const LEVEL_WIDTH: usize = 5;

/// A pattern painted wherever it matches in a message
#[derive(Debug, Clone)]
pub struct Highlight {
    pub pattern: Regex,
    pub color: Color,
}

/// Formatting options, fixed for the whole run
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Emit ANSI colors
    pub colorize: bool,
    /// Fields to show, in this order; empty shows all in natural order
    pub fields: Vec<String>,
    /// strftime format for timestamps
    pub time_format: String,
    /// Flatten nested values onto the line instead of pretty-printing them
    pub compact: bool,
    pub highlights: Vec<Highlight>,
    /// Show an emoji instead of the level name
    pub level_symbols: bool,
    pub show_prefix: bool,
    pub prefix_format: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            colorize: false,
            fields: Vec::new(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            compact: true,
            highlights: Vec::new(),
            level_symbols: false,
            show_prefix: true,
            prefix_format: DEFAULT_PREFIX_FORMAT.to_string(),
        }
    }
}

impl RenderConfig {
    /// Compile highlight patterns, assigning colors round-robin
    pub fn highlights_from(patterns: &[String]) -> Result<Vec<Highlight>> {
        patterns
            .iter()
            .filter(|p| !p.is_empty())
            .enumerate()
            .map(|(i, p)| {
                Ok(Highlight {
                    pattern: compile(p)?,
                    color: HIGHLIGHT_COLORS[i % HIGHLIGHT_COLORS.len()],
                })
            })
            .collect()
    }

    /// Reject strftime formats chrono cannot render
    pub fn validate_time_format(format: &str) -> Result<()> {
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(SnazyError::InvalidArgument(format!(
                "invalid time format '{}'",
                format
            )));
        }
        Ok(())
    }
}

/// Fixed severity palette
fn paint_level(level: Level, text: &str) -> ColoredString {
    match level {
        Level::Trace => text.bright_black(),
        Level::Debug => text.cyan(),
        Level::Info => text.green(),
        Level::Warn => text.yellow(),
        Level::Error => text.red(),
        Level::Fatal => text.magenta().bold(),
        Level::Unknown => text.white(),
    }
}

fn level_symbol(level: Level) -> &'static str {
    match level {
        Level::Trace => "🔬",
        Level::Debug => "🐛",
        Level::Info => "💡",
        Level::Warn => "⚠️",
        Level::Error => "🚨",
        Level::Fatal => "💀",
        Level::Unknown => "❓",
    }
}

/// Renders records according to a [`RenderConfig`]
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render a record. Never fails: a formatting problem yields the raw line.
    pub fn render(&self, record: &LogRecord) -> String {
        match self.try_render(record) {
            Ok(line) => line,
            Err(_) => {
                tracing::debug!("Falling back to raw output for unrenderable record");
                record.raw().to_string()
            }
        }
    }

    fn try_render(&self, record: &LogRecord) -> std::result::Result<String, std::fmt::Error> {
        if !record.is_structured() {
            return Ok(self.highlight(record.raw()));
        }

        let mut parts: Vec<String> = Vec::new();

        if let Some(ts) = record.timestamp() {
            let mut text = String::new();
            write!(text, "{}", ts.format(&self.config.time_format))?;
            parts.push(self.paint(&text, |s| s.dimmed()));
        }

        parts.push(self.level_label(record.level()));

        if self.config.show_prefix {
            if let Some(prefix) = record.prefix() {
                let text = prefix.format(&self.config.prefix_format);
                parts.push(self.paint(&text, |s| s.blue()));
            }
        }

        if !record.message().is_empty() {
            if self.config.compact {
                parts.push(self.highlight(&value::escape_controls(record.message())));
            } else {
                parts.push(self.highlight(record.message()));
            }
        }

        let mut pairs = Vec::new();
        if self.config.fields.is_empty() {
            for (key, val) in record.fields() {
                value::push_pairs(key, val, self.config.compact, &mut pairs)?;
            }
        } else {
            for key in &self.config.fields {
                if let Some(val) = record.field_value(key) {
                    value::push_pairs(key, val, self.config.compact, &mut pairs)?;
                }
            }
        }
        for (key, val) in pairs {
            parts.push(format!("{}={}", self.paint(&key, |s| s.cyan()), val));
        }

        Ok(parts.join(" "))
    }

    fn level_label(&self, level: Level) -> String {
        if self.config.level_symbols {
            return level_symbol(level).to_string();
        }
        let padded = format!("{:<width$}", level.label(), width = LEVEL_WIDTH);
        if self.config.colorize {
            paint_level(level, &padded).to_string()
        } else {
            padded
        }
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.config.colorize {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Paint every highlight match. Earlier patterns win where matches overlap.
    fn highlight(&self, text: &str) -> String {
        if !self.config.colorize || self.config.highlights.is_empty() {
            return text.to_string();
        }

        let mut spans: Vec<(usize, usize, Color)> = Vec::new();
        for highlight in &self.config.highlights {
            for m in highlight.pattern.find_iter(text) {
                if m.start() == m.end() {
                    continue;
                }
                let overlaps = spans
                    .iter()
                    .any(|(start, end, _)| m.start() < *end && *start < m.end());
                if !overlaps {
                    spans.push((m.start(), m.end(), highlight.color));
                }
            }
        }
        spans.sort_by_key(|(start, _, _)| *start);

        let mut out = String::with_capacity(text.len() + spans.len() * 9);
        let mut cursor = 0;
        for (start, end, color) in spans {
            out.push_str(&text[cursor..start]);
            out.push_str(&text[start..end].color(color).to_string());
            cursor = end;
        }
        out.push_str(&text[cursor..]);
        out
    }
}
