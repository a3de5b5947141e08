use crate::error::{Result, SnazyError};
use crate::filter::{FilterSpec, Predicate};
use crate::input::{InputSource, ReadOptions};
use crate::parse::KeyOverrides;
use crate::pipeline::MatchAction;
use crate::record::Level;
use crate::render::RenderConfig;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::Path;

/// When to emit ANSI colors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorWhen {
    /// show colors if the output goes to an interactive console
    #[default]
    Auto,
    /// always use colorized output
    Always,
    /// do not use colorized output
    Never,
}

impl ColorWhen {
    /// Resolve against the environment: `auto` needs a terminal and no `NO_COLOR`
    pub fn resolve(self) -> bool {
        match self {
            ColorWhen::Always => true,
            ColorWhen::Never => false,
            ColorWhen::Auto => {
                std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
            }
        }
    }
}

/// Defaults loaded from a configuration file. Every setting is optional;
/// command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub color: Option<ColorWhen>,
    pub time_format: Option<String>,
    pub level_symbols: Option<bool>,
    pub compact: Option<bool>,
    pub fields: Option<Vec<String>>,
    pub min_level: Option<Level>,
    pub filter_levels: Vec<Level>,
    /// `FIELD=REGEX` filters
    #[serde(rename = "match")]
    pub matches: Vec<String>,
    /// `FIELD=VALUE` filters
    pub field_equals: Vec<String>,
    /// Highlight patterns, applied before those given on the command line
    pub regexp: Vec<String>,
    pub skip_line_regexp: Vec<String>,
    pub kail_prefix_format: Option<String>,
    pub kail_no_prefix: Option<bool>,
    /// Attribute (`level`, `msg`, `ts`) to source key
    pub json_keys: BTreeMap<String, String>,
    pub action_regexp: Option<String>,
    pub action_command: Option<String>,
}

impl FileConfig {
    /// Load a configuration file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<FileConfig> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SnazyError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let config = match extension {
            "toml" => Self::parse_toml(&contents)?,
            "json" => Self::parse_json(&contents)?,
            _ => {
                return Err(SnazyError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    fn parse_toml(contents: &str) -> Result<FileConfig> {
        toml::from_str(contents)
            .map_err(|e| SnazyError::InvalidConfig(format!("Failed to parse TOML: {}", e)))
    }

    fn parse_json(contents: &str) -> Result<FileConfig> {
        serde_json::from_str(contents)
            .map_err(|e| SnazyError::InvalidConfig(format!("Failed to parse JSON: {}", e)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref format) = self.time_format {
            RenderConfig::validate_time_format(format)?;
        }

        for spec in &self.matches {
            Predicate::regex_match(spec)?;
        }
        for spec in &self.field_equals {
            Predicate::field_equals(spec)?;
        }

        for attr in self.json_keys.keys() {
            parse_key_attribute(attr)?;
        }

        if self.action_regexp.is_some() != self.action_command.is_some() {
            return Err(SnazyError::ConfigValidationError(
                "action_regexp and action_command must be set together".to_string(),
            ));
        }

        Ok(())
    }
}

/// Which promoted attribute a `--json-keys` entry overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAttribute {
    Level,
    Message,
    Timestamp,
}

pub fn parse_key_attribute(attr: &str) -> Result<KeyAttribute> {
    match attr {
        "level" => Ok(KeyAttribute::Level),
        "msg" | "message" => Ok(KeyAttribute::Message),
        "ts" | "time" | "timestamp" => Ok(KeyAttribute::Timestamp),
        other => Err(SnazyError::InvalidArgument(format!(
            "unknown json key attribute '{}', expected level, msg or ts",
            other
        ))),
    }
}

/// Fold `(attribute, source key)` pairs into key overrides; later pairs win
pub fn key_overrides<'a, I>(pairs: I) -> Result<KeyOverrides>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut keys = KeyOverrides::default();
    for (attr, key) in pairs {
        if key.is_empty() {
            return Err(SnazyError::InvalidArgument(format!(
                "json key for '{}' cannot be empty",
                attr
            )));
        }
        let slot = match parse_key_attribute(attr)? {
            KeyAttribute::Level => &mut keys.level,
            KeyAttribute::Message => &mut keys.message,
            KeyAttribute::Timestamp => &mut keys.timestamp,
        };
        *slot = Some(key.to_string());
    }
    Ok(keys)
}

/// Fully resolved settings for one run. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    pub sources: Vec<InputSource>,
    pub read: ReadOptions,
    pub keys: KeyOverrides,
    pub filter: FilterSpec,
    pub render: RenderConfig,
    pub action: Option<MatchAction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_color_when_explicit() {
        assert!(ColorWhen::Always.resolve());
        assert!(!ColorWhen::Never.resolve());
    }

    #[test]
    fn test_load_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("snazy.toml");
        fs::write(
            &path,
            r#"
                color = "never"
                time_format = "%H:%M"
                min_level = "warn"
                regexp = ["timeout"]

                [json_keys]
                msg = "text"
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        assert_eq!(config.color, Some(ColorWhen::Never));
        assert_eq!(config.time_format.as_deref(), Some("%H:%M"));
        assert_eq!(config.min_level, Some(Level::Warn));
        assert_eq!(config.regexp, vec!["timeout"]);
        assert_eq!(config.json_keys.get("msg").map(|s| s.as_str()), Some("text"));
    }

    #[test]
    fn test_load_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("snazy.json");
        fs::write(&path, r#"{"level_symbols": true, "fields": ["port"]}"#).unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        assert_eq!(config.level_symbols, Some(true));
        assert_eq!(config.fields, Some(vec!["port".to_string()]));
    }

    #[test]
    fn test_load_filter_settings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("snazy.toml");
        fs::write(
            &path,
            r#"
                filter_levels = ["info", "error"]
                match = ["msg=timeout"]
                field_equals = ["svc=api"]
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        assert_eq!(config.filter_levels, vec![Level::Info, Level::Error]);
        assert_eq!(config.matches, vec!["msg=timeout"]);
        assert_eq!(config.field_equals, vec!["svc=api"]);
    }

    #[test]
    fn test_validate_rejects_bad_filters() {
        let config = FileConfig {
            matches: vec!["msg=(open".into()],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SnazyError::InvalidRegex { .. })
        ));

        let config = FileConfig {
            field_equals: vec!["no-separator".into()],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SnazyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("snazy.yaml");
        fs::write(&path, "color: never").unwrap();
        assert!(matches!(
            FileConfig::from_file(&path),
            Err(SnazyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            FileConfig::from_file(&temp_dir.path().join("none.toml")),
            Err(SnazyError::ConfigError(_))
        ));
    }

    #[test]
    fn test_unknown_setting_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("snazy.toml");
        fs::write(&path, "colour = \"never\"").unwrap();
        assert!(matches!(
            FileConfig::from_file(&path),
            Err(SnazyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_half_action() {
        let config = FileConfig {
            action_regexp: Some("x".into()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SnazyError::ConfigValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_key_attribute() {
        let mut config = FileConfig::default();
        config.json_keys.insert("caller".into(), "c".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_key_overrides() {
        let keys = key_overrides([("level", "lvl"), ("message", "text"), ("ts", "when")]).unwrap();
        assert_eq!(keys.level.as_deref(), Some("lvl"));
        assert_eq!(keys.message.as_deref(), Some("text"));
        assert_eq!(keys.timestamp.as_deref(), Some("when"));

        assert!(key_overrides([("caller", "c")]).is_err());
        assert!(key_overrides([("msg", "")]).is_err());
    }
}
