// CLI module - User-facing command-line interface

pub mod completion;
pub mod output;

use crate::config::{key_overrides, ColorWhen, Config, FileConfig};
use crate::error::{Result, SnazyError};
use crate::filter::{FilterSpec, Predicate};
use crate::input::{InputSource, LineStream, ReadOptions};
use crate::parse::{timestamp, Parser as LineParser};
use crate::pipeline::{MatchAction, Pipeline};
use crate::record::Level;
use crate::render::{RenderConfig, Renderer, DEFAULT_PREFIX_FORMAT, DEFAULT_TIME_FORMAT};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// snazy - a snazzy json log viewer
#[derive(Parser, Debug)]
#[command(name = "snazy", bin_name = "snazy")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "You just need to pipe to snazy some logs formatted as json to humm (sorry) snazzy them 💄\neg: `kubectl logs -f controller-pod|snazy`"
)]
pub struct Cli {
    /// Files to read, in order; standard input when none (or `-`) is given
    #[arg(value_name = "FILE")]
    files: Vec<String>,

    /// Only show records at or above this level; lines without a known level are dropped
    #[arg(short = 'l', long, value_name = "LEVEL")]
    min_level: Option<Level>,

    /// Only show these levels, separated by commas, eg: info,debug
    #[arg(short = 'f', long, value_delimiter = ',', value_name = "LEVELS")]
    filter_levels: Vec<Level>,

    /// Only show records whose FIELD matches REGEX (msg, level and raw also work)
    #[arg(short = 'm', long = "match", value_name = "FIELD=REGEX")]
    matches: Vec<String>,

    /// Only show records whose FIELD equals VALUE
    #[arg(short = 'e', long, value_name = "FIELD=VALUE")]
    field_equals: Vec<String>,

    /// Only show records at or after this time
    #[arg(long, value_name = "TIME")]
    since: Option<String>,

    /// Only show records at or before this time
    #[arg(long, value_name = "TIME")]
    until: Option<String>,

    /// When to use colors: never, *auto*, always
    #[arg(short = 'c', long, value_enum, value_name = "WHEN", hide_possible_values = true)]
    color: Option<ColorWhen>,

    /// Pretty-print nested values on indented lines instead of flattening them
    #[arg(short = 'p', long)]
    pretty: bool,

    /// Fields to show, separated by commas, in display order
    #[arg(short = 'k', long, value_delimiter = ',', value_name = "FIELDS")]
    fields: Vec<String>,

    /// Time format
    #[arg(short = 't', long, env = "SNAZY_TIME_FORMAT", value_name = "FORMAT")]
    time_format: Option<String>,

    /// Highlight word in a message with a regexp
    #[arg(short = 'r', long, value_name = "REGEXP")]
    regexp: Vec<String>,

    /// Replace log level with pretty symbols
    #[arg(short = 'S', long)]
    level_symbols: bool,

    /// Skip lines matching this regexp
    #[arg(long, value_name = "REGEXP")]
    skip_line_regexp: Vec<String>,

    /// Format of the kail prefix
    #[arg(long, env = "SNAZY_KAIL_PREFIX_FORMAT", value_name = "FORMAT")]
    kail_prefix_format: Option<String>,

    /// Hide container prefix when showing kail
    #[arg(long)]
    kail_no_prefix: bool,

    /// Source key for an attribute, eg: msg=message, level=severity, ts=time
    #[arg(short = 'j', long, value_name = "ATTR=KEY")]
    json_keys: Vec<String>,

    /// Run the action command when a message matches this regexp
    #[arg(long, value_name = "REGEXP", requires = "action_command")]
    action_regexp: Option<String>,

    /// Command run through `sh -c`, the matching message is passed as $1
    #[arg(long, value_name = "COMMAND", requires = "action_regexp")]
    action_command: Option<String>,

    /// Keep reading the last file as it grows
    #[arg(short = 'F', long)]
    follow: bool,

    /// Configuration file (.toml or .json)
    #[arg(long, env = "SNAZY_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the completion script for bash, zsh or fish and exit
    #[arg(long, value_name = "SHELL")]
    shell_completion: Option<String>,
}

impl Cli {
    /// Run the CLI application
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        cli.execute().await
    }

    /// Execute the parsed arguments
    pub async fn execute(&self) -> Result<()> {
        if let Some(shell) = &self.shell_completion {
            let script = completion::emit_completion(shell)?;
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(script.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(SnazyError::OutputError)?;
            return Ok(());
        }

        let config = self.build_config()?;
        colored::control::set_override(config.render.colorize);

        let pipeline = Pipeline::new(
            LineParser::new(config.keys.clone()),
            config.filter.clone(),
            Renderer::new(config.render.clone()),
            config.action.clone(),
        );
        let mut stream = LineStream::open(&config.sources, config.read.clone()).await?;

        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());

        let outcome = tokio::select! {
            result = pipeline.run(&mut stream, &mut out) => Some(result),
            Ok(()) = tokio::signal::ctrl_c() => None,
        };

        match outcome {
            Some(result) => result.map(|_| ()),
            None => {
                tracing::debug!("Interrupted, stopping");
                let _ = out.flush();
                Ok(())
            }
        }
    }

    /// Resolve flags, environment and the optional configuration file into a [`Config`]
    pub fn build_config(&self) -> Result<Config> {
        let file = match &self.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };

        let sources = if self.files.is_empty() {
            vec![InputSource::Stdin]
        } else {
            self.files.iter().map(|f| InputSource::from_arg(f)).collect()
        };

        let time_format = self
            .time_format
            .clone()
            .or_else(|| file.time_format.clone())
            .unwrap_or_else(|| DEFAULT_TIME_FORMAT.to_string());
        RenderConfig::validate_time_format(&time_format)?;

        let mut highlight_patterns = file.regexp.clone();
        highlight_patterns.extend(self.regexp.iter().cloned());

        let render = RenderConfig {
            colorize: self.color.or(file.color).unwrap_or_default().resolve(),
            fields: if self.fields.is_empty() {
                file.fields.clone().unwrap_or_default()
            } else {
                self.fields.clone()
            },
            time_format,
            compact: !self.pretty && file.compact.unwrap_or(true),
            highlights: RenderConfig::highlights_from(&highlight_patterns)?,
            level_symbols: self.level_symbols
                || std::env::var_os("SNAZY_LEVEL_SYMBOLS").is_some()
                || file.level_symbols.unwrap_or(false),
            show_prefix: !(self.kail_no_prefix || file.kail_no_prefix.unwrap_or(false)),
            prefix_format: self
                .kail_prefix_format
                .clone()
                .or_else(|| file.kail_prefix_format.clone())
                .unwrap_or_else(|| DEFAULT_PREFIX_FORMAT.to_string()),
        };

        let mut key_pairs: Vec<(&str, &str)> = file
            .json_keys
            .iter()
            .map(|(attr, key)| (attr.as_str(), key.as_str()))
            .collect();
        for spec in &self.json_keys {
            let pair = spec.split_once('=').ok_or_else(|| {
                SnazyError::InvalidArgument(format!("json key '{}': expected ATTR=KEY", spec))
            })?;
            key_pairs.push(pair);
        }
        let keys = key_overrides(key_pairs)?;

        let action = match (
            self.action_regexp.as_ref().or(file.action_regexp.as_ref()),
            self.action_command.as_ref().or(file.action_command.as_ref()),
        ) {
            (Some(pattern), Some(command)) => Some(MatchAction::new(pattern, command.clone())?),
            (None, None) => None,
            _ => {
                return Err(SnazyError::InvalidArgument(
                    "--action-regexp and --action-command must be used together".to_string(),
                ))
            }
        };

        Ok(Config {
            sources,
            read: ReadOptions {
                follow: self.follow,
                ..Default::default()
            },
            keys,
            filter: self.build_filter(&file)?,
            render,
            action,
        })
    }

    fn build_filter(&self, file: &FileConfig) -> Result<FilterSpec> {
        let mut predicates = Vec::new();

        if let Some(min) = self.min_level.or(file.min_level) {
            predicates.push(Predicate::LevelAtLeast(min));
        }
        let levels = if self.filter_levels.is_empty() {
            &file.filter_levels
        } else {
            &self.filter_levels
        };
        if !levels.is_empty() {
            predicates.push(Predicate::LevelIn(levels.clone()));
        }
        for spec in file.matches.iter().chain(&self.matches) {
            predicates.push(Predicate::regex_match(spec)?);
        }
        for spec in file.field_equals.iter().chain(&self.field_equals) {
            predicates.push(Predicate::field_equals(spec)?);
        }
        if let Some(since) = &self.since {
            predicates.push(Predicate::TimeAfter(parse_time(since)?));
        }
        if let Some(until) = &self.until {
            predicates.push(Predicate::TimeBefore(parse_time(until)?));
        }
        for pattern in file.skip_line_regexp.iter().chain(&self.skip_line_regexp) {
            predicates.push(Predicate::skip_raw(pattern)?);
        }

        Ok(FilterSpec::new(predicates))
    }
}

fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    timestamp::parse_str(s).ok_or_else(|| SnazyError::InvalidTime(s.to_string()))
}
