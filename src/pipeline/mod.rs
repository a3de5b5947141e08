// Pipeline module - Reader -> parser -> filter -> renderer -> output

mod action;

pub use action::MatchAction;

use crate::error::{Result, SnazyError};
use crate::filter::FilterSpec;
use crate::input::LineStream;
use crate::parse::Parser;
use crate::render::Renderer;
use std::io::Write;

/// Counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub lines: u64,
    pub emitted: u64,
    pub unparsed: u64,
}

/// The per-line processing stages, built once at startup
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    parser: Parser,
    filter: FilterSpec,
    renderer: Renderer,
    action: Option<MatchAction>,
}

impl Pipeline {
    pub fn new(
        parser: Parser,
        filter: FilterSpec,
        renderer: Renderer,
        action: Option<MatchAction>,
    ) -> Self {
        Self {
            parser,
            filter,
            renderer,
            action,
        }
    }

    /// Parse, filter and render one line. `None` means the line was filtered out.
    pub fn process_line(&self, line: &str) -> Option<String> {
        self.process(line, &mut Stats::default())
    }

    fn process(&self, line: &str, stats: &mut Stats) -> Option<String> {
        stats.lines += 1;
        let record = self.parser.parse(line);
        if !record.is_structured() {
            stats.unparsed += 1;
        }

        if !self.filter.accepts(&record) {
            return None;
        }
        if let Some(action) = &self.action {
            action.trigger(&record);
        }
        stats.emitted += 1;
        Some(self.renderer.render(&record))
    }

    /// Drain the stream into `out`, one line at a time and in input order.
    ///
    /// Output is flushed whenever no further line is ready, so live input is
    /// displayed as it arrives. Read and write failures end the run; whatever
    /// was rendered before is flushed first.
    pub async fn run<W: Write>(&self, stream: &mut LineStream, out: &mut W) -> Result<Stats> {
        let mut stats = Stats::default();

        while let Some(item) = stream.next().await {
            let line = match item {
                Ok(line) => line,
                Err(e) => {
                    let _ = out.flush();
                    return Err(e);
                }
            };

            if let Some(text) = self.process(&line, &mut stats) {
                writeln!(out, "{}", text).map_err(SnazyError::OutputError)?;
            }

            if stream.is_empty() {
                out.flush().map_err(SnazyError::OutputError)?;
            }
        }

        out.flush().map_err(SnazyError::OutputError)?;
        tracing::debug!(
            lines = stats.lines,
            emitted = stats.emitted,
            unparsed = stats.unparsed,
            "Input exhausted"
        );
        Ok(stats)
    }
}
