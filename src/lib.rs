// Library exports for snazy, a snazzy json log viewer

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod input;
pub mod parse;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod telemetry;
