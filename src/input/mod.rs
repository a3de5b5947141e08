// Input module - Line reading from stdin and files

mod reader;

pub use reader::{decode_line, InputSource, LineStream, ReadOptions, CHANNEL_CAPACITY};
