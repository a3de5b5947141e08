// Output helpers for messages addressed to the user rather than the log stream

use colored::*;

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}
