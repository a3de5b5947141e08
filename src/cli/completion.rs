use super::Cli;
use crate::error::{Result, SnazyError};
use clap::CommandFactory;
use clap_complete::Shell;
use std::str::FromStr;

/// Shells we can emit completion scripts for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

impl FromStr for CompletionShell {
    type Err = SnazyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bash" => Ok(CompletionShell::Bash),
            "zsh" => Ok(CompletionShell::Zsh),
            "fish" => Ok(CompletionShell::Fish),
            _ => Err(SnazyError::UnsupportedShell(s.to_string())),
        }
    }
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
        }
    }
}

/// Completion script for the named shell, generated from the CLI definition
pub fn emit_completion(shell_name: &str) -> Result<String> {
    let shell: CompletionShell = shell_name.parse()?;
    let mut command = Cli::command();
    let mut buf = Vec::new();
    clap_complete::generate(Shell::from(shell), &mut command, "snazy", &mut buf);
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
