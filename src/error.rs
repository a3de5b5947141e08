use thiserror::Error;

/// Main error type for snazy
#[derive(Debug, Error)]
pub enum SnazyError {
    // Setup errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid regular expression '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid time '{0}': expected RFC3339, 'YYYY-MM-DD HH:MM:SS' or epoch seconds")]
    InvalidTime(String),

    #[error("Cannot open input {0}: {1}")]
    InputError(String, std::io::Error),

    #[error("Unsupported shell '{0}': expected one of bash, zsh, fish")]
    UnsupportedShell(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // Streaming errors
    #[error("Failed to read input: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write output: {0}")]
    OutputError(std::io::Error),
}

impl SnazyError {
    /// Process exit code for this error: 1 for setup problems, 2 once the stream is running
    pub fn exit_code(&self) -> i32 {
        match self {
            SnazyError::ReadError(_) | SnazyError::OutputError(_) => 2,
            _ => 1,
        }
    }

    /// Whether this is the consumer going away (e.g. `snazy file | head`)
    pub fn is_broken_pipe(&self) -> bool {
        matches!(
            self,
            SnazyError::OutputError(e) if e.kind() == std::io::ErrorKind::BrokenPipe
        )
    }
}

/// Result type alias for snazy operations
pub type Result<T> = std::result::Result<T, SnazyError>;
