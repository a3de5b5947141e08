// Diagnostic logging for snazy itself, kept off stdout

use tracing_subscriber::EnvFilter;

/// Environment variable holding the diagnostic log filter
pub const LOG_ENV: &str = "SNAZY_LOG";

/// Install the stderr subscriber. Defaults to `warn` when `SNAZY_LOG` is unset or invalid.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
