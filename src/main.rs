use snazy::cli::{output, Cli};

#[tokio::main]
async fn main() {
    snazy::telemetry::init();

    let code = match Cli::run().await {
        Ok(()) => 0,
        Err(e) => {
            if e.is_broken_pipe() {
                tracing::debug!("Output closed, stopping");
            } else {
                output::print_error(&e.to_string());
            }
            e.exit_code()
        }
    };

    // Exit without dropping the runtime: a stdin reader parked in a blocking
    // read would otherwise keep the process alive after Ctrl-C.
    std::process::exit(code);
}
