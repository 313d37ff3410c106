//! Logging setup for quorum.
//!
//! Verification decisions are logged through `tracing` with structured fields
//! (`node_id`, `format`, `verified_count`). Services want JSON lines; the CLI
//! wants human-readable output on stderr so stdout stays machine-readable.

pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};
pub use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Initialize the global subscriber with JSON output, filtered by `RUST_LOG`
/// (default `info`)
pub fn init_tracing() -> InitResult {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    init_json(filter)
}

/// Initialize JSON output with an explicit filter directive
pub fn init_tracing_with_level(level: &str) -> InitResult {
    init_json(EnvFilter::try_new(level)?)
}

/// Human-readable output on stderr, for command line tools
pub fn init_cli_tracing(level: Option<&str>) -> InitResult {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .try_init()?;

    Ok(())
}

/// Initialize tracing for tests with simplified output
pub fn init_tracing_test() -> InitResult {
    tracing_subscriber::registry()
        .with(EnvFilter::new("debug"))
        .with(fmt::layer().with_test_writer())
        .try_init()?;

    Ok(())
}

fn init_json(filter: EnvFilter) -> InitResult {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .json(),
        )
        .try_init()?;

    Ok(())
}
