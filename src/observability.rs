use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter for interactive CLI use; terminal output carries the user-facing messages
pub const CLI_FILTER: &str = "warn";
pub const SERVER_FILTER: &str = "info,docquiz=debug,tower_http=debug";

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` overrides `default_filter`. Safe to call more than once; later
/// calls are ignored.
pub fn init_tracing(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init();
}
