//! Telemetry logic.
//! Support logging and metrics.
use metrics::Unit;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Level used when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Install the global `tracing` subscriber.
///
/// Logs go to stderr, leaving stdout to command output.
pub fn init() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_LEVEL));

    // A second call, e.g. from tests, keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Describe connector metrics to the installed recorder, if any.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "ldap_login_total",
        Unit::Count,
        "Password logins, by outcome."
    );
    metrics::describe_counter!(
        "ldap_refresh_total",
        Unit::Count,
        "Identity refreshes, by outcome."
    );
}
