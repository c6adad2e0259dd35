//! Logging setup for the zapwallet binary

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_JSON_ENV: &str = "ZAPWALLET_LOG_JSON";

/// Install a stderr subscriber. `RUST_LOG` sets the filter (default `warn`),
/// `ZAPWALLET_LOG_JSON=1` switches to JSON lines.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let use_json = std::env::var(LOG_JSON_ENV)
        .map(|value| value == "1")
        .unwrap_or(false);

    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .compact()
            .with_writer(std::io::stderr)
            .try_init();
    }
}
