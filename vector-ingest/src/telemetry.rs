//! Tracing setup.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Filter comes from `RUST_LOG` (default `info`). Set `LOG_FORMAT=json` for
/// JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
