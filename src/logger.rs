use tracing::{debug, trace};
use tracing_subscriber::{fmt, EnvFilter};

/// Timestamp layout for log lines
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Installs a fmt subscriber filtered by `RUST_LOG` (default `info`).
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_timer(fmt::time::ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_target(false)
        .try_init();
}

/// Dumps an SDP document line by line at trace level
pub fn dump_sdp(label: &str, sdp: &str) {
    debug!(
        "{label}: {} bytes, {} lines",
        sdp.len(),
        sdp.lines().count()
    );
    for (i, line) in sdp.lines().enumerate() {
        trace!("{label} [{i}]: {line}");
    }
}
