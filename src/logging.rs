//! Log output setup.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `Verbose = true` in `[General]` selects `debug` and lets `RUST_LOG`
/// refine it; otherwise the level is pinned to `info` so a stray `RUST_LOG`
/// in the environment cannot flood the console.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
