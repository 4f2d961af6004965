//! Diagnostic logging setup.
//!
//! Status lines meant for the user are printed directly; this subscriber only
//! carries `tracing` diagnostics, on stderr, at a level picked by `-v`.

use tracing::level_filters::LevelFilter;

/// Map the `-v` count to a level: warn, info, debug, then trace
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level_for(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
