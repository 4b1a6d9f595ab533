use std::error::Error;

use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Maps the number of `-v` flags to the crate's log level.
fn level(verbosity: usize) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the global logger.
///
/// Only records from this crate pass. Each line carries the name of the
/// emitting thread, so `seqgen:g<N>` and `seqgen:c<N>` tell the producer and
/// the consumer of pair N apart.
pub fn init(verbosity: usize) -> Result<(), Box<dyn Error>> {
    SimpleLogger::new()
        .with_level(LevelFilter::Off)
        .with_module_level(env!("CARGO_CRATE_NAME"), level(verbosity))
        .with_threads(true)
        .with_utc_timestamps()
        .init()?;

    Ok(())
}
