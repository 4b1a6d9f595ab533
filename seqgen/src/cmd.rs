use core::num::NonZero;
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::Mode;

/// Paced sequence generators, each drained by its own consumer.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Cmd {
    /// Sequences to run concurrently, one generator/consumer pair each.
    #[clap(value_enum, required = true)]
    pub modes: Vec<Mode>,
    /// Path to the configuration file in YAML format.
    ///
    /// Overrides sequences, pacing intervals, the consumer wait timeout and
    /// the shutdown grace period.
    #[clap(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// How updates are printed.
    #[clap(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
    /// Shut down after this many updates were printed.
    #[clap(long, value_name = "N")]
    pub stop_after: Option<NonZero<usize>>,
    /// Be verbose in terms of logging.
    #[clap(short, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Output format of update lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// "<kind> <value>" per line.
    Text,
    /// One JSON object per line.
    Json,
}
