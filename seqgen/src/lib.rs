use core::fmt::{self, Display, Formatter};

use clap::ValueEnum;
use serde::Serialize;

pub mod cfg;
pub mod channel;
pub mod cmd;
pub mod consumer;
pub mod error;
pub mod generator;
pub mod item;
pub mod logging;
pub mod observer;
pub mod runtime;
pub mod supervisor;
pub mod worker;

pub use self::{
    error::Error,
    item::{Item, Kind, Update, Value},
    observer::Observer,
    supervisor::Supervisor,
};

/// Identifier of a started generator/consumer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PairId(pub u64);

impl Display for PairId {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), fmt::Error> {
        write!(fmt, "#{}", self.0)
    }
}

/// Which sequence a started pair produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Mode {
    /// Integers, 1 to 30 by default.
    Number,
    /// Letters, A to Z by default.
    #[value(alias = "alpha")]
    Letter,
    /// Progress ticks, 1 to 100 by default.
    Progress,
}
