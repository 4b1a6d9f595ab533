use core::{panic::AssertUnwindSafe, time::Duration};
use std::{panic, thread::Builder};

use serde::{Deserialize, Serialize};

use crate::{
    channel::ChannelTx,
    error::{self, Error},
    item::Item,
    observer::Observer,
    worker::{Cancel, Worker},
    PairId,
};

pub type BoxedSequence = Box<dyn Iterator<Item = Item> + Send>;

pub trait SequenceFactory {
    /// Creates the fixed sequence of items to be emitted.
    fn create(&self) -> BoxedSequence;
    /// Delay between two successive emissions.
    fn pacing(&self) -> Duration;
    /// Checks that the sequence is not empty.
    fn validate(&self) -> Result<(), Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum SequenceConfig {
    Numbers(NumbersConfig),
    Letters(LettersConfig),
}

impl SequenceFactory for SequenceConfig {
    fn create(&self) -> BoxedSequence {
        match self {
            Self::Numbers(c) => c.create(),
            Self::Letters(c) => c.create(),
        }
    }

    fn pacing(&self) -> Duration {
        match self {
            Self::Numbers(c) => c.pacing(),
            Self::Letters(c) => c.pacing(),
        }
    }

    fn validate(&self) -> Result<(), Error> {
        match self {
            Self::Numbers(c) => c.validate(),
            Self::Letters(c) => c.validate(),
        }
    }
}

/// Inclusive range of integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct NumbersConfig {
    pub from: u32,
    pub to: u32,
    /// Pacing in milliseconds.
    pub pacing: u64,
}

impl NumbersConfig {
    pub const fn new(from: u32, to: u32, pacing: Duration) -> Self {
        Self { from, to, pacing: pacing.as_millis() as u64 }
    }
}

impl SequenceFactory for NumbersConfig {
    fn create(&self) -> BoxedSequence {
        Box::new((self.from..=self.to).map(Item::Number))
    }

    fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.from > self.to {
            return Err(Error::Config(format!("empty number range {}..={}", self.from, self.to)));
        }

        Ok(())
    }
}

/// Inclusive range of characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LettersConfig {
    pub from: char,
    pub to: char,
    /// Pacing in milliseconds.
    pub pacing: u64,
}

impl LettersConfig {
    pub const fn new(from: char, to: char, pacing: Duration) -> Self {
        Self { from, to, pacing: pacing.as_millis() as u64 }
    }
}

impl SequenceFactory for LettersConfig {
    fn create(&self) -> BoxedSequence {
        Box::new((self.from..=self.to).map(Item::Letter))
    }

    fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.from > self.to {
            return Err(Error::Config(format!("empty letter range {}..={}", self.from, self.to)));
        }

        Ok(())
    }
}

/// Paced producer.
///
/// Emits its sequence into the channel, one item per pacing interval,
/// followed by exactly one [`Item::End`]. The cancellation flag is checked
/// before each emission and the pacing wait wakes up on stop, so a stop
/// request is observed without sitting out the interval.
pub struct Generator {
    pair: PairId,
    sequence: BoxedSequence,
    pacing: Duration,
    tx: ChannelTx,
    /// Whether this generator is still active.
    cancel: Cancel,
}

impl Generator {
    pub fn new(pair: PairId, sequence: BoxedSequence, pacing: Duration, tx: ChannelTx) -> Self {
        Self {
            pair,
            sequence,
            pacing,
            tx,
            cancel: Cancel::new(),
        }
    }

    /// Constructs a new [`Generator`] from the given sequence config.
    pub fn with_config<F>(pair: PairId, cfg: &F, tx: ChannelTx) -> Self
    where
        F: SequenceFactory,
    {
        Self::new(pair, cfg.create(), cfg.pacing(), tx)
    }

    /// Runs this generator on a dedicated thread.
    pub fn spawn<O>(self, mut observer: O) -> Result<Worker, Error>
    where
        O: Observer + Send + 'static,
    {
        let name = format!("seqgen:g{}", self.pair.0);
        let cancel = self.cancel.clone();
        let thread = Builder::new().name(name.clone()).spawn(move || self.run(&mut observer))?;

        Ok(Worker::new(name, cancel, thread))
    }

    /// Runs this generator on the current thread until its sequence is
    /// exhausted or it is stopped.
    pub fn run<O>(mut self, observer: &mut O)
    where
        O: Observer,
    {
        log::debug!("pair {}: generator started", self.pair);

        let rc = match panic::catch_unwind(AssertUnwindSafe(|| self.emit())) {
            Ok(rc) => rc.map_err(|err| err.to_string()),
            Err(payload) => Err(error::panic_message(payload.as_ref())),
        };

        if let Err(message) = rc {
            log::error!("pair {}: generation fault: {message}", self.pair);
            observer.on_error(Error::GenerationFault { pair: self.pair, message });
        }

        // The sentinel goes out even after a stop request or a fault, so the
        // consumer never waits for it in vain.
        if let Err(err) = self.tx.send(Item::End) {
            log::debug!("pair {}: failed to send end: {err}", self.pair);
        }

        self.cancel.stop();
        log::debug!("pair {}: generator finished", self.pair);
    }

    fn emit(&mut self) -> Result<(), Error> {
        for item in &mut self.sequence {
            if !self.cancel.is_running() {
                log::debug!("pair {}: generator cancelled", self.pair);
                break;
            }

            self.tx.send(item)?;
            self.cancel.wait(self.pacing);
        }

        Ok(())
    }
}
