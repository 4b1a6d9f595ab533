use core::{panic::AssertUnwindSafe, time::Duration};
use std::{panic, thread::Builder};

use crate::{
    channel::{ChannelRx, Recv},
    error::{self, Error},
    item::{Item, Update},
    observer::Observer,
    worker::{Cancel, Worker},
    PairId,
};

/// Drains a channel and forwards every item to the observer.
///
/// The loop ends on [`Item::End`], on a stop request (observed within one
/// wait timeout, even when the channel is empty) or on the first fault.
/// Items left in the channel after a stop are abandoned, including one that
/// arrives while the stop request is pending.
pub struct Consumer<O> {
    pair: PairId,
    rx: ChannelRx,
    observer: O,
    /// Bounded wait of a single receive.
    wait_timeout: Duration,
    /// Whether this consumer is still active.
    cancel: Cancel,
}

impl<O> Consumer<O> {
    pub fn new(pair: PairId, rx: ChannelRx, observer: O, wait_timeout: Duration) -> Self {
        Self {
            pair,
            rx,
            observer,
            wait_timeout,
            cancel: Cancel::new(),
        }
    }
}

impl<O> Consumer<O>
where
    O: Observer,
{
    /// Runs this consumer on a dedicated thread.
    pub fn spawn(self) -> Result<Worker, Error>
    where
        O: Send + 'static,
    {
        let name = format!("seqgen:c{}", self.pair.0);
        let cancel = self.cancel.clone();
        let thread = Builder::new().name(name.clone()).spawn(move || self.run())?;

        Ok(Worker::new(name, cancel, thread))
    }

    /// Runs the receive loop on the current thread.
    ///
    /// Signals completion to the observer exactly once, whatever the reason
    /// the loop ended.
    pub fn run(mut self) {
        log::debug!("pair {}: consumer started", self.pair);

        let rc = match panic::catch_unwind(AssertUnwindSafe(|| self.consume())) {
            Ok(rc) => rc.map_err(|err| err.to_string()),
            Err(payload) => Err(error::panic_message(payload.as_ref())),
        };

        if let Err(message) = rc {
            log::error!("pair {}: consumption fault: {message}", self.pair);
            self.observer.on_error(Error::ConsumptionFault { pair: self.pair, message });
        }

        self.cancel.stop();
        self.observer.on_complete(self.pair);
        log::debug!("pair {}: consumer finished", self.pair);
    }

    fn consume(&mut self) -> Result<(), Error> {
        while self.cancel.is_running() {
            let item = match self.rx.receive(self.wait_timeout) {
                Recv::Item(item) => item,
                Recv::Empty => continue,
            };
            if !self.cancel.is_running() {
                break;
            }

            match Update::new(self.pair, item) {
                Some(update) => self.observer.on_update(update)?,
                None => {
                    debug_assert_eq!(Item::End, item);
                    log::debug!("pair {}: end of sequence", self.pair);
                    return Ok(());
                }
            }
        }

        log::debug!("pair {}: consumer cancelled", self.pair);
        Ok(())
    }
}
