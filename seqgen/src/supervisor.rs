use core::{mem, time::Duration};
use std::collections::BTreeMap;

use crossbeam_channel::{Receiver, Sender};

use crate::{
    cfg::Config,
    channel::{self, ChannelRx},
    consumer::Consumer,
    error::Error,
    generator::Generator,
    observer::{Notification, Notifier, Observer},
    worker::Worker,
    Mode, PairId,
};

/// A generator and a consumer sharing one channel.
#[derive(Debug)]
struct Pair {
    mode: Mode,
    generator: Worker,
    consumer: Worker,
    /// Kept to discard unconsumed items once the pair is gone.
    rx: ChannelRx,
}

impl Pair {
    #[inline]
    fn stop(&self) {
        self.generator.stop();
        self.consumer.stop();
    }

    #[inline]
    fn is_finished(&self) -> bool {
        self.generator.is_finished() && self.consumer.is_finished()
    }
}

/// Outcome of [`Supervisor::shutdown`].
#[derive(Debug, Default)]
pub struct Shutdown {
    /// Threads that finished within their grace period.
    pub joined: usize,
    /// Threads abandoned after their grace period, one
    /// [`Error::ShutdownTimeout`] each.
    pub orphaned: Vec<Error>,
    /// Items left unconsumed in the channels.
    pub discarded: usize,
}

/// Owns the live generator/consumer pairs.
///
/// Lives on the coordinating thread together with the observer. Worker
/// threads never touch the supervisor state: they only flip their own
/// cancellation flags and queue notifications, which are handed to the
/// observer from [`Supervisor::poll`].
pub struct Supervisor<O> {
    cfg: Config,
    observer: O,
    next_id: u64,
    live: BTreeMap<PairId, Pair>,
    /// Completed or stopped pairs whose threads are still finishing.
    retired: Vec<Pair>,
    tx: Sender<Notification>,
    rx: Receiver<Notification>,
}

impl<O> Supervisor<O> {
    pub fn new(cfg: Config, observer: O) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();

        Self {
            cfg,
            observer,
            next_id: 1,
            live: BTreeMap::new(),
            retired: Vec::new(),
            tx,
            rx,
        }
    }

    #[inline]
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Returns the number of live pairs.
    #[inline]
    pub fn live(&self) -> usize {
        self.live.len()
    }

    /// Returns `true` when no pair is live and every retired thread has
    /// been reaped.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.live.is_empty() && self.retired.is_empty()
    }

    /// Starts a new generator/consumer pair for the given mode.
    pub fn start(&mut self, mode: Mode) -> Result<PairId, Error> {
        let id = PairId(self.next_id);
        self.next_id += 1;

        let (tx, rx) = channel::channel(self.cfg.capacity);
        let generator =
            Generator::with_config(id, self.cfg.sequence(mode), tx).spawn(Notifier::new(self.tx.clone()))?;
        let consumer = Consumer::new(id, rx.clone(), Notifier::new(self.tx.clone()), self.cfg.wait_timeout());
        let consumer = match consumer.spawn() {
            Ok(consumer) => consumer,
            Err(err) => {
                // Nobody is going to read the channel, let the generator go.
                generator.stop();
                return Err(err);
            }
        };

        log::info!("pair {id}: started {mode:?}");
        self.live.insert(id, Pair { mode, generator, consumer, rx });

        Ok(id)
    }

    /// Requests the given pair to stop.
    ///
    /// The pair is reaped once its consumer reports completion. Returns
    /// `false` if the pair is not live.
    pub fn stop(&mut self, id: PairId) -> bool {
        match self.live.get(&id) {
            Some(pair) => {
                log::debug!("pair {id}: stop requested");
                pair.stop();
                true
            }
            None => false,
        }
    }

    /// Cancels every pair and waits for their threads.
    ///
    /// Each thread gets up to the configured grace period. Threads that do
    /// not finish in time are detached and reported. All channels are
    /// drained and queued notifications are discarded, so the observer hears
    /// nothing more after this returns.
    ///
    /// Safe to call multiple times.
    pub fn shutdown(&mut self) -> Shutdown {
        let mut out = Shutdown::default();

        let mut pairs: Vec<Pair> = mem::take(&mut self.live).into_values().collect();
        pairs.append(&mut self.retired);

        if !pairs.is_empty() {
            log::info!("shutting down {} pair(s)", pairs.len());
        }

        for pair in &pairs {
            pair.generator.stop();
        }
        for pair in &pairs {
            pair.consumer.stop();
        }

        let grace = self.cfg.grace_period();
        for Pair { generator, consumer, rx, .. } in pairs {
            for worker in [generator, consumer] {
                match worker.join_within(grace) {
                    Ok(()) => out.joined += 1,
                    Err(err) => {
                        log::warn!("{err}");
                        out.orphaned.push(err);
                    }
                }
            }

            out.discarded += rx.drain_all();
        }

        // Notifiers still held by orphaned threads keep the old queue alive;
        // swapping it out makes their sends fail instead of reaching the
        // observer on a later poll.
        let (tx, rx) = crossbeam_channel::unbounded();
        self.tx = tx;
        let dropped = mem::replace(&mut self.rx, rx).try_iter().count();
        if dropped > 0 {
            log::debug!("discarded {dropped} pending notification(s)");
        }

        out
    }

    /// Joins retired pairs whose threads are done, without blocking.
    fn reap(&mut self) {
        let (done, pending): (Vec<Pair>, Vec<Pair>) = mem::take(&mut self.retired)
            .into_iter()
            .partition(Pair::is_finished);
        self.retired = pending;

        for Pair { generator, consumer, rx, .. } in done {
            for worker in [generator, consumer] {
                if let Err(err) = worker.join_within(Duration::ZERO) {
                    log::warn!("{err}");
                }
            }
            rx.drain_all();
        }
    }
}

impl<O> Supervisor<O>
where
    O: Observer,
{
    /// Delivers queued notifications to the observer.
    ///
    /// Waits up to `timeout` for the first one, then dispatches whatever
    /// else is already queued. Completed pairs are removed from the live set.
    /// Returns the number of notifications dispatched.
    pub fn poll(&mut self, timeout: Duration) -> usize {
        let mut num = 0;

        let mut next = self.rx.recv_timeout(timeout).ok();
        while let Some(notification) = next {
            self.dispatch(notification);
            num += 1;
            next = self.rx.try_recv().ok();
        }

        self.reap();

        num
    }

    fn dispatch(&mut self, notification: Notification) {
        match notification {
            Notification::Update(update) => {
                let id = update.pair;
                if let Err(err) = self.observer.on_update(update) {
                    log::error!("pair {id}: observer failed: {err}");
                    self.stop(id);
                    self.observer.on_error(err);
                }
            }
            Notification::Error(err) => {
                self.observer.on_error(err);
            }
            Notification::Complete(id) => {
                // Completion may race with shutdown, ignore pairs already
                // gone.
                if let Some(pair) = self.live.remove(&id) {
                    log::info!("pair {id}: {:?} completed", pair.mode);
                    pair.generator.stop();
                    self.retired.push(pair);
                    self.observer.on_complete(id);
                }
            }
        }
    }
}

impl<O> Drop for Supervisor<O> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
