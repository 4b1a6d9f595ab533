use crossbeam_channel::Sender;

use crate::{error::Error, item::Update, PairId};

/// Receiver of worker notifications.
///
/// This is the seam to the external collaborator (e.g. a UI list). The
/// supervisor only ever calls it from the coordinating thread.
pub trait Observer {
    /// Called once per non-sentinel item, in emission order.
    ///
    /// A returned error is a consumption fault and terminates the consumer.
    fn on_update(&mut self, update: Update) -> Result<(), Error>;

    /// Called when a worker faults.
    fn on_error(&mut self, err: Error);

    /// Called when a consumer's loop ended.
    fn on_complete(&mut self, _pair: PairId) {}
}

/// Lifecycle and data events travelling from worker threads to the
/// coordinating thread.
#[derive(Debug)]
pub enum Notification {
    Update(Update),
    Error(Error),
    Complete(PairId),
}

/// Observer that queues notifications for the coordinating thread.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Sender<Notification>,
}

impl Notifier {
    #[inline]
    pub const fn new(tx: Sender<Notification>) -> Self {
        Self { tx }
    }
}

impl Observer for Notifier {
    fn on_update(&mut self, update: Update) -> Result<(), Error> {
        self.tx.send(Notification::Update(update)).map_err(|_| Error::Disconnected)
    }

    fn on_error(&mut self, err: Error) {
        if let Err(err) = self.tx.send(Notification::Error(err)) {
            log::debug!("dropped error notification: {:?}", err.into_inner());
        }
    }

    fn on_complete(&mut self, pair: PairId) {
        if self.tx.send(Notification::Complete(pair)).is_err() {
            log::debug!("pair {pair}: dropped completion notification");
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Default)]
    struct Inner {
        updates: Vec<Update>,
        errors: Vec<Error>,
        completed: Vec<PairId>,
    }

    /// Observer collecting everything it is told, shareable across threads.
    #[derive(Debug, Clone, Default)]
    pub struct Collect {
        inner: Arc<Mutex<Inner>>,
    }

    impl Collect {
        pub fn updates(&self) -> Vec<Update> {
            self.inner.lock().unwrap().updates.clone()
        }

        pub fn errors(&self) -> Vec<String> {
            self.inner.lock().unwrap().errors.iter().map(|v| v.to_string()).collect()
        }

        pub fn take_errors(&self) -> Vec<Error> {
            core::mem::take(&mut self.inner.lock().unwrap().errors)
        }

        pub fn completed(&self) -> Vec<PairId> {
            self.inner.lock().unwrap().completed.clone()
        }
    }

    impl Observer for Collect {
        fn on_update(&mut self, update: Update) -> Result<(), Error> {
            self.inner.lock().unwrap().updates.push(update);
            Ok(())
        }

        fn on_error(&mut self, err: Error) {
            self.inner.lock().unwrap().errors.push(err);
        }

        fn on_complete(&mut self, pair: PairId) {
            self.inner.lock().unwrap().completed.push(pair);
        }
    }

    #[test]
    fn test_notifier_forwards() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut notifier = Notifier::new(tx);

        notifier.on_complete(PairId(4));

        assert!(matches!(rx.try_recv(), Ok(Notification::Complete(PairId(4)))));
    }

    #[test]
    fn test_notifier_disconnected() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        let mut notifier = Notifier::new(tx);
        let update = Update::new(PairId(1), crate::item::Item::Number(1)).unwrap();

        assert!(matches!(notifier.on_update(update), Err(Error::Disconnected)));
    }
}
