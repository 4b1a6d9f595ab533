//! Point-to-point FIFO shared by one generator and one consumer.

use core::{
    num::NonZero,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use std::sync::Arc;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::{error::Error, item::Item};

/// Result of a bounded-wait receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recv {
    Item(Item),
    /// Nothing arrived within the wait window.
    Empty,
}

/// Creates a new channel.
///
/// The channel never blocks the sender. The optional `capacity` is a soft
/// bound: crossing it only emits a warning.
pub fn channel(capacity: Option<NonZero<usize>>) -> (ChannelTx, ChannelRx) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let tx = ChannelTx {
        tx,
        capacity,
        overflow: Arc::new(AtomicBool::new(false)),
    };
    let rx = ChannelRx { rx };

    (tx, rx)
}

/// Sending half, owned by the generator.
#[derive(Debug, Clone)]
pub struct ChannelTx {
    tx: Sender<Item>,
    capacity: Option<NonZero<usize>>,
    /// Whether the soft bound is currently exceeded.
    overflow: Arc<AtomicBool>,
}

impl ChannelTx {
    /// Appends the item to the tail of the channel.
    ///
    /// Fails only when the receiving half is gone.
    pub fn send(&self, item: Item) -> Result<(), Error> {
        self.tx.send(item).map_err(|_| Error::Disconnected)?;

        if let Some(capacity) = self.capacity {
            let len = self.tx.len();
            if len > capacity.get() {
                if !self.overflow.swap(true, Ordering::Relaxed) {
                    log::warn!("channel holds {len} items, above its capacity of {capacity}");
                }
            } else {
                self.overflow.store(false, Ordering::Relaxed);
            }
        }

        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tx.len()
    }
}

/// Receiving half, owned by the consumer.
#[derive(Debug, Clone)]
pub struct ChannelRx {
    rx: Receiver<Item>,
}

impl ChannelRx {
    /// Waits up to `timeout` for the head item.
    ///
    /// A disconnected and empty channel reports [`Recv::Empty`] after the
    /// same wait, so the caller keeps pacing on its own cancellation flag.
    pub fn receive(&self, timeout: Duration) -> Recv {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Recv::Item(item),
            Err(RecvTimeoutError::Timeout) => Recv::Empty,
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(timeout);
                Recv::Empty
            }
        }
    }

    /// Discards every unconsumed item, returning how many were dropped.
    ///
    /// Used only at shutdown, never for data delivery.
    pub fn drain_all(&self) -> usize {
        self.rx.try_iter().count()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod test {
    use std::{thread, time::Instant};

    use super::*;

    #[test]
    fn test_fifo() {
        let (tx, rx) = channel(None);
        for v in 1..=5 {
            tx.send(Item::Number(v)).unwrap();
        }
        tx.send(Item::End).unwrap();

        for v in 1..=5 {
            assert_eq!(Recv::Item(Item::Number(v)), rx.receive(Duration::from_millis(10)));
        }
        assert_eq!(Recv::Item(Item::End), rx.receive(Duration::from_millis(10)));
        assert_eq!(Recv::Empty, rx.receive(Duration::from_millis(10)));
    }

    #[test]
    fn test_receive_times_out() {
        let (_tx, rx) = channel(None);

        let now = Instant::now();
        assert_eq!(Recv::Empty, rx.receive(Duration::from_millis(50)));
        assert!(now.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_receive_wakes_on_send() {
        let (tx, rx) = channel(None);

        let thread = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            tx.send(Item::Letter('A')).unwrap();
        });

        assert_eq!(Recv::Item(Item::Letter('A')), rx.receive(Duration::from_secs(5)));
        thread.join().unwrap();
    }

    #[test]
    fn test_send_disconnected() {
        let (tx, rx) = channel(None);
        drop(rx);

        assert!(matches!(tx.send(Item::End), Err(Error::Disconnected)));
    }

    #[test]
    fn test_soft_capacity_never_rejects() {
        let (tx, rx) = channel(NonZero::new(2));
        for v in 0..10 {
            tx.send(Item::Number(v)).unwrap();
        }

        assert_eq!(10, tx.len());
        assert_eq!(10, rx.drain_all());
        assert!(rx.is_empty());
    }

    #[test]
    fn test_items_are_taken_once() {
        let (tx, rx) = channel(None);
        let rx2 = rx.clone();
        tx.send(Item::Number(1)).unwrap();

        assert_eq!(Recv::Item(Item::Number(1)), rx.receive(Duration::from_millis(10)));
        assert_eq!(Recv::Empty, rx2.receive(Duration::from_millis(10)));
    }
}
