use core::{
    num::NonZero,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use std::{
    io::{self, Write},
    sync::Arc,
};

use crate::{
    cfg::Config,
    cmd::Format,
    error::Error,
    item::Update,
    observer::Observer,
    supervisor::{Shutdown, Supervisor},
    Mode, PairId,
};

/// How often the coordinating loop checks the interrupt flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Observer that prints every update as a line.
#[derive(Debug)]
pub struct Print<W> {
    out: W,
    format: Format,
    num_updates: usize,
    num_errors: usize,
}

impl<W> Print<W> {
    pub fn new(out: W, format: Format) -> Self {
        Self { out, format, num_updates: 0, num_errors: 0 }
    }

    #[inline]
    pub fn num_updates(&self) -> usize {
        self.num_updates
    }

    #[inline]
    pub fn num_errors(&self) -> usize {
        self.num_errors
    }
}

impl<W> Observer for Print<W>
where
    W: Write,
{
    fn on_update(&mut self, update: Update) -> Result<(), Error> {
        let rc = match self.format {
            Format::Text => writeln!(self.out, "{} {}", update.kind, update.value),
            Format::Json => serde_json::to_writer(&mut self.out, &update)
                .map_err(io::Error::from)
                .and_then(|()| writeln!(self.out)),
        };
        rc.and_then(|()| self.out.flush())
            .map_err(|err| Error::ConsumptionFault { pair: update.pair, message: err.to_string() })?;

        self.num_updates += 1;
        Ok(())
    }

    fn on_error(&mut self, err: Error) {
        self.num_errors += 1;
        log::error!("{err}");
    }

    fn on_complete(&mut self, pair: PairId) {
        log::debug!("pair {pair}: done");
    }
}

/// What a [`Runtime`] run did.
#[derive(Debug)]
pub struct Summary {
    pub num_updates: usize,
    pub num_errors: usize,
    pub shutdown: Shutdown,
}

/// Drives a supervisor from the coordinating thread: starts the requested
/// pairs, dispatches notifications until every pair completed, the update
/// limit is reached or an interrupt arrives, then shuts down.
#[derive(Debug)]
pub struct Runtime {
    cfg: Config,
    modes: Vec<Mode>,
    format: Format,
    stop_after: Option<NonZero<usize>>,
    is_running: Arc<AtomicBool>,
}

impl Runtime {
    pub fn new(cfg: Config, modes: Vec<Mode>) -> Self {
        let is_running = Arc::new(AtomicBool::new(true));

        Self {
            cfg,
            modes,
            format: Format::Text,
            stop_after: None,
            is_running,
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_stop_after(mut self, stop_after: Option<NonZero<usize>>) -> Self {
        self.stop_after = stop_after;
        self
    }

    /// Returns the flag that, once cleared, makes [`Runtime::run`] shut down.
    #[inline]
    pub fn is_running(&self) -> Arc<AtomicBool> {
        self.is_running.clone()
    }

    pub fn run<W>(self, out: W) -> Result<Summary, Error>
    where
        W: Write,
    {
        let limit = self.stop_after.map_or(usize::MAX, NonZero::get);
        let mut supervisor = Supervisor::new(self.cfg, Print::new(out, self.format));

        for mode in self.modes {
            supervisor.start(mode)?;
        }

        while !supervisor.is_idle() {
            if !self.is_running.load(Ordering::SeqCst) {
                log::info!("interrupted");
                break;
            }
            if supervisor.observer().num_updates() >= limit {
                log::info!("reached {limit} update(s)");
                break;
            }

            supervisor.poll(POLL_INTERVAL);
        }

        let shutdown = supervisor.shutdown();
        let m = Summary {
            num_updates: supervisor.observer().num_updates(),
            num_errors: supervisor.observer().num_errors(),
            shutdown,
        };

        Ok(m)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        generator::{LettersConfig, NumbersConfig, SequenceConfig},
        item::Item,
    };

    fn config() -> Config {
        Config {
            number: SequenceConfig::Numbers(NumbersConfig::new(1, 3, Duration::from_millis(1))),
            letter: SequenceConfig::Letters(LettersConfig::new('A', 'C', Duration::from_millis(1))),
            progress: SequenceConfig::Numbers(NumbersConfig::new(1, 100, Duration::from_millis(1))),
            wait_timeout: 10,
            grace_period: 500,
            capacity: None,
        }
    }

    #[test]
    fn test_print_text() {
        let mut out = Vec::new();
        let mut print = Print::new(&mut out, Format::Text);

        print.on_update(Update::new(PairId(1), Item::Number(12)).unwrap()).unwrap();
        print.on_update(Update::new(PairId(2), Item::Letter('B')).unwrap()).unwrap();
        assert_eq!(2, print.num_updates());

        assert_eq!("number 12\nletter B\n", String::from_utf8(out).unwrap());
    }

    #[test]
    fn test_print_json() {
        let mut out = Vec::new();
        let mut print = Print::new(&mut out, Format::Json);

        print.on_update(Update::new(PairId(1), Item::Number(1)).unwrap()).unwrap();

        assert_eq!("{\"pair\":1,\"kind\":\"number\",\"value\":1}\n", String::from_utf8(out).unwrap());
    }

    #[test]
    fn test_run_to_completion() {
        let mut out = Vec::new();
        let summary = Runtime::new(config(), vec![Mode::Number, Mode::Letter]).run(&mut out).unwrap();

        assert_eq!(6, summary.num_updates);
        assert_eq!(0, summary.num_errors);
        assert!(summary.shutdown.orphaned.is_empty());

        let out = String::from_utf8(out).unwrap();
        let numbers: Vec<&str> = out.lines().filter(|v| v.starts_with("number")).collect();
        assert_eq!(vec!["number 1", "number 2", "number 3"], numbers);
        let letters: Vec<&str> = out.lines().filter(|v| v.starts_with("letter")).collect();
        assert_eq!(vec!["letter A", "letter B", "letter C"], letters);
    }

    #[test]
    fn test_run_stop_after() {
        let cfg = Config {
            progress: SequenceConfig::Numbers(NumbersConfig::new(1, 100, Duration::from_millis(5))),
            ..config()
        };
        let mut out = Vec::new();
        let summary = Runtime::new(cfg, vec![Mode::Progress])
            .with_stop_after(NonZero::new(3))
            .run(&mut out)
            .unwrap();

        assert!(summary.num_updates >= 3);
        assert!(summary.num_updates < 100);
        assert_eq!(2, summary.shutdown.joined);
    }

    #[test]
    fn test_run_interrupted() {
        let runtime = Runtime::new(config(), vec![Mode::Progress]);
        runtime.is_running().store(false, Ordering::SeqCst);

        let summary = runtime.run(std::io::sink()).unwrap();
        assert_eq!(0, summary.num_updates);
        assert_eq!(2, summary.shutdown.joined);
    }
}
