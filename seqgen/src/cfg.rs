use core::{num::NonZero, time::Duration};
use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    cmd::Cmd,
    error::Error,
    generator::{LettersConfig, NumbersConfig, SequenceConfig, SequenceFactory},
    Mode,
};

/// Runtime configuration.
///
/// All durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Sequence emitted in the "number" mode.
    pub number: SequenceConfig,
    /// Sequence emitted in the "letter" mode.
    pub letter: SequenceConfig,
    /// Sequence emitted in the "progress" mode.
    pub progress: SequenceConfig,
    /// Bounded wait of a single consumer receive.
    pub wait_timeout: u64,
    /// How long shutdown waits for each worker thread.
    pub grace_period: u64,
    /// Soft channel capacity. Crossing it only logs a warning.
    pub capacity: Option<NonZero<usize>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            number: SequenceConfig::Numbers(NumbersConfig::new(1, 30, Duration::from_millis(1000))),
            letter: SequenceConfig::Letters(LettersConfig::new('A', 'Z', Duration::from_millis(1300))),
            progress: SequenceConfig::Numbers(NumbersConfig::new(1, 100, Duration::from_millis(1000))),
            wait_timeout: 500,
            grace_period: 500,
            capacity: None,
        }
    }
}

impl Config {
    /// Returns the sequence configured for the given mode.
    #[inline]
    pub fn sequence(&self, mode: Mode) -> &SequenceConfig {
        match mode {
            Mode::Number => &self.number,
            Mode::Letter => &self.letter,
            Mode::Progress => &self.progress,
        }
    }

    #[inline]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout)
    }

    #[inline]
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.number.validate()?;
        self.letter.validate()?;
        self.progress.validate()?;

        if self.wait_timeout == 0 {
            return Err(Error::Config("wait timeout must be positive".into()));
        }

        Ok(())
    }
}

impl TryFrom<&Cmd> for Config {
    type Error = Error;

    fn try_from(v: &Cmd) -> Result<Self, Self::Error> {
        match &v.config {
            Some(path) => load_config(path),
            None => Ok(Self::default()),
        }
    }
}

/// Loads and validates the configuration file in YAML format.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|err| Error::Config(format!("{}: {err}", path.display())))?;
    let cfg: Config =
        serde_yaml::from_slice(&data).map_err(|err| Error::Config(format!("{}: {err}", path.display())))?;
    cfg.validate()?;

    Ok(cfg)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();

        assert_eq!(30, cfg.sequence(Mode::Number).create().count());
        assert_eq!(26, cfg.sequence(Mode::Letter).create().count());
        assert_eq!(100, cfg.sequence(Mode::Progress).create().count());
        assert_eq!(Duration::from_millis(1000), cfg.sequence(Mode::Number).pacing());
        assert_eq!(Duration::from_millis(1300), cfg.sequence(Mode::Letter).pacing());
        assert_eq!(Duration::from_millis(500), cfg.wait_timeout());
        assert_eq!(Duration::from_millis(500), cfg.grace_period());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let cfg: Config = serde_yaml::from_str(
            r#"
number: { type: numbers, from: 1, to: 5, pacing: 10 }
wait_timeout: 50
capacity: 16
"#,
        )
        .unwrap();

        assert_eq!(SequenceConfig::Numbers(NumbersConfig::new(1, 5, Duration::from_millis(10))), cfg.number);
        assert_eq!(Config::default().letter, cfg.letter);
        assert_eq!(Duration::from_millis(50), cfg.wait_timeout());
        assert_eq!(NonZero::new(16), cfg.capacity);
    }

    #[test]
    fn test_validate() {
        let cfg = Config { wait_timeout: 0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(Error::Config(..))));

        let cfg = Config {
            letter: SequenceConfig::Letters(LettersConfig::new('z', 'a', Duration::ZERO)),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Config(..))));
    }

    #[test]
    fn test_unknown_field() {
        assert!(serde_yaml::from_str::<Config>("grace: 10").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(load_config("/nonexistent/seqgen.yaml"), Err(Error::Config(..))));
    }
}
