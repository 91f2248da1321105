use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config as LogConfig, Root},
    encode::pattern::PatternEncoder,
};
use log4rs_dynamic_filters::DynamicLevelFilter;
use thiserror::Error;

/// Name of the dynamic filter declared in `log4rs.yaml` for this crate's output.
pub const CRATE_FILTER: &str = "ballot_box";

const FALLBACK_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}";

/// A unique identifier for a particular voting session.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SessionId(pub usize);

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "sess{}", self.0)
    }
}

impl SessionId {
    /// Atomically get the next ID. This wraps around back to zero if you somehow exceed a usize.
    pub fn next() -> SessionId {
        static SESSION_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);
        SessionId(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid fallback logging config: {0}")]
    Config(#[from] log4rs::config::runtime::ConfigErrors),
    #[error("Logger already set: {0}")]
    AlreadySet(#[from] log::SetLoggerError),
}

/// Set up logging from a log4rs YAML file, falling back to warnings on stderr
/// if the file is missing or invalid.
pub fn init(config_path: &Path) -> Result<(), LoggingError> {
    match log4rs::init_file(config_path, log4rs_dynamic_filters::default_deserializers()) {
        Ok(()) => {
            info!("Initialised logging from {}", config_path.display());
            Ok(())
        }
        Err(err) => {
            init_fallback()?;
            warn!(
                "Could not load logging config {}: {err}; using stderr",
                config_path.display()
            );
            Ok(())
        }
    }
}

fn init_fallback() -> Result<(), LoggingError> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(FALLBACK_PATTERN)))
        .build();
    let config = LogConfig::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn))?;
    log4rs::init_config(config)?;
    Ok(())
}

/// Change the level of this crate's output at runtime.
///
/// Only has an effect when the active config declares the `ballot_box` dynamic filter.
pub fn set_verbosity(level: LevelFilter) {
    DynamicLevelFilter::set(CRATE_FILTER, level);
}
