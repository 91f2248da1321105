use std::io::Error as IoError;

use csv::Error as CsvError;
use figment::Error as ConfigError;
use serde_json::Error as JsonError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Csv(#[from] CsvError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Json(#[from] JsonError),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl Error {
    /// True if this error means the underlying file simply does not exist yet.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            Self::Csv(err) => match err.kind() {
                csv::ErrorKind::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
                _ => false,
            },
            _ => false,
        }
    }
}
