use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// The administrator's shared secret, held in clear text.
///
/// Loaded once at startup; there is no way to change it while running.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSecret {
    secret: String,
}

impl AdminSecret {
    /// Wrap a secret. Trailing whitespace is not significant.
    pub fn new(secret: impl AsRef<str>) -> Self {
        Self {
            secret: secret.as_ref().trim_end().to_string(),
        }
    }

    /// Read the secret from a single-line file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let secret = Self::new(contents);
        info!("Loaded admin secret from {}", path.display());
        Ok(secret)
    }

    /// Check an attempt against the secret, ignoring trailing whitespace on the attempt.
    pub fn verify<T: AsRef<str>>(&self, attempt: T) -> bool {
        attempt.as_ref().trim_end() == self.secret
    }
}

/// Never print the secret itself.
impl Debug for AdminSecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSecret").finish_non_exhaustive()
    }
}
