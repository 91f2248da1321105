use crate::error::{Error, Result};
use crate::model::{
    db::{AdminSecret, BallotLedger, CandidateRegistry},
    tally::TallyResult,
};

use super::results::TallyEngine;

/// Guards the results behind the administrator's shared secret.
///
/// There is no lockout or rate limiting: failed attempts may be retried freely.
#[derive(Debug, Clone)]
pub struct AdminGate {
    secret: AdminSecret,
}

impl AdminGate {
    pub fn new(secret: AdminSecret) -> Self {
        Self { secret }
    }

    /// Is this the admin secret? Trailing whitespace is ignored.
    pub fn authenticate<T: AsRef<str>>(&self, attempt: T) -> bool {
        let ok = self.secret.verify(attempt);
        if ok {
            info!("Admin authenticated");
        } else {
            warn!("Admin authentication failed");
        }
        ok
    }

    /// Compute the tally, but only for someone holding the secret.
    pub fn results<T, C, L>(&self, attempt: T, engine: &TallyEngine<'_, C, L>) -> Result<TallyResult>
    where
        T: AsRef<str>,
        C: CandidateRegistry,
        L: BallotLedger,
    {
        if !self.authenticate(attempt) {
            return Err(Error::Unauthorized("incorrect admin secret".to_string()));
        }
        engine.compute_tally()
    }
}
