use crate::model::{db::IdentityStore, voter::VoterClaim};

/// Decides whether a claim comes from someone on the roster.
///
/// The voting session talks to this rather than to the roster so that it does
/// not depend on how voters are stored.
#[derive(Debug)]
pub struct EligibilityVerifier<'a, I> {
    roster: &'a I,
}

impl<'a, I: IdentityStore> EligibilityVerifier<'a, I> {
    pub fn new(roster: &'a I) -> Self {
        Self { roster }
    }

    pub fn verify(&self, claim: &VoterClaim) -> bool {
        self.roster.lookup(claim)
    }
}
