use std::fmt::{Debug, Formatter};

use thiserror::Error;

use crate::error::Error;
use crate::logging::SessionId;
use crate::model::{
    ballot::BallotEntry,
    candidate::CandidateList,
    db::{BallotLedger, CandidateRegistry, IdentityStore, Stores},
    voter::VoterClaim,
};

use super::eligibility::EligibilityVerifier;

/// Why a step of the voting session did not go through.
#[derive(Debug, Error)]
pub enum VoteError {
    /// The claim matches nobody on the roster, or the roster is unreadable.
    #[error("Identity could not be verified")]
    InvalidIdentity,
    /// This voter already has a ballot in the ledger.
    #[error("Voter {voter_id} has already voted")]
    AlreadyVoted { voter_id: String },
    /// The vote was submitted without choosing a candidate.
    #[error("No candidate selected")]
    NoSelection,
    /// The ledger or candidate list exists but could not be used.
    #[error("Storage failure: {0}")]
    Storage(#[from] Error),
}

/// A transition that failed. If the failure is recoverable, `retry` hands the
/// session back in the state it was in; otherwise the session is over.
pub struct Rejected<T> {
    pub error: VoteError,
    pub retry: Option<T>,
}

impl<T> Rejected<T> {
    fn retry(error: VoteError, session: T) -> Self {
        Self {
            error,
            retry: Some(session),
        }
    }

    fn terminal(error: VoteError) -> Self {
        Self { error, retry: None }
    }
}

impl<T> Debug for Rejected<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .field("retryable", &self.retry.is_some())
            .finish()
    }
}

/// Trait for the session state, so that each step can only be taken from the
/// state that allows it.
pub trait SessionState {
    /// Human-readable state name, for logs.
    const NAME: &'static str;
}

/// Marker state for a session waiting for the voter to identify themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwaitingIdentity;

impl SessionState for AwaitingIdentity {
    const NAME: &'static str = "AwaitingIdentity";
}

/// The voter is on the roster and has not voted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    voter_id: String,
}

impl SessionState for Verified {
    const NAME: &'static str = "Verified";
}

/// The ballot has been shown; waiting for the voter's choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwaitingSelection {
    voter_id: String,
    candidates: CandidateList,
}

impl SessionState for AwaitingSelection {
    const NAME: &'static str = "AwaitingSelection";
}

/// One voter's path from identification to a recorded ballot.
///
/// A recorded ballot ends the session; there is no way back to change it.
pub struct VotingSession<'a, I, C, L, S> {
    id: SessionId,
    stores: &'a mut Stores<I, C, L>,
    state: S,
}

impl<'a, I, C, L, S: SessionState> VotingSession<'a, I, C, L, S> {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state_name(&self) -> &'static str {
        S::NAME
    }

    fn advance<T: SessionState>(self, state: T) -> VotingSession<'a, I, C, L, T> {
        debug!("{} {} -> {}", self.id, S::NAME, T::NAME);
        VotingSession {
            id: self.id,
            stores: self.stores,
            state,
        }
    }
}

impl<I, C, L, S: Debug> Debug for VotingSession<'_, I, C, L, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VotingSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<I, C, L> Stores<I, C, L>
where
    I: IdentityStore,
    C: CandidateRegistry,
    L: BallotLedger,
{
    /// Start a new voting session against these stores.
    pub fn session(&mut self) -> VotingSession<'_, I, C, L, AwaitingIdentity> {
        VotingSession::new(self)
    }
}

impl<'a, I, C, L> VotingSession<'a, I, C, L, AwaitingIdentity>
where
    I: IdentityStore,
    C: CandidateRegistry,
    L: BallotLedger,
{
    pub fn new(stores: &'a mut Stores<I, C, L>) -> Self {
        let id = SessionId::next();
        debug!("{id} opened");
        Self {
            id,
            stores,
            state: AwaitingIdentity,
        }
    }

    /// Check the claim against the roster, then against the ledger.
    pub fn submit(
        self,
        claim: &VoterClaim,
    ) -> Result<VotingSession<'a, I, C, L, Verified>, Rejected<Self>> {
        let eligible = EligibilityVerifier::new(&self.stores.roster).verify(claim);
        if !eligible {
            info!("{} identity not verified for voter id {}", self.id, claim.id);
            return Err(Rejected::retry(VoteError::InvalidIdentity, self));
        }

        match self.stores.ledger.has_voted(&claim.id) {
            Ok(false) => {
                info!("{} voter {} verified", self.id, claim.id);
                Ok(self.advance(Verified {
                    voter_id: claim.id.clone(),
                }))
            }
            Ok(true) => {
                info!("{} voter {} has already voted", self.id, claim.id);
                Err(Rejected::terminal(VoteError::AlreadyVoted {
                    voter_id: claim.id.clone(),
                }))
            }
            Err(err) => {
                error!("{} could not read the ledger: {err}", self.id);
                Err(Rejected::retry(err.into(), self))
            }
        }
    }
}

impl<'a, I, C, L> VotingSession<'a, I, C, L, Verified>
where
    C: CandidateRegistry,
{
    pub fn voter_id(&self) -> &str {
        &self.state.voter_id
    }

    /// Load the ballot. No choice can be made before this.
    pub fn present_candidates(
        self,
    ) -> Result<VotingSession<'a, I, C, L, AwaitingSelection>, Rejected<Self>> {
        match self.stores.candidates.list_candidates() {
            Ok(candidates) => {
                let voter_id = self.state.voter_id.clone();
                Ok(self.advance(AwaitingSelection {
                    voter_id,
                    candidates,
                }))
            }
            Err(err) => {
                error!("{} could not load candidates: {err}", self.id);
                Err(Rejected::retry(err.into(), self))
            }
        }
    }
}

impl<'a, I, C, L> VotingSession<'a, I, C, L, AwaitingSelection>
where
    L: BallotLedger,
{
    pub fn voter_id(&self) -> &str {
        &self.state.voter_id
    }

    /// The candidates shown to the voter, in ballot order.
    pub fn candidates(&self) -> &CandidateList {
        &self.state.candidates
    }

    /// Record the voter's choice. This ends the session.
    pub fn select(self, candidate_id: &str) -> Result<BallotEntry, Rejected<Self>> {
        let candidate_id = candidate_id.trim();
        if candidate_id.is_empty() {
            return Err(Rejected::retry(VoteError::NoSelection, self));
        }

        let entry = BallotEntry::new(self.state.voter_id.as_str(), candidate_id);
        if let Err(err) = self.stores.ledger.append(&entry) {
            error!("{} could not record ballot: {err}", self.id);
            return Err(Rejected::retry(err.into(), self));
        }
        info!(
            "{} recorded ballot for voter {} (candidate {})",
            self.id, entry.voter_id, entry.candidate_id
        );
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::api::results::TallyEngine;
    use crate::config::Config;
    use crate::model::db::{CsvCandidates, CsvLedger, CsvRoster, FileStores};

    fn ledger_entries(stores: &FileStores) -> Vec<BallotEntry> {
        stores
            .ledger
            .entries()
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[store_test]
    fn happy_path(mut stores: FileStores) {
        let session = stores.session();
        assert_eq!(session.state_name(), "AwaitingIdentity");

        let session = session.submit(&VoterClaim::example()).unwrap();
        assert_eq!(session.voter_id(), "7");

        let session = session.present_candidates().unwrap();
        let ids = session
            .candidates()
            .iter()
            .map(|c| c.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["c1", "c2"]);

        let entry = session.select("c1").unwrap();
        assert_eq!(entry, BallotEntry::new("7", "c1"));

        assert_eq!(ledger_entries(&stores), vec![BallotEntry::new("7", "c1")]);
        let tally = TallyEngine::for_stores(&stores).compute_tally().unwrap();
        assert_eq!(tally.count_for("Traore Issa"), 1);
        assert_eq!(tally.total(), 1);
    }

    #[store_test(voted)]
    fn duplicate_vote(mut stores: FileStores) {
        let rejected = stores.session().submit(&VoterClaim::example()).unwrap_err();
        assert!(matches!(
            rejected.error,
            VoteError::AlreadyVoted { ref voter_id } if voter_id == "7"
        ));
        assert!(rejected.retry.is_none());
        assert_eq!(ledger_entries(&stores).len(), 1);
    }

    #[store_test]
    fn no_second_vote(mut stores: FileStores) {
        stores
            .session()
            .submit(&VoterClaim::example2())
            .unwrap()
            .present_candidates()
            .unwrap()
            .select("c2")
            .unwrap();

        // Whatever the voter would choose next time, they are turned away first.
        let rejected = stores
            .session()
            .submit(&VoterClaim::new("12", "DAO", "AWA", "X1"))
            .unwrap_err();
        assert!(matches!(rejected.error, VoteError::AlreadyVoted { .. }));
        assert!(stores.ledger.has_voted("12").unwrap());
        assert_eq!(ledger_entries(&stores), vec![BallotEntry::new("12", "c2")]);
    }

    #[store_test]
    fn bad_credentials(mut stores: FileStores) {
        let rejected = stores
            .session()
            .submit(&VoterClaim::new("7", "Kone", "Awa", "Z8"))
            .unwrap_err();
        assert!(matches!(rejected.error, VoteError::InvalidIdentity));

        // The same session can be retried with the right details.
        let session = rejected.retry.unwrap();
        assert!(!stores_ledger_exists(&session));
        let entry = session
            .submit(&VoterClaim::example())
            .unwrap()
            .present_candidates()
            .unwrap()
            .select("c2")
            .unwrap();
        assert_eq!(entry, BallotEntry::new("7", "c2"));
    }

    fn stores_ledger_exists<S>(
        session: &VotingSession<'_, CsvRoster, CsvCandidates, CsvLedger, S>,
    ) -> bool {
        session.stores.ledger.exists()
    }

    #[store_test]
    fn no_selection(mut stores: FileStores) {
        let session = stores
            .session()
            .submit(&VoterClaim::example())
            .unwrap()
            .present_candidates()
            .unwrap();

        let rejected = session.select("").unwrap_err();
        assert!(matches!(rejected.error, VoteError::NoSelection));
        let rejected = rejected.retry.unwrap().select("   ").unwrap_err();
        assert!(matches!(rejected.error, VoteError::NoSelection));

        let session = rejected.retry.unwrap();
        assert_eq!(session.state_name(), "AwaitingSelection");
        assert!(!stores_ledger_exists(&session));
        session.select("c1").unwrap();
        assert_eq!(ledger_entries(&stores), vec![BallotEntry::new("7", "c1")]);
    }

    #[store_test]
    fn unreadable_ledger_refuses_vote(config: Config) {
        // A directory where the ledger file should be.
        let mut stores = FileStores::open(
            config.roster_path(),
            config.candidates_path(),
            config.roster_path().parent().unwrap(),
        );
        let rejected = stores.session().submit(&VoterClaim::example()).unwrap_err();
        assert!(matches!(rejected.error, VoteError::Storage(_)));
        assert!(rejected.retry.is_some());
    }

    #[store_test]
    fn missing_candidates(config: Config) {
        let mut stores = FileStores::open(
            config.roster_path(),
            config.roster_path().with_file_name("nobody.csv"),
            config.ledger_path(),
        );
        let rejected = stores
            .session()
            .submit(&VoterClaim::example())
            .unwrap()
            .present_candidates()
            .unwrap_err();
        assert!(matches!(rejected.error, VoteError::Storage(ref err) if err.is_not_found()));
        assert_eq!(rejected.retry.unwrap().voter_id(), "7");
    }
}
