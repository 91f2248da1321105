use crate::error::Result;
use crate::model::{
    candidate::display_name,
    db::{BallotLedger, CandidateRegistry, Stores},
    tally::TallyResult,
};

/// Counts the ledger against the candidate list.
#[derive(Debug)]
pub struct TallyEngine<'a, C, L> {
    candidates: &'a C,
    ledger: &'a L,
}

impl<'a, C, L> TallyEngine<'a, C, L>
where
    C: CandidateRegistry,
    L: BallotLedger,
{
    pub fn new(candidates: &'a C, ledger: &'a L) -> Self {
        Self { candidates, ledger }
    }

    pub fn for_stores<I>(stores: &'a Stores<I, C, L>) -> Self {
        Self::new(&stores.candidates, &stores.ledger)
    }

    /// Read the whole ledger and count votes per candidate display name.
    ///
    /// Votes for candidate ids missing from the registry land in the unresolved
    /// bucket, so the tally total always equals the number of ledger entries.
    /// An absent ledger gives an empty tally.
    pub fn compute_tally(&self) -> Result<TallyResult> {
        let mut tally = TallyResult::new();
        let mut entries = self.ledger.entries()?.peekable();
        if entries.peek().is_none() {
            info!("No votes recorded");
            return Ok(tally);
        }

        let candidates = self.candidates.list_candidates()?;
        for entry in entries {
            let entry = entry?;
            match candidates.resolve_name(&entry.candidate_id) {
                Some((last_name, first_name)) => tally.record(display_name(last_name, first_name)),
                None => {
                    warn!(
                        "Vote from {} is for unknown candidate {}",
                        entry.voter_id, entry.candidate_id
                    );
                    tally.record_unresolved();
                }
            }
        }
        info!("Tallied {} votes", tally.total());
        Ok(tally)
    }
}
