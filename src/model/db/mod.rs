//! File-backed stores and the traits the voting logic is written against.

use std::fs::File;
use std::path::Path;

use csv::{Reader, ReaderBuilder, Trim};

use crate::error::Result;
use crate::model::{
    ballot::BallotEntry,
    candidate::CandidateList,
    voter::VoterClaim,
};

pub mod admin;
pub mod candidates;
pub mod ledger;
pub mod roster;

pub use admin::AdminSecret;
pub use candidates::CsvCandidates;
pub use ledger::CsvLedger;
pub use roster::CsvRoster;

/// Source of voter identities.
pub trait IdentityStore {
    /// True iff some roster record backs up the claim.
    ///
    /// A roster that cannot be read is indistinguishable from one with no
    /// matching row: both give `false`.
    fn lookup(&self, claim: &VoterClaim) -> bool;
}

/// Source of the fixed candidate list.
pub trait CandidateRegistry {
    /// All candidates, in source order. Re-read on every call.
    fn list_candidates(&self) -> Result<CandidateList>;

    /// Display name parts for one candidate, or `None` if it is not listed
    /// (or the list cannot be read).
    fn resolve_name(&self, candidate_id: &str) -> Option<(String, String)> {
        let candidates = self.list_candidates().ok()?;
        candidates
            .resolve_name(candidate_id)
            .map(|(last, first)| (last.to_string(), first.to_string()))
    }
}

/// Append-only record of cast votes.
///
/// `append` does not check for duplicates: callers must consult `has_voted`
/// first. The two calls are not atomic with respect to other processes.
pub trait BallotLedger {
    type Entries: Iterator<Item = Result<BallotEntry>>;

    /// Every entry in append order. A ledger that does not exist yet is empty.
    fn entries(&self) -> Result<Self::Entries>;

    /// Append one entry unconditionally.
    fn append(&mut self, entry: &BallotEntry) -> Result<()>;

    /// True iff some entry already belongs to this voter.
    fn has_voted(&self, voter_id: &str) -> Result<bool> {
        for entry in self.entries()? {
            if entry?.voter_id == voter_id {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// The three stores a voting session works against.
#[derive(Debug)]
pub struct Stores<I, C, L> {
    pub roster: I,
    pub candidates: C,
    pub ledger: L,
}

/// Stores backed by CSV files on disk.
pub type FileStores = Stores<CsvRoster, CsvCandidates, CsvLedger>;

impl<I, C, L> Stores<I, C, L> {
    pub fn new(roster: I, candidates: C, ledger: L) -> Self {
        Self {
            roster,
            candidates,
            ledger,
        }
    }
}

impl FileStores {
    /// Stores for the given file paths. Nothing is opened until first use.
    pub fn open(
        roster: impl AsRef<Path>,
        candidates: impl AsRef<Path>,
        ledger: impl AsRef<Path>,
    ) -> Self {
        Self::new(
            CsvRoster::new(roster.as_ref()),
            CsvCandidates::new(candidates.as_ref()),
            CsvLedger::new(ledger.as_ref()),
        )
    }
}

/// A reader for a headered table, tolerant of stray whitespace and extra columns.
pub(crate) fn table_reader(path: &Path) -> Result<Reader<File>> {
    let reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?;
    Ok(reader)
}
