//! Offline integrity checks over the ledger.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::error::Result;
use crate::model::{
    ballot::BallotEntry,
    candidate::CandidateList,
    db::{BallotLedger, CandidateRegistry, FileStores},
    voter::VoterRecord,
};

/// Everything the audit found.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Number of ledger entries read.
    pub entries: u64,
    /// Voter ids with more than one ballot, and how many each has.
    pub duplicate_voters: BTreeMap<String, u64>,
    /// Ballots for candidate ids that are not in the registry.
    pub unknown_candidates: Vec<BallotEntry>,
    /// Voter ids in the ledger that are not on the roster.
    pub unregistered_voters: Vec<String>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_voters.is_empty()
            && self.unknown_candidates.is_empty()
            && self.unregistered_voters.is_empty()
    }
}

/// Check every entry against the candidate list and roster.
pub fn audit<E>(entries: E, candidates: &CandidateList, voters: &[VoterRecord]) -> Result<AuditReport>
where
    E: IntoIterator<Item = Result<BallotEntry>>,
{
    let registered = voters.iter().map(|v| v.id.as_str()).collect::<HashSet<_>>();
    let mut report = AuditReport::default();
    let mut ballots_per_voter = BTreeMap::<String, u64>::new();
    let mut unregistered = HashSet::new();

    for entry in entries {
        let entry = entry?;
        report.entries += 1;
        *ballots_per_voter.entry(entry.voter_id.clone()).or_default() += 1;
        if !registered.contains(entry.voter_id.as_str()) && unregistered.insert(entry.voter_id.clone()) {
            report.unregistered_voters.push(entry.voter_id.clone());
        }
        if candidates.get(&entry.candidate_id).is_none() {
            report.unknown_candidates.push(entry);
        }
    }

    report.duplicate_voters = ballots_per_voter
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .collect();
    Ok(report)
}

/// Audit the ledger held by the given file stores.
pub fn audit_stores(stores: &FileStores) -> Result<AuditReport> {
    let candidates = stores.candidates.list_candidates()?;
    let voters = stores.roster.voters()?;
    let report = audit(stores.ledger.entries()?, &candidates, &voters)?;
    if report.is_clean() {
        info!("Audit of {} ledger entries found no problems", report.entries);
    } else {
        warn!(
            "Audit of {} ledger entries: {} duplicate voters, {} unknown candidates, {} unregistered voters",
            report.entries,
            report.duplicate_voters.len(),
            report.unknown_candidates.len(),
            report.unregistered_voters.len()
        );
    }
    Ok(report)
}
