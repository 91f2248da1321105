use serde::{Deserialize, Serialize};

/// Column names of the ledger header row.
pub const LEDGER_HEADER: [&str; 2] = ["id", "candidat"];

/// A single cast vote, linking a voter to the candidate they chose.
///
/// Entries are written once and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BallotEntry {
    #[serde(rename = "id")]
    pub voter_id: String,
    #[serde(rename = "candidat")]
    pub candidate_id: String,
}

impl BallotEntry {
    pub fn new(voter_id: impl Into<String>, candidate_id: impl Into<String>) -> Self {
        Self {
            voter_id: voter_id.into(),
            candidate_id: candidate_id.into(),
        }
    }

    /// Is this row actually the ledger header, possibly cut short by a crash
    /// while the ledger was being created?
    pub fn is_header(&self) -> bool {
        self.voter_id.eq_ignore_ascii_case(LEDGER_HEADER[0])
            && LEDGER_HEADER[1].starts_with(self.candidate_id.to_ascii_lowercase().as_str())
    }
}

/// Example data for tests.
#[cfg(test)]
pub(crate) mod examples {
    use super::*;

    impl BallotEntry {
        pub fn example() -> Self {
            Self::new("7", "c1")
        }
    }
}
