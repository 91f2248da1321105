use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label used for votes whose candidate is no longer in the registry.
pub const UNRESOLVED_LABEL: &str = "(unresolved)";

/// Vote counts per candidate display name, derived from the ledger on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    /// When the ledger was read.
    pub computed_at: DateTime<Utc>,
    /// Votes per resolved display name. Names with no votes are absent.
    counts: BTreeMap<String, u64>,
    /// Votes for candidate ids that did not resolve.
    unresolved: u64,
}

impl TallyResult {
    /// An empty tally stamped with the current time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(computed_at: DateTime<Utc>) -> Self {
        Self {
            computed_at,
            counts: BTreeMap::new(),
            unresolved: 0,
        }
    }

    /// Count one vote for the given display name.
    pub fn record(&mut self, display_name: String) {
        *self.counts.entry(display_name).or_default() += 1;
    }

    /// Count one vote that could not be attributed to a known candidate.
    pub fn record_unresolved(&mut self) {
        self.unresolved += 1;
    }

    /// Votes for the given display name (zero if none).
    pub fn count_for(&self, display_name: &str) -> u64 {
        self.counts.get(display_name).copied().unwrap_or(0)
    }

    pub fn unresolved(&self) -> u64 {
        self.unresolved
    }

    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    /// Sum over every bucket, unresolved included.
    pub fn total(&self) -> u64 {
        self.counts.values().sum::<u64>() + self.unresolved
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Rows ordered by descending count, then by name. The unresolved bucket,
    /// if non-empty, always comes last.
    pub fn ranked(&self) -> Vec<TallyRow> {
        let mut rows = self
            .counts
            .iter()
            .map(|(name, &votes)| TallyRow {
                label: TallyLabel::Candidate(name.clone()),
                votes,
            })
            .collect::<Vec<_>>();
        // The map is already sorted by name and the sort is stable.
        rows.sort_by(|a, b| b.votes.cmp(&a.votes));
        if self.unresolved > 0 {
            rows.push(TallyRow {
                label: TallyLabel::Unresolved,
                votes: self.unresolved,
            });
        }
        rows
    }
}

impl Default for TallyResult {
    fn default() -> Self {
        Self::new()
    }
}

/// What a tally row counts votes for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TallyLabel {
    Candidate(String),
    Unresolved,
}

impl Display for TallyLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Candidate(name) => write!(f, "{name}"),
            Self::Unresolved => write!(f, "{UNRESOLVED_LABEL}"),
        }
    }
}

/// One line of a ranked tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyRow {
    pub label: TallyLabel,
    pub votes: u64,
}

impl Display for TallyRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} vote{}",
            self.label,
            self.votes,
            if self.votes != 1 { "s" } else { "" }
        )
    }
}
