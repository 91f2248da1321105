use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::candidate::{CandidateList, CandidateRecord};

use super::{table_reader, CandidateRegistry};

/// The candidate list, read from a CSV file with columns `id, nom, prenom, classe, mot, image`.
#[derive(Debug, Clone)]
pub struct CsvCandidates {
    path: PathBuf,
}

impl CsvCandidates {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CandidateRegistry for CsvCandidates {
    fn list_candidates(&self) -> Result<CandidateList> {
        let mut reader = table_reader(&self.path)?;
        let mut candidates = Vec::new();
        for record in reader.deserialize::<CandidateRecord>() {
            candidates.push(record?);
        }
        debug!(
            "Loaded {} candidates from {}",
            candidates.len(),
            self.path.display()
        );
        Ok(candidates.into())
    }
}
