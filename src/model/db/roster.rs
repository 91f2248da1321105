use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::voter::{VoterClaim, VoterRecord};

use super::{table_reader, IdentityStore};

/// The voter roster, read from a CSV file with columns `id, nom, prenom, cnib`.
#[derive(Debug, Clone)]
pub struct CsvRoster {
    path: PathBuf,
}

impl CsvRoster {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record in the roster.
    pub fn voters(&self) -> Result<Vec<VoterRecord>> {
        let mut reader = table_reader(&self.path)?;
        let mut voters = Vec::new();
        for record in reader.deserialize() {
            voters.push(record?);
        }
        Ok(voters)
    }

    /// Look for a record matching the claim. Duplicate ids are allowed; any match wins.
    ///
    /// The whole roster is parsed first, so one bad row fails every lookup
    /// rather than only those for voters listed after it.
    fn find(&self, claim: &VoterClaim) -> Result<bool> {
        Ok(self.voters()?.iter().any(|voter| voter.matches(claim)))
    }
}

impl IdentityStore for CsvRoster {
    fn lookup(&self, claim: &VoterClaim) -> bool {
        match self.find(claim) {
            Ok(found) => found,
            Err(err) => {
                warn!("Voter roster {} is unreadable: {err}", self.path.display());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    const ROSTER: &str = "\
id,nom,prenom,cnib,filiere
7,Kone,Awa,Z9,L3 Info
12,dao,awa,X1,M1 Maths
12,Zongo,Ali,Q3,M2 Physique
";

    fn roster_in(dir: &TempDir, contents: &str) -> CsvRoster {
        let path = dir.path().join("voters.csv");
        fs::write(&path, contents).unwrap();
        CsvRoster::new(path)
    }

    #[test]
    fn lookup_matches() {
        let dir = TempDir::new().unwrap();
        let roster = roster_in(&dir, ROSTER);

        assert!(roster.lookup(&VoterClaim::example()));
        assert!(roster.lookup(&VoterClaim::example2()));
        // Duplicate id: the second row for id 12 matches too.
        assert!(roster.lookup(&VoterClaim::new("12", "ZONGO", "ali", "Q3")));
        assert!(!roster.lookup(&VoterClaim::new("12", "Zongo", "Ali", "X1")));
        assert!(!roster.lookup(&VoterClaim::new("99", "Kone", "Awa", "Z9")));
    }

    #[test]
    fn lookup_ignores_padding() {
        let dir = TempDir::new().unwrap();
        let roster = roster_in(&dir, "id, nom, prenom, cnib\n 7 , Kone ,Awa, Z9\n");
        assert!(roster.lookup(&VoterClaim::example()));
    }

    #[test]
    fn unreadable_roster_matches_nobody() {
        let dir = TempDir::new().unwrap();
        let missing = CsvRoster::new(dir.path().join("missing.csv"));
        assert!(!missing.lookup(&VoterClaim::example()));

        // Wrong columns entirely.
        let corrupt = roster_in(&dir, "a,b\n1,2\n");
        assert!(!corrupt.lookup(&VoterClaim::example()));
    }

    #[test]
    fn bad_row_matches_nobody() {
        let dir = TempDir::new().unwrap();
        let roster = roster_in(
            &dir,
            "id,nom,prenom,cnib\n7,Kone,Awa,Z9\n8,Bad\n12,Dao,Awa,X1\n",
        );
        assert!(!roster.lookup(&VoterClaim::example()));
        assert!(!roster.lookup(&VoterClaim::example2()));
        assert!(roster.voters().is_err());
    }

    #[test]
    fn list_voters() {
        let dir = TempDir::new().unwrap();
        let roster = roster_in(&dir, ROSTER);
        let voters = roster.voters().unwrap();
        assert_eq!(voters.len(), 3);
        assert_eq!(voters[0], VoterRecord::example());
    }
}
