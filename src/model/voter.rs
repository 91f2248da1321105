use serde::{Deserialize, Serialize};

/// A row of the voter roster.
///
/// Column names follow the roster files already in use: `id, nom, prenom, cnib`.
/// Any further columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub id: String,
    #[serde(rename = "nom")]
    pub last_name: String,
    #[serde(rename = "prenom")]
    pub first_name: String,
    #[serde(rename = "cnib")]
    pub national_id: String,
}

/// An identity assertion submitted by someone who wants to vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterClaim {
    pub id: String,
    pub last_name: String,
    pub first_name: String,
    pub national_id: String,
}

impl VoterClaim {
    pub fn new(
        id: impl Into<String>,
        last_name: impl Into<String>,
        first_name: impl Into<String>,
        national_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            last_name: last_name.into(),
            first_name: first_name.into(),
            national_id: national_id.into(),
        }
    }
}

impl VoterRecord {
    /// Does this record back up the given claim?
    ///
    /// Ids and national ids must match exactly; names are compared case-insensitively.
    pub fn matches(&self, claim: &VoterClaim) -> bool {
        self.id == claim.id
            && self.national_id == claim.national_id
            && self.last_name.to_lowercase() == claim.last_name.to_lowercase()
            && self.first_name.to_lowercase() == claim.first_name.to_lowercase()
    }
}

/// Example data for tests.
#[cfg(test)]
pub(crate) mod examples {
    use super::*;

    impl VoterRecord {
        pub fn example() -> Self {
            Self {
                id: "7".to_string(),
                last_name: "Kone".to_string(),
                first_name: "Awa".to_string(),
                national_id: "Z9".to_string(),
            }
        }

        pub fn example2() -> Self {
            Self {
                id: "12".to_string(),
                last_name: "dao".to_string(),
                first_name: "awa".to_string(),
                national_id: "X1".to_string(),
            }
        }

        pub fn example3() -> Self {
            Self {
                id: "21".to_string(),
                last_name: "Ouédraogo".to_string(),
                first_name: "Éric".to_string(),
                national_id: "B4417".to_string(),
            }
        }
    }

    impl VoterClaim {
        pub fn example() -> Self {
            Self::new("7", "Kone", "Awa", "Z9")
        }

        pub fn example2() -> Self {
            Self::new("12", "Dao", "Awa", "X1")
        }
    }
}
