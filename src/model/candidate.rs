use serde::{Deserialize, Serialize};

/// A row of the candidate list: `id, nom, prenom, classe, mot, image`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: String,
    #[serde(rename = "nom")]
    pub last_name: String,
    #[serde(rename = "prenom")]
    pub first_name: String,
    #[serde(rename = "classe")]
    pub class_label: String,
    #[serde(rename = "mot")]
    pub slogan: String,
    /// Path to a portrait. Only the presentation layer looks at this.
    #[serde(rename = "image", default)]
    pub image_reference: String,
}

impl CandidateRecord {
    /// Name used to group votes in the tally: last name, a space, first name.
    pub fn display_name(&self) -> String {
        display_name(&self.last_name, &self.first_name)
    }

    /// Two-line label shown next to the candidate on the ballot.
    pub fn ballot_label(&self) -> String {
        format!(
            "{} - {}\n{}",
            self.display_name(),
            self.class_label,
            self.slogan
        )
    }
}

pub fn display_name(last_name: &str, first_name: &str) -> String {
    format!("{last_name} {first_name}")
}

/// A snapshot of the candidate registry, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateList {
    candidates: Vec<CandidateRecord>,
}

impl CandidateList {
    pub fn new(candidates: Vec<CandidateRecord>) -> Self {
        Self { candidates }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateRecord> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, candidate_id: &str) -> Option<&CandidateRecord> {
        self.candidates.iter().find(|c| c.id == candidate_id)
    }

    /// Look up `(last_name, first_name)` for a candidate id. `None` if no such candidate.
    pub fn resolve_name(&self, candidate_id: &str) -> Option<(&str, &str)> {
        self.get(candidate_id)
            .map(|c| (c.last_name.as_str(), c.first_name.as_str()))
    }

    pub fn into_inner(self) -> Vec<CandidateRecord> {
        self.candidates
    }
}

impl From<Vec<CandidateRecord>> for CandidateList {
    fn from(candidates: Vec<CandidateRecord>) -> Self {
        Self::new(candidates)
    }
}

impl<'a> IntoIterator for &'a CandidateList {
    type Item = &'a CandidateRecord;
    type IntoIter = std::slice::Iter<'a, CandidateRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_name() {
        let list = CandidateList::example();
        assert_eq!(list.resolve_name("c1"), Some(("Traore", "Issa")));
        assert_eq!(list.resolve_name("c2"), Some(("Sawadogo", "Mariam")));
        assert_eq!(list.resolve_name("c3"), None);
        assert_eq!(list.resolve_name(""), None);
    }

    #[test]
    fn labels() {
        let candidate = CandidateRecord::example1();
        assert_eq!(candidate.display_name(), "Traore Issa");
        assert_eq!(
            candidate.ballot_label(),
            "Traore Issa - L3 Info\nUne voix pour tous"
        );
    }
}
