use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    db::candidate::{Candidate, NewCandidate},
    mongodb::Id,
};

/// Body of `POST /candidates` and `PUT /candidates/<id>`: the descriptive
/// fields of a roster entry. All fields are required to be non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub name: String,
    pub party: String,
    pub description: String,
}

impl CandidateSpec {
    /// Reject specs with blank descriptive fields.
    pub fn validated(self) -> Result<Self> {
        for (field, value) in [
            ("name", &self.name),
            ("party", &self.party),
            ("description", &self.description),
        ] {
            if value.trim().is_empty() {
                return Err(Error::BadRequest(format!(
                    "candidate {field} must not be empty"
                )));
            }
        }
        Ok(self)
    }
}

impl From<CandidateSpec> for NewCandidate {
    fn from(spec: CandidateSpec) -> Self {
        NewCandidate::new(spec.name, spec.party, spec.description)
    }
}

/// A roster entry as returned to clients, tally included.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDescription {
    pub id: Id,
    pub name: String,
    pub party: String,
    pub description: String,
    pub vote_count: i64,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.candidate.name,
            party: candidate.candidate.party,
            description: candidate.candidate.description,
            vote_count: candidate.candidate.vote_count,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_spec_passes() {
        assert!(CandidateSpec::example().validated().is_ok());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut spec = CandidateSpec::example();
        spec.party = "   ".to_string();
        assert!(spec.validated().is_err());

        let mut spec = CandidateSpec::example();
        spec.name = String::new();
        assert!(spec.validated().is_err());
    }

    #[test]
    fn description_carries_the_tally() {
        let mut candidate = Candidate::example();
        candidate.vote_count = 5;
        let id = candidate.id;
        let description = CandidateDescription::from(candidate);
        assert_eq!(description.id, id);
        assert_eq!(description.vote_count, 5);
    }
}
