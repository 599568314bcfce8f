use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core candidate data, as stored in the database.
///
/// `vote_count` only ever moves via atomic `$inc` updates from the voting
/// endpoint; deleting a candidate never rewrites history elsewhere.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub name: String,
    pub party: String,
    pub description: String,
    pub vote_count: i64,
}

impl CandidateCore {
    pub fn new(name: String, party: String, description: String) -> Self {
        Self {
            name,
            party,
            description,
            vote_count: 0,
        }
    }
}

/// A candidate without an ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_candidates_start_with_no_votes() {
        assert_eq!(CandidateCore::example().vote_count, 0);
    }
}
