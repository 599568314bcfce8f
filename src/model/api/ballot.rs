use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Body of `POST /vote`: the candidate this identity is voting for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    #[serde(rename = "candidateID")]
    pub candidate_id: Id,
}

/// Acknowledgement of a recorded vote. Deliberately minimal: there is no
/// receipt or audit scheme, and the ledger itself is just the flag plus the
/// per-candidate tally.
#[derive(Debug, Serialize, Deserialize)]
pub struct VoteConfirmation {
    pub candidate: String,
}
