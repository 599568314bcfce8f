use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{db::voter::Voter, mongodb::Id};

/// The externally visible fields of a voter, returned on login and by the
/// administrative listing. Constructed only via `From<&Voter>`, which is the
/// single point guaranteeing the password hash and any pending code stay
/// out of responses.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterProfile {
    pub id: Id,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(rename = "voterID")]
    pub voter_id: String,
    pub date_of_birth: NaiveDate,
    pub verified: bool,
    pub has_voted: bool,
    pub role: String,
}

impl From<&Voter> for VoterProfile {
    fn from(voter: &Voter) -> Self {
        Self {
            id: voter.id,
            first_name: voter.first_name.clone(),
            last_name: voter.last_name.clone(),
            email: voter.email.clone(),
            voter_id: voter.voter_id.clone(),
            date_of_birth: voter.date_of_birth,
            verified: voter.verified,
            has_voted: voter.has_voted,
            role: voter.role.to_string(),
        }
    }
}
