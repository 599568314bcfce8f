use mongodb::bson::doc;
use rocket::{serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::ballot::{VoteConfirmation, VoteRequest},
        auth::{AuthToken, Registrant},
        db::{candidate::Candidate, voter::Voter},
        mongodb::Coll,
    },
};

use super::common::voter_by_token;

pub fn routes() -> Vec<Route> {
    routes![cast_vote]
}

/// Record this identity's one vote.
///
/// The whole one-vote-per-identity guarantee hangs on a single conditional
/// update: "set `has_voted` where it is currently false". Any number of
/// concurrent requests for the same identity race through the same filter
/// and the database lets exactly one of them match; everyone else is told
/// they have already voted. The check-then-set is never split across two
/// operations.
#[post("/vote", data = "<request>", format = "json")]
async fn cast_vote(
    token: AuthToken<Registrant>,
    request: Json<VoteRequest>,
    voters: Coll<Voter>,
    candidates: Coll<Candidate>,
) -> Result<Json<VoteConfirmation>> {
    let candidate_id = request.candidate_id;

    // Resolve the candidate up front so an unknown ID fails before any
    // state moves.
    let candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("candidate {candidate_id}")))?;

    // Atomically claim this identity's vote.
    let claim = doc! {
        "_id": token.id(),
        "verified": true,
        "has_voted": false,
    };
    let flag = doc! {
        "$set": { "has_voted": true }
    };
    if voters.find_one_and_update(claim, flag, None).await?.is_none() {
        // The claim failed; fetch the voter to say why.
        let voter = voter_by_token(&token, &voters).await?;
        return Err(if !voter.verified {
            Error::Forbidden("you must verify your account before voting".to_string())
        } else {
            Error::Forbidden("you have already cast your vote".to_string())
        });
    }

    // Tally the vote. If the candidate was deleted between the lookup above
    // and this increment, release the claim so the registrant can vote for
    // someone who still exists.
    let increment = doc! {
        "$inc": { "vote_count": 1 }
    };
    if candidates
        .find_one_and_update(candidate_id.as_doc(), increment, None)
        .await?
        .is_none()
    {
        let release = doc! {
            "$set": { "has_voted": false }
        };
        voters
            .update_one(token.id().as_doc(), release, None)
            .await?;
        return Err(Error::not_found(format!("candidate {candidate_id}")));
    }

    Ok(Json(VoteConfirmation {
        candidate: candidate.name.clone(),
    }))
}
