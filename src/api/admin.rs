use mongodb::bson::doc;
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            candidate::{CandidateDescription, CandidateSpec},
            voter::VoterProfile,
        },
        auth::{Administrator, AuthToken},
        db::{
            candidate::{Candidate, NewCandidate},
            voter::Voter,
        },
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_users, create_candidate, update_candidate, delete_candidate]
}

/// List every registrant. Administrator-only: the listing exposes emails and
/// voter IDs, and only the public profile fields even then.
#[get("/users")]
async fn get_users(
    _token: AuthToken<Administrator>,
    voters: Coll<Voter>,
) -> Result<Json<Vec<VoterProfile>>> {
    let voters: Vec<Voter> = voters.find(None, None).await?.try_collect().await?;
    Ok(Json(voters.iter().map(VoterProfile::from).collect()))
}

#[post("/candidates", data = "<spec>", format = "json")]
async fn create_candidate(
    _token: AuthToken<Administrator>,
    spec: Json<CandidateSpec>,
    new_candidates: Coll<NewCandidate>,
    candidates: Coll<Candidate>,
) -> Result<(Status, Json<CandidateDescription>)> {
    let candidate: NewCandidate = spec.into_inner().validated()?.into();
    let new_id: Id = new_candidates
        .insert_one(&candidate, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Safe because the ID comes directly from the database.
        .into();

    let candidate = candidates
        .find_one(new_id.as_doc(), None)
        .await?
        .expect("freshly inserted candidate exists");
    Ok((Status::Created, Json(candidate.into())))
}

/// Replace a candidate's descriptive fields. The tally is deliberately not
/// touched: it only ever moves via the voting endpoint.
#[put("/candidates/<id>", data = "<spec>", format = "json")]
async fn update_candidate(
    _token: AuthToken<Administrator>,
    id: Id,
    spec: Json<CandidateSpec>,
    candidates: Coll<Candidate>,
) -> Result<Json<CandidateDescription>> {
    let spec = spec.into_inner().validated()?;
    let update = doc! {
        "$set": {
            "name": &spec.name,
            "party": &spec.party,
            "description": &spec.description,
        }
    };
    let result = candidates.update_one(id.as_doc(), update, None).await?;
    if result.matched_count == 0 {
        return Err(Error::not_found(format!("candidate {id}")));
    }

    let candidate = candidates
        .find_one(id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("candidate {id}")))?;
    Ok(Json(candidate.into()))
}

/// Remove a candidate from the roster. Historical state is untouched: votes
/// already tallied are not redistributed and no voter's flag is reset.
#[delete("/candidates/<id>")]
async fn delete_candidate(
    _token: AuthToken<Administrator>,
    id: Id,
    candidates: Coll<Candidate>,
) -> Result<()> {
    let result = candidates.delete_one(id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!("candidate {id}")));
    }
    Ok(())
}
