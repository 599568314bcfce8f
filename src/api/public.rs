use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::Result,
    model::{api::candidate::CandidateDescription, db::candidate::Candidate, mongodb::Coll},
};

pub fn routes() -> Vec<Route> {
    routes![get_candidates]
}

/// The candidate roster, tallies included. Public: registrants need it to
/// choose, and the tally is the published result. An empty roster is an
/// empty list, not an error.
#[get("/candidates")]
async fn get_candidates(candidates: Coll<Candidate>) -> Result<Json<Vec<CandidateDescription>>> {
    let candidates: Vec<Candidate> = candidates.find(None, None).await?.try_collect().await?;
    Ok(Json(
        candidates.into_iter().map(CandidateDescription::from).collect(),
    ))
}
