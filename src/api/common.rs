use crate::error::{Error, Result};
use crate::model::{auth::AuthToken, db::voter::Voter, mongodb::Coll};

/// Re-derive the identity behind a token from the database.
///
/// A validly signed token whose identity no longer exists gets the generic
/// `Unauthorized`, the same as any other credential failure.
pub async fn voter_by_token<A>(token: &AuthToken<A>, voters: &Coll<Voter>) -> Result<Voter> {
    voters
        .find_one(token.id().as_doc(), None)
        .await?
        .ok_or(Error::Unauthorized)
}
