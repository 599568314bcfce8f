use std::marker::PhantomData;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::Status,
    request::{self, FromRequest},
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::db::voter::Voter;
use crate::model::mongodb::Id;

use super::user::{Actor, Registrant, Role};

/// An authentication token representing a specific identity with a specific
/// role. The type parameter is the minimum role a route requires; decoding
/// as `AuthToken<Administrator>` fails for a registrant-level token.
///
/// Tokens are stateless: validity is purely a function of the signature and
/// the expiry claim, so a token cannot be revoked before it expires. This is
/// a known limitation, accepted as a design choice.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthToken<A> {
    id: Id,
    #[serde(rename = "rol")]
    role: Role,
    #[serde(skip)]
    phantom: PhantomData<A>,
}

impl AuthToken<Registrant> {
    /// Issue a token for the given voter, carrying their stored role.
    pub fn for_voter(voter: &Voter) -> Self {
        Self {
            id: voter.id,
            role: voter.role,
            phantom: PhantomData,
        }
    }
}

impl<A> AuthToken<A> {
    /// The identity this token was issued for.
    pub fn id(&self) -> Id {
        self.id
    }

    /// The role this token carries.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Does this token permit actions requiring the given role?
    pub fn permits(&self, target: Role) -> bool {
        self.role >= target
    }

    /// Sign this token into its bearer string form, expiring `auth_ttl`
    /// from now.
    pub fn encode(self, config: &Config) -> String {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings")
    }

    /// Verify and decode a bearer string. Fails on a bad signature or an
    /// expired token.
    pub fn decode(token: &str, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims<A>>| claims.claims.token)?;
        Ok(token)
    }
}

/// Token claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims<A> {
    #[serde(flatten, bound = "")]
    token: AuthToken<A>,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r, A> FromRequest<'r> for AuthToken<A>
where
    A: Actor + Send,
{
    type Error = Error;

    /// Extract and verify a bearer token from the `Authorization` header,
    /// then check it carries sufficient rights for this route.
    ///
    /// The decoded token is the *only* channel through which the requesting
    /// identity reaches a handler; nothing is attached to ambient request
    /// state.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let bearer = match req
            .headers()
            .get_one("Authorization")
            .and_then(|header| header.strip_prefix("Bearer "))
        {
            Some(bearer) => bearer,
            None => {
                return request::Outcome::Failure((Status::Unauthorized, Error::Unauthorized));
            }
        };

        // A bad signature or expired token gets the same generic response
        // as a missing one.
        let token = match Self::decode(bearer, config) {
            Ok(token) => token,
            Err(_) => {
                return request::Outcome::Failure((Status::Unauthorized, Error::Unauthorized));
            }
        };

        if !token.permits(A::ROLE) {
            return request::Outcome::Failure((
                Status::Forbidden,
                Error::Forbidden(format!("route requires the {} role", A::ROLE)),
            ));
        }

        request::Outcome::Success(token)
    }
}
