use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use mongodb::error::{Error as DbError, ErrorKind as DbErrorKind};
use rocket::{http::Status, response::Responder};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the core can surface to the HTTP shell.
///
/// Variants carry human-readable detail for the logs; the detail is never
/// included in a response body, so messages may reference internal state but
/// must never contain passwords, codes, or tokens.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid verification code")]
    InvalidCode,
    #[error("Account is already verified")]
    AlreadyVerified,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Failed to deliver notification: {0}")]
    DeliveryFailed(String),
    #[error("Backend unavailable: {0}")]
    Unavailable(DbError),
    #[error(transparent)]
    Db(DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] argon2::Error),
}

impl Error {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> Status {
        match self {
            // The source contract reports uniqueness violations as 400.
            Self::Conflict(_) | Self::BadRequest(_) => Status::BadRequest,
            Self::InvalidCode | Self::AlreadyVerified => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
            Self::Unauthorized => Status::Unauthorized,
            Self::Forbidden(_) => Status::Forbidden,
            Self::DeliveryFailed(_) => Status::InternalServerError,
            Self::Unavailable(_) => Status::ServiceUnavailable,
            Self::Db(_) => Status::InternalServerError,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
            Self::Argon2(_) => Status::InternalServerError,
        }
    }
}

/// Driver failures that mean the backend could not be reached in time are
/// retryable and get their own variant; everything else is internal.
impl From<DbError> for Error {
    fn from(err: DbError) -> Self {
        match *err.kind {
            DbErrorKind::ServerSelection { .. } | DbErrorKind::Io(_) => Self::Unavailable(err),
            _ => Self::Db(err),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        match status.code {
            500..=599 => error!("{self}"),
            _ => warn!("{self}"),
        }
        Err(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_contract_statuses() {
        assert_eq!(
            Error::Conflict("duplicate email".into()).status(),
            Status::BadRequest
        );
        assert_eq!(Error::InvalidCode.status(), Status::BadRequest);
        assert_eq!(Error::AlreadyVerified.status(), Status::BadRequest);
        assert_eq!(Error::not_found("candidate").status(), Status::NotFound);
        assert_eq!(Error::Unauthorized.status(), Status::Unauthorized);
        assert_eq!(
            Error::Forbidden("already voted".into()).status(),
            Status::Forbidden
        );
        assert_eq!(
            Error::DeliveryFailed("smtp".into()).status(),
            Status::InternalServerError
        );
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let err = Error::Jwt(JwtError::from(JwtErrorKind::ExpiredSignature));
        assert_eq!(err.status(), Status::Unauthorized);
        let err = Error::Jwt(JwtError::from(JwtErrorKind::InvalidToken));
        assert_eq!(err.status(), Status::BadRequest);
    }
}
