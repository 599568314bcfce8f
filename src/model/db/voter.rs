use std::ops::{Deref, DerefMut};

use chrono::NaiveDate;
use mongodb::bson::{doc, DateTime};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::model::{auth::Role, mongodb::Coll, mongodb::Id, otp::Code};

/// Core voter data, as stored in the database.
///
/// Invariants enforced across the crate: `email` and `voter_id` are globally
/// unique (uniqueness indexes), `has_voted` implies `verified` (the vote
/// filter requires `verified: true`), and `otp` is present only while
/// unverified (removed atomically by the verification update).
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    pub first_name: String,
    pub last_name: String,
    /// Always stored lowercase; see [`normalize_email`].
    pub email: String,
    /// The external (government-issued) voter ID.
    pub voter_id: String,
    /// Argon2-encoded. The clear password never touches the database or the
    /// logs.
    pub password_hash: String,
    pub date_of_birth: NaiveDate,
    pub verified: bool,
    pub has_voted: bool,
    pub role: Role,
    /// The pending one-time code. Absent (not null) once verified, so a
    /// consumed code is unreadable as well as unusable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<Code>,
    pub created_at: DateTime,
}

impl VoterCore {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // A malformed stored hash counts as a mismatch rather than an error;
        // the login response must stay generic either way.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

impl NewVoter {
    /// Build a fresh, unverified registrant with a pending code.
    #[allow(clippy::too_many_arguments)]
    pub fn unverified(
        first_name: String,
        last_name: String,
        email: &str,
        voter_id: String,
        password_hash: String,
        date_of_birth: NaiveDate,
        code: Code,
    ) -> Self {
        Self {
            first_name,
            last_name,
            email: normalize_email(email),
            voter_id,
            password_hash,
            date_of_birth,
            verified: false,
            has_voted: false,
            role: Role::Registrant,
            otp: Some(code),
            created_at: DateTime::now(),
        }
    }
}

/// A voter from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

/// Canonical form of an email address: trimmed and lowercased. Lookups and
/// stored values must both go through this so the uniqueness index holds.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Hash a password for storage, with a fresh random salt and the configured
/// work factor.
pub fn hash_password(password: &str, config: &Config) -> Result<String> {
    let salt: [u8; 16] = rand::random();
    let argon2_config = argon2::Config {
        time_cost: config.hash_cost(),
        ..argon2::Config::default()
    };
    Ok(argon2::hash_encoded(
        password.as_bytes(),
        &salt,
        &argon2_config,
    )?)
}

/// Ensure there is at least one administrator account, creating one from the
/// configured credentials on a fresh database. Idempotent.
pub async fn ensure_admin_exists(voters: &Coll<NewVoter>, config: &Config) -> Result<()> {
    let any_admin = doc! { "role": Role::Administrator as i32 };
    if voters.find_one(any_admin, None).await?.is_some() {
        return Ok(());
    }

    info!("No administrator found, creating the bootstrap account");
    let admin = VoterCore {
        first_name: "System".to_string(),
        last_name: "Administrator".to_string(),
        email: normalize_email(config.admin_email()),
        voter_id: "ADMIN-BOOTSTRAP".to_string(),
        password_hash: hash_password(config.admin_password(), config)?,
        date_of_birth: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
        verified: true,
        has_voted: false,
        role: Role::Administrator,
        otp: None,
        created_at: DateTime::now(),
    };
    voters.insert_one(admin, None).await?;
    Ok(())
}
