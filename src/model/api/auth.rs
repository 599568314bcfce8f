use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::api::voter::VoterProfile;

/// Body of `POST /register`. Field names follow the public API contract.
///
/// Deliberately no `Debug` derive: the clear password must never end up in
/// a log line by accident.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub date_of_birth: NaiveDate,
    #[serde(rename = "voterID")]
    pub voter_id: String,
}

/// Body of `POST /verify-otp`.
///
/// The code is accepted as a raw string and parsed in the handler: a
/// malformed submission is an invalid code (400), not a deserialization
/// failure.
#[derive(Clone, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Body of `POST /login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login: the bearer token plus the public identity fields.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub voter: VoterProfile,
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl RegisterRequest {
        pub fn example() -> Self {
            Self {
                first_name: "Amahle".to_string(),
                last_name: "Dlamini".to_string(),
                email: "Amahle.Dlamini@example.com".to_string(),
                password: "hunter2hunter2".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1988, 1, 1).unwrap(),
                voter_id: "ZA-19880101-0042".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json::{from_value, json, to_value};

    use super::*;

    #[test]
    fn register_request_follows_the_contract() {
        let body = json!({
            "firstName": "Amahle",
            "lastName": "Dlamini",
            "email": "Amahle.Dlamini@example.com",
            "password": "hunter2hunter2",
            "dateOfBirth": "1988-01-01",
            "voterID": "ZA-19880101-0042",
        });
        let request: RegisterRequest = from_value(body.clone()).unwrap();
        assert_eq!(request.voter_id, "ZA-19880101-0042");
        assert_eq!(
            request.date_of_birth,
            NaiveDate::from_ymd_opt(1988, 1, 1).unwrap()
        );
        assert_eq!(to_value(RegisterRequest::example()).unwrap(), body);
    }
}
