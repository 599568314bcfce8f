use aws_sdk_sesv2::Client as SesClient;
use mongodb::bson::doc;
use rocket::{http::Status, serde::json::Json, Route, State};

use crate::{
    config::Config,
    error::{Error, Result},
    mail,
    model::{
        api::{
            auth::{LoginRequest, LoginResponse, RegisterRequest, VerifyOtpRequest},
            voter::VoterProfile,
        },
        auth::AuthToken,
        db::voter::{hash_password, normalize_email, NewVoter, Voter},
        mongodb::{is_duplicate_key_error, Coll, Id},
        otp::Code,
    },
};

pub fn routes() -> Vec<Route> {
    routes![register, verify_otp, login]
}

/// Minimum clear-password length accepted at registration.
const MIN_PASSWORD_LENGTH: usize = 8;

#[post("/register", data = "<request>", format = "json")]
async fn register(
    request: Json<RegisterRequest>,
    voters: Coll<Voter>,
    new_voters: Coll<NewVoter>,
    sender: &State<SesClient>,
    config: &State<Config>,
) -> Result<(Status, Json<VoterProfile>)> {
    let request = request.into_inner();
    let email = normalize_email(&request.email);

    if request.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    // Friendly uniqueness check; the uniqueness indexes still backstop the
    // race between this check and the insert below.
    let duplicate = doc! {
        "$or": [
            { "email": &email },
            { "voter_id": &request.voter_id },
        ]
    };
    if voters.find_one(duplicate, None).await?.is_some() {
        return Err(Error::Conflict(
            "email or voter ID already registered".to_string(),
        ));
    }

    // Deliver the code before persisting anything: if delivery fails, no
    // identity record survives and the registrant simply retries.
    let code = Code::random();
    mail::send(
        sender,
        config.mail_from(),
        &email,
        "Your NzaVote verification code",
        &format!("Your verification code is: {code}"),
    )
    .await?;

    let voter = NewVoter::unverified(
        request.first_name,
        request.last_name,
        &email,
        request.voter_id,
        hash_password(&request.password, config)?,
        request.date_of_birth,
        code,
    );
    let new_id: Id = match new_voters.insert_one(&voter, None).await {
        Ok(inserted) => inserted
            .inserted_id
            .as_object_id()
            .unwrap() // Safe because the ID comes directly from the database.
            .into(),
        Err(err) if is_duplicate_key_error(&err) => {
            return Err(Error::Conflict(
                "email or voter ID already registered".to_string(),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    let voter = voters
        .find_one(new_id.as_doc(), None)
        .await?
        .expect("freshly inserted voter exists");
    Ok((Status::Created, Json(VoterProfile::from(&voter))))
}

#[post("/verify-otp", data = "<request>", format = "json")]
async fn verify_otp(request: Json<VerifyOtpRequest>, voters: Coll<Voter>) -> Result<()> {
    // A syntactically invalid code can never match any stored code, so it
    // is rejected before the lookup, whether or not the email resolves.
    let submitted: Code = request.otp.parse().map_err(|_| Error::InvalidCode)?;

    let email = normalize_email(&request.email);
    let voter = voters
        .find_one(doc! { "email": &email }, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("no voter registered as {email}")))?;

    // The pending code ceases to exist on first success, so a replay of a
    // consumed code lands here.
    let pending = match voter.otp {
        Some(pending) => pending,
        None if voter.verified => return Err(Error::AlreadyVerified),
        None => return Err(Error::InvalidCode),
    };

    // `Code` equality is constant time.
    if pending != submitted {
        return Err(Error::InvalidCode);
    }

    // Consume the code atomically: the filter re-asserts the unverified
    // state, so two concurrent submissions cannot both succeed.
    let consume = doc! {
        "_id": voter.id,
        "verified": false,
        "otp": submitted.to_string(),
    };
    let update = doc! {
        "$set": { "verified": true },
        "$unset": { "otp": "" },
    };
    voters
        .find_one_and_update(consume, update, None)
        .await?
        .ok_or(Error::AlreadyVerified)?;

    Ok(())
}

#[post("/login", data = "<request>", format = "json")]
async fn login(
    request: Json<LoginRequest>,
    voters: Coll<Voter>,
    config: &State<Config>,
) -> Result<Json<LoginResponse>> {
    // Unknown email and wrong password take the same path out: the response
    // must not reveal which one it was.
    let voter = voters
        .find_one(doc! { "email": normalize_email(&request.email) }, None)
        .await?
        .filter(|voter| voter.verify_password(&request.password))
        .ok_or(Error::Unauthorized)?;

    let token = AuthToken::for_voter(&voter).encode(config);
    Ok(Json(LoginResponse {
        token,
        voter: VoterProfile::from(&voter),
    }))
}

#[cfg(test)]
mod tests {
    use rocket::http::ContentType;
    use rocket::local::asynchronous::Client;
    use rocket::serde::json::serde_json::{self, json, Value};

    use super::*;

    /// Register the example voter through the endpoint.
    async fn register_example(client: &Client) -> Status {
        client
            .post(uri!(register))
            .header(ContentType::JSON)
            .body(json!(RegisterRequest::example()).to_string())
            .dispatch()
            .await
            .status()
    }

    #[rocket::async_test]
    async fn duplicate_registration_creates_no_record() {
        let (client, db) = crate::client_and_db().await;
        let voters = Coll::<Voter>::from_db(&db);

        assert_eq!(Status::Created, register_example(&client).await);
        // The same email and voter ID again.
        assert_eq!(Status::BadRequest, register_example(&client).await);

        // A fresh email with a clashing voter ID.
        let mut request = RegisterRequest::example();
        request.email = "sibusiso.nkosi@example.com".to_string();
        let response = client
            .post(uri!(register))
            .header(ContentType::JSON)
            .body(json!(request).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());

        // Exactly one record survives and the rejected attempts left nothing.
        assert_eq!(
            1,
            voters
                .count_documents(doc! { "email": "amahle.dlamini@example.com" }, None)
                .await
                .unwrap()
        );
        assert_eq!(
            0,
            voters
                .count_documents(doc! { "email": "sibusiso.nkosi@example.com" }, None)
                .await
                .unwrap()
        );

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    async fn consumed_code_cannot_be_replayed() {
        let (client, db) = crate::client_and_db().await;
        let voters = Coll::<Voter>::from_db(&db);

        assert_eq!(Status::Created, register_example(&client).await);
        let voter = voters
            .find_one(doc! { "email": "amahle.dlamini@example.com" }, None)
            .await
            .unwrap()
            .unwrap();
        let code = voter.otp.unwrap().to_string();
        let body = json!({ "email": "amahle.dlamini@example.com", "otp": &code }).to_string();

        let response = client
            .post(uri!(verify_otp))
            .header(ContentType::JSON)
            .body(&body)
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let voter = voters
            .find_one(doc! { "email": "amahle.dlamini@example.com" }, None)
            .await
            .unwrap()
            .unwrap();
        assert!(voter.verified);
        assert!(voter.otp.is_none());

        // The code was consumed; submitting it a second time must fail.
        let response = client
            .post(uri!(verify_otp))
            .header(ContentType::JSON)
            .body(&body)
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    async fn wrong_code_is_rejected() {
        let (client, db) = crate::client_and_db().await;
        let voters = Coll::<Voter>::from_db(&db);

        assert_eq!(Status::Created, register_example(&client).await);
        let voter = voters
            .find_one(doc! { "email": "amahle.dlamini@example.com" }, None)
            .await
            .unwrap()
            .unwrap();
        let code = voter.otp.unwrap().to_string();
        let wrong = format!(
            "{}{}",
            if code.starts_with('9') { "0" } else { "9" },
            &code[1..]
        );

        let response = client
            .post(uri!(verify_otp))
            .header(ContentType::JSON)
            .body(json!({ "email": "amahle.dlamini@example.com", "otp": wrong }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());

        let voter = voters
            .find_one(doc! { "email": "amahle.dlamini@example.com" }, None)
            .await
            .unwrap()
            .unwrap();
        assert!(!voter.verified);
        assert!(voter.otp.is_some());

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    async fn malformed_codes_are_bad_requests() {
        let (client, db) = crate::client_and_db().await;

        // Wrong length, non-digits, empty: all map to 400, even without a
        // matching registration.
        for bad in ["12345", "1234567", "12a456", ""] {
            let response = client
                .post(uri!(verify_otp))
                .header(ContentType::JSON)
                .body(json!({ "email": "nobody@example.com", "otp": bad }).to_string())
                .dispatch()
                .await;
            assert_eq!(Status::BadRequest, response.status());
        }

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    async fn unknown_email_is_not_found() {
        let (client, db) = crate::client_and_db().await;

        let response = client
            .post(uri!(verify_otp))
            .header(ContentType::JSON)
            .body(json!({ "email": "nobody@example.com", "otp": "123456" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    async fn login_failures_are_indistinguishable() {
        let (client, db) = crate::client_and_db().await;
        assert_eq!(Status::Created, register_example(&client).await);

        let wrong_password = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(
                json!({ "email": "amahle.dlamini@example.com", "password": "hunter2hunter3" })
                    .to_string(),
            )
            .dispatch()
            .await;
        let unknown_email = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(
                json!({ "email": "nobody@example.com", "password": "hunter2hunter2" })
                    .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(Status::Unauthorized, wrong_password.status());
        assert_eq!(Status::Unauthorized, unknown_email.status());
        assert_eq!(
            wrong_password.into_string().await,
            unknown_email.into_string().await
        );

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    async fn login_returns_token_and_profile() {
        let (client, db) = crate::client_and_db().await;
        assert_eq!(Status::Created, register_example(&client).await);

        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(
                json!({ "email": "Amahle.Dlamini@example.com", "password": "hunter2hunter2" })
                    .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let body: Value = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(!body["token"].as_str().unwrap().is_empty());
        assert_eq!(body["voter"]["email"], "amahle.dlamini@example.com");
        assert!(body["voter"].get("passwordHash").is_none());
        assert!(body["voter"].get("otp").is_none());

        db.drop(None).await.unwrap();
    }
}
