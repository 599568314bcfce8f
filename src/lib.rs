#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod mail;
pub mod model;

pub use config::Config;

use config::{AwsFairing, ConfigFairing, DatabaseFairing};
use logging::LoggerFairing;

/// Construct the rocket instance: all routes mounted at the root, plus the
/// ignite fairings that load config, connect to the database, and set up
/// the mail client. `ConfigFairing` must run before `DatabaseFairing`,
/// which reads the managed config for the admin bootstrap.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(AwsFairing)
        .attach(LoggerFairing)
}

/// Build a local client over a fully ignited rocket for route-level tests,
/// returning it together with a handle on its database.
///
/// Requires a running MongoDB instance at the `db_uri` from `Rocket.toml`.
/// In test builds every ignition picks a fresh randomly-named database, so
/// concurrent tests never see each other's data; each test drops its
/// database once its assertions pass.
#[cfg(test)]
pub(crate) async fn client_and_db() -> (rocket::local::asynchronous::Client, mongodb::Database) {
    let client = rocket::local::asynchronous::Client::tracked(build())
        .await
        .expect("failed to ignite; is MongoDB running?");
    let db = client
        .rocket()
        .state::<mongodb::Database>()
        .expect("database is managed after ignition")
        .clone();
    (client, db)
}
