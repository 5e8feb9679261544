#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{CancellationFairing, ConfigFairing, DatabaseFairing};
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod service;

/// Assemble the server: routes, configuration, the store and lifecycle
/// fairings. Nothing connects until the rocket is ignited.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(CancellationFairing)
        .attach(DatabaseFairing)
}

/// A server over the given store, skipping the database fairing.
#[cfg(test)]
pub(crate) fn rocket_for_store(store: model::store::Store) -> Rocket<Build> {
    use rocket::figment::providers::Serialized;

    let figment = rocket::Config::figment().merge(Serialized::default(
        "jwt_secret",
        String::from_utf8_lossy(config::Config::example().jwt_secret()).into_owned(),
    ));
    rocket::custom(figment)
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(CancellationFairing)
        .manage(store)
}
