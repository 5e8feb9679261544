use log::{debug, error, info, warn};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Orbit, Rocket,
};
use serde::Deserialize;

use crate::model::{cancel::Canceller, mongodb::ensure_indexes_exist, store::Store};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // secrets
    jwt_secret: String,
}

impl Config {
    /// Secret key used to verify caller JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        if config.jwt_secret.is_empty() {
            error!("`jwt_secret` must not be empty");
            return Err(rocket);
        }

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    /// Without a URI, records are kept in process memory only.
    #[serde(default)]
    db_uri: Option<String>,
    // non-secrets
    #[serde(default = "default_db_name")]
    db_name: String,
}

fn default_db_name() -> String {
    "surveys".to_string()
}

/// A fairing that loads the MongoDB config, connects to the database,
/// ensures its indexes, and places both a `Client` and the [`Store`] into
/// managed state.
///
/// If no `db_uri` is configured, an in-memory [`Store`] is managed instead.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite | Kind::Shutdown,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        let db_uri = match config.db_uri {
            Some(db_uri) => db_uri,
            None => {
                warn!("No `db_uri` configured, records will not outlive the process");
                return Ok(rocket.manage(Store::memory()));
            }
        };

        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&config.db_name);

        // Ensure the required indexes exist.
        if let Err(e) = ensure_indexes_exist(&db).await {
            error!("Failed to connect to database: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        // Manage the state.
        rocket = rocket.manage(client).manage(Store::mongo(&db));
        Ok(rocket)
    }

    async fn on_shutdown(&self, rocket: &Rocket<Orbit>) {
        if let Some(client) = rocket.state::<MongoClient>() {
            info!("Closing database connection");
            client.clone().shutdown().await;
        }
    }
}

/// A fairing that manages a [`Canceller`] and fires it when the server
/// begins shutting down, so in-flight operations stop issuing store calls.
pub struct CancellationFairing;

#[rocket::async_trait]
impl Fairing for CancellationFairing {
    fn info(&self) -> Info {
        Info {
            name: "Cancellation",
            kind: Kind::Ignite | Kind::Shutdown,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        Ok(rocket.manage(Canceller::new()))
    }

    async fn on_shutdown(&self, rocket: &Rocket<Orbit>) {
        if let Some(canceller) = rocket.state::<Canceller>() {
            debug!("Cancelling in-flight operations");
            canceller.cancel();
        }
    }
}


#[cfg(test)]
mod tests {
    use rocket::figment::{providers::Serialized, Figment};

    use super::*;

    #[test]
    fn db_config_defaults_to_memory() {
        let figment = Figment::from(Serialized::default("port", 8000));
        let config = figment.extract::<DbConfig>().unwrap();
        assert_eq!(None, config.db_uri);
        assert_eq!("surveys", config.db_name);
    }

    #[test]
    fn db_config_reads_uri_and_name() {
        let figment = Figment::from(Serialized::default("db_uri", "mongodb://localhost"))
            .merge(Serialized::default("db_name", "census"));
        let config = figment.extract::<DbConfig>().unwrap();
        assert_eq!(Some("mongodb://localhost".to_string()), config.db_uri);
        assert_eq!("census", config.db_name);
    }
}
