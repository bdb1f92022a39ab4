use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::error::Result;
use crate::model::{
    persistence::{FilePersistence, MemoryPersistence, Persistence},
    store::{CampaignStore, StorePolicy},
};

fn default_true() -> bool {
    true
}

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // non-secrets
    pub(crate) auth_ttl: u32,
    #[serde(default = "default_true")]
    pub(crate) enforce_open_state: bool,
    #[serde(default)]
    pub(crate) finalize_from_disabled: bool,
    #[serde(default = "default_true")]
    pub(crate) protect_voted_candidates: bool,
    #[serde(default = "default_true")]
    pub(crate) seed_example: bool,
    // secrets
    pub(crate) jwt_secret: String,
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key shared with the identity provider, used to verify JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Whether to create the example campaign in an empty store.
    pub fn seed_example(&self) -> bool {
        self.seed_example
    }

    /// Business rules for the campaign store.
    pub fn policy(&self) -> StorePolicy {
        StorePolicy {
            enforce_open_state: self.enforce_open_state,
            finalize_from_disabled: self.finalize_from_disabled,
            protect_voted_candidates: self.protect_voted_candidates,
        }
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

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Where the campaign collection lives between restarts.
/// Read from the `persistence` table of the config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PersistenceConfig {
    /// Nothing survives a restart.
    Memory,
    /// A single JSON file.
    File { path: PathBuf },
    /// A MongoDB database.
    #[cfg(feature = "mongodb-store")]
    Mongodb {
        db_uri: String,
        #[serde(default = "default_db_name")]
        db_name: String,
    },
}

#[cfg(feature = "mongodb-store")]
fn default_db_name() -> String {
    "ballotbox".to_string()
}

impl PersistenceConfig {
    /// Construct the adapter, connecting to it if needed.
    pub async fn connect(&self) -> Result<Arc<dyn Persistence>> {
        Ok(match self {
            Self::Memory => Arc::new(MemoryPersistence::new()),
            Self::File { path } => Arc::new(FilePersistence::new(path)),
            #[cfg(feature = "mongodb-store")]
            Self::Mongodb { db_uri, db_name } => {
                Arc::new(crate::model::persistence::MongoPersistence::connect(db_uri, db_name).await?)
            }
        })
    }
}

/// A fairing that loads the persistence config, restores the campaign
/// collection from it and places the resulting [`CampaignStore`] into
/// managed state. Must be attached after [`ConfigFairing`].
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Campaign store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let (policy, seed) = match rocket.state::<Config>() {
            Some(config) => (config.policy(), config.seed_example()),
            None => {
                error!("Application config must be loaded before the campaign store");
                return Err(rocket);
            }
        };

        // Load the persistence config.
        let persistence_config = match rocket
            .figment()
            .extract_inner::<PersistenceConfig>("persistence")
        {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load persistence config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded persistence config, connecting...");

        let persistence = match persistence_config.connect().await {
            Ok(persistence) => persistence,
            Err(e) => {
                error!("Failed to connect to campaign store: {e}");
                return Err(rocket);
            }
        };
        let store = match CampaignStore::open(persistence, policy, seed).await {
            Ok(store) => store,
            Err(e) => {
                error!("Failed to load campaigns: {e}");
                return Err(rocket);
            }
        };
        info!("...campaign store online!");

        // Manage the state.
        rocket = rocket.manage(store);
        Ok(rocket)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use rocket::figment::{
        providers::{Format, Toml},
        Figment,
    };

    #[test]
    fn defaults() {
        let figment = Figment::new().merge(Toml::string(
            r#"
            auth_ttl = 600
            jwt_secret = "shh"
            "#,
        ));
        let config: Config = figment.extract().unwrap();
        assert_eq!(config.auth_ttl(), Duration::minutes(10));
        assert_eq!(config.policy(), StorePolicy::default());
        assert!(config.seed_example());
    }

    #[test]
    fn persistence_kinds() {
        let figment = Figment::new().merge(Toml::string(
            r#"
            [persistence]
            kind = "file"
            path = "campaigns.json"
            "#,
        ));
        let config: PersistenceConfig = figment.extract_inner("persistence").unwrap();
        assert_eq!(
            config,
            PersistenceConfig::File {
                path: PathBuf::from("campaigns.json")
            }
        );

        let figment = Figment::new().merge(Toml::string(
            r#"
            [persistence]
            kind = "memory"
            "#,
        ));
        let config: PersistenceConfig = figment.extract_inner("persistence").unwrap();
        assert_eq!(config, PersistenceConfig::Memory);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let figment = Figment::new().merge(Toml::string("auth_ttl = 600"));
        assert!(figment.extract::<Config>().is_err());
    }
}
