#[macro_use]
extern crate log;
#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

use config::{ConfigFairing, StoreFairing};
use logging::LoggerFairing;
use model::store::CampaignStore;

/// Build the server, loading config and the campaign store from the
/// Rocket figment at ignition.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(StoreFairing)
        .attach(LoggerFairing)
}

/// Build the server around an already-constructed config and store.
pub fn rocket_for_store(config: Config, store: CampaignStore) -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .manage(config)
        .manage(store)
        .attach(LoggerFairing)
}
