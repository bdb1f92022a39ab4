use rocket::Route;

use crate::model::store::Committed;

mod admin;
mod public;
mod voter;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(public::routes());
    routes.extend(voter::routes());
    routes
}

/// Unwrap a committed mutation for the response, noting if it was not saved.
/// The change has happened either way.
fn committed<T>(committed: Committed<T>) -> T {
    if !committed.durable {
        warn!("Change applied in memory but not persisted");
    }
    committed.into_inner()
}
