pub mod api;
pub mod campaign;
pub mod persistence;
pub mod store;
pub mod tally;
