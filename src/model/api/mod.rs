//! Types that cross the HTTP boundary: requests, responses and sessions.

pub mod auth;
pub mod ballot;
pub mod campaign;
