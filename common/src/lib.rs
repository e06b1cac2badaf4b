//! Shared building blocks for the database bridge.
//!
//! Configuration, the error type, the JSON envelope, request models,
//! middleware and SQL validation live here so the service crate only has to
//! wire routes and talk to databases.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
