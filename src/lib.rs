//! Satellite tracker backend
//!
//! Stores two-line element sets in SQLite and serves them, together with
//! the live position of a tracked satellite, over a small JSON API.

pub mod config;
pub mod database;
pub mod errors;
pub mod models;
pub mod position;
pub mod routes;
