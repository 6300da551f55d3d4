//! Foodgram: a recipe sharing backend.
//!
//! Users publish recipes built from a shared ingredient catalog, tag them,
//! follow authors, keep favorites and a shopping cart, and download the
//! cart as a summed shopping list.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod models;
pub mod payload;
pub mod routes;
pub mod schema;
pub mod services;
