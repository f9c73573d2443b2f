//! HTTP API handlers for veriscan-api

pub mod analysis;
pub mod auth;
pub mod health;
pub mod products;
