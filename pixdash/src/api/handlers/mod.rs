//! Axum route handlers.

pub mod bots;
pub mod config;
pub mod dashboard;
