//! Request/response data structures for the REST API.

pub mod bots;
pub mod config;
pub mod dashboard;
