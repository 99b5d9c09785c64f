//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Dashboard** (`/api/v1/dashboard`): The single reporting endpoint
//! - **Bots** (`/api/v1/bots`): Distinct bot names for filter UIs
//! - **Config** (`/api/v1/config`): Sanitized configuration metadata
//!
//! The handlers are thin glue: parameter extraction, engine calls, and
//! response shaping. Filtering, grouping, and metric definitions all live in
//! [`engine`](crate::engine).
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! Interactive documentation is served at `/docs` when the server is running.

pub mod handlers;
pub mod models;
