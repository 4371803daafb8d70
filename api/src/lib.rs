//! HTTP surface of the attendance backend.
//!
//! Exposed as a library so the server binary and the integration tests build
//! the same router.

pub mod auth;
pub mod response;
pub mod routes;
