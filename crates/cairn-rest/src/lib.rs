//! # Cairn REST
//!
//! HTTP surface of the Cairn user service, built on Axum.
//! Each user route maps onto one [`UserService`](cairn_service::UserService)
//! operation and therefore onto one cache policy.

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
