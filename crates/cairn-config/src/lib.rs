//! # Cairn Config
//!
//! Configuration management for the Cairn user service.
//! Supports layered configuration from files, environment variables,
//! and runtime refresh.

mod app_config;
mod cache_mode;
mod loader;
mod validation;

pub use app_config::*;
pub use cache_mode::*;
pub use loader::*;
pub use validation::*;
