//! # Cairn Core
//!
//! Core types, traits, and error definitions for the Cairn user service.
//! Every other crate in the workspace builds on the error type, the typed
//! identifiers, and the `User` entity defined here.

pub mod domain;
pub mod error;
pub mod id;
pub mod result;
pub mod traits;
pub mod validation;

pub use domain::*;
pub use error::*;
pub use id::*;
pub use result::*;
pub use traits::*;
pub use validation::*;

// Re-export shaku for dependency injection
pub use shaku::Interface;
