//! Domain entities and value objects.

pub mod email;
pub mod user;

pub use email::*;
pub use user::*;
