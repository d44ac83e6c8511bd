//! Data Transfer Objects (DTOs).

mod cache_dto;
mod user_dto;

pub use cache_dto::*;
pub use user_dto::*;
