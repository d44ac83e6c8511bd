//! # Cairn Service
//!
//! The cache policy engine and the user service facade built on it.
//!
//! Reads and writes go through one named policy each:
//!
//! | Operation | Policy | Cache key | TTL |
//! |---|---|---|---|
//! | list users | [`WholeCollectionPolicy`] or [`IndexOnlyPolicy`] | `users` / `user_ids` | 60s |
//! | get user | [`EntityPolicy::fetch_or_populate`] | `user_{id}` | 5m |
//! | update user | [`EntityPolicy::write_and_sync`] | `user_{id}` | 5m |
//! | create user | [`CreatePolicy::write_and_sync`] | none | |
//!
//! Writes never touch `users` or `user_ids` unless invalidation on write is
//! switched on, so listings may lag writes by up to their TTL.

pub mod cache;
pub mod dto;
pub mod r#impl;
pub mod metrics;
pub mod policy;
pub mod user_service;

pub use cache::*;
pub use dto::*;
pub use policy::*;
pub use r#impl::{UserServiceComponent, UserServiceComponentParameters};
pub use user_service::*;
