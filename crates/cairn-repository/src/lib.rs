//! # Cairn Repository
//!
//! Backing store clients for user records.
//!
//! ```text
//! Service
//!   ↓  Arc<dyn UserRepository>
//! PgUserRepository               (PostgreSQL / SQLx)
//!   ↓  Arc<dyn DatabasePoolInterface>
//! PostgreSQL
//! ```
//!
//! [`InMemoryUserRepository`] implements the same trait over a map and
//! counts every query it serves, so callers can assert store round-trips.

pub mod memory;
pub mod pool;
pub mod postgres;
pub mod traits;

pub use memory::*;
pub use pool::*;
pub use postgres::*;
pub use traits::*;
