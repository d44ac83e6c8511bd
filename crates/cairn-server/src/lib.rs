//! # Cairn Server Library
//!
//! Dependency wiring and start-up helpers for the Cairn server binary.

pub mod di;
pub mod startup;
