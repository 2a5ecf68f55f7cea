//! Shared foundational types used across the service discovery checker.
//!
//! This crate provides content hashing, stable entity identifiers and the
//! filesystem timestamp representation stored in snapshots.

#![warn(missing_docs)]

pub mod entity;
pub mod hash;
pub mod time;

pub use entity::EntityId;
pub use hash::{ContentHash, ParseHashError};
pub use time::Timestamp;
