//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Supply complete category scopes to the ranking engine.
//! - Commit renumbered items atomically.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - A fetched scope reflects every previously committed rank
//!   (one connection, read-your-writes).
//! - Repository writes validate model identity before SQL mutations.

pub mod category_repo;
pub mod item_repo;
mod schema;
