//! Domain model for ranked bucket-list items.
//!
//! # Responsibility
//! - Define canonical data structures used by ranking and persistence.
//! - Keep identity stable and rank mutation behind the ranking engine.
//!
//! # Invariants
//! - Every domain object is identified by a stable, non-nil UUID.
//! - Items start in the Inbox (`rank = -1`).
//!
//! # See also
//! - `crate::ranking` for rank semantics.

pub mod category;
pub mod item;
pub mod sight;
pub mod validation;
