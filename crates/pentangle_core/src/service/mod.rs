//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls around the ranking engine.
//! - Keep UI/FFI layers decoupled from storage details.
//!
//! # Invariants
//! - Rank and category changes always flow through `RankedListManager`.
//! - Every mutation commits its dirty items in one repository call.

pub mod category_service;
pub mod item_service;
