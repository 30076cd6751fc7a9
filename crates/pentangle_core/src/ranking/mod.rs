//! Ranked-list reordering engine.
//!
//! # Responsibility
//! - Classify ranks into Inbox / Ranked / Archive buckets.
//! - Renumber a category scope whenever one item's rank or category changes.
//! - Partition scopes into display sections.
//!
//! # Invariants
//! - Per category scope, ranks in `1..=5` form exactly `{1, ..., k}`.
//! - After any mutation Inbox ranks are `-1` and Archive ranks are `6`.
//! - Everything here is a pure in-memory transform; callers serialize
//!   mutations of one scope and persist the returned items.

pub mod bucket;
pub mod manager;
pub mod sections;

pub use bucket::{
    bucket_sentinel, classify, normalize_rank, Bucket, ARCHIVE_RANK, INBOX_RANK, MAX_RANK,
    MIN_RANK,
};
pub use manager::{verify_scope, CategoryMove, RankedListManager, ScopeUpdate, ScopeViolation};
pub use sections::{partition, Sections};
