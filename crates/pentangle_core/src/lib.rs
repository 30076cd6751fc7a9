//! Core domain logic for Pentangle, a ranked bucket-list.
//! This crate is the single source of truth for ranking invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod ranking;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{Category, CategoryId, DEFAULT_CATEGORY_NAMES};
pub use model::item::{Item, ItemId, Rank};
pub use model::sight::{Sight, SightId};
pub use model::validation::ValidationError;
pub use ranking::{
    bucket_sentinel, classify, normalize_rank, partition, verify_scope, Bucket, CategoryMove,
    RankedListManager, ScopeUpdate, ScopeViolation, Sections, ARCHIVE_RANK, INBOX_RANK, MAX_RANK,
    MIN_RANK,
};
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::item_repo::{
    ItemListQuery, ItemRepository, RepoError, RepoResult, SqliteItemRepository,
};
pub use service::category_service::{CategoryService, CategoryServiceError};
pub use service::item_service::{ItemService, ItemServiceError, RepairReport};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
