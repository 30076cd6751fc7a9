//! Ranked item domain model.
//!
//! # Responsibility
//! - Define the record ranked by `RankedListManager`.
//! - Keep `rank` and `category_id` read-only outside the crate so that every
//!   mutation flows through the ranking engine.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - New items start in the Inbox (`rank = INBOX_RANK`).

use crate::model::category::CategoryId;
use crate::model::validation::ValidationError;
use crate::ranking::bucket::{classify, Bucket, INBOX_RANK};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a ranked item.
pub type ItemId = Uuid;

/// Rank value. See [`crate::ranking::classify`] for bucket semantics.
pub type Rank = i32;

/// One bucket-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable global ID.
    pub id: ItemId,
    /// User-facing title. Also the secondary sort key inside a bucket.
    pub name: String,
    /// Free-form notes.
    pub details: String,
    pub(crate) rank: Rank,
    pub(crate) category_id: Option<CategoryId>,
}

impl Item {
    /// Creates an Inbox item with a generated stable ID.
    pub fn new(name: impl Into<String>, category_id: Option<CategoryId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            details: String::new(),
            rank: INBOX_RANK,
            category_id,
        }
    }

    /// Rebuilds an item from persisted parts.
    ///
    /// Intended for persistence collaborators that hydrate rows they
    /// previously committed. The rank is taken as stored; callers that need
    /// the dense-sequence guarantee should run the scope through
    /// `RankedListManager::compact`.
    pub fn from_parts(
        id: ItemId,
        name: impl Into<String>,
        details: impl Into<String>,
        rank: Rank,
        category_id: Option<CategoryId>,
    ) -> Result<Self, ValidationError> {
        let item = Self {
            id,
            name: name.into(),
            details: details.into(),
            rank,
            category_id,
        };
        item.validate()?;
        Ok(item)
    }

    /// Validates identity fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId { entity: "item" });
        }
        if self.category_id.is_some_and(|id| id.is_nil()) {
            return Err(ValidationError::NilId { entity: "category" });
        }
        Ok(())
    }

    /// Current rank value.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Category scope of this item. `None` is the shared uncategorized scope.
    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    /// Display bucket derived from the current rank.
    pub fn bucket(&self) -> Bucket {
        classify(self.rank)
    }
}
