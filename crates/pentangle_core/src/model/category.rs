//! Category domain model.
//!
//! Categories scope rank uniqueness: two items in different categories may
//! share a rank value.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a category.
pub type CategoryId = Uuid;

/// Categories every fresh database is seeded with.
pub const DEFAULT_CATEGORY_NAMES: &[&str] = &[
    "Book",
    "Music",
    "Film",
    "TV Show",
    "Video Game",
    "Podcast",
    "Artist",
];

/// Named grouping of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    /// Creates a category with a generated stable ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    /// Creates a category with a caller-provided stable ID.
    pub fn with_id(id: CategoryId, name: impl Into<String>) -> Result<Self, ValidationError> {
        let category = Self {
            id,
            name: name.into(),
        };
        category.validate()?;
        Ok(category)
    }

    /// Validates identity and name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId { entity: "category" });
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankCategoryName);
        }
        Ok(())
    }
}
