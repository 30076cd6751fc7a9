//! Sight model: a named sub-entry owned by one item.

use crate::model::item::ItemId;
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SightId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sight {
    pub id: SightId,
    pub item_id: ItemId,
    pub name: String,
}

impl Sight {
    pub fn new(item_id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId { entity: "sight" });
        }
        if self.item_id.is_nil() {
            return Err(ValidationError::NilId { entity: "item" });
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankSightName);
        }
        Ok(())
    }
}
