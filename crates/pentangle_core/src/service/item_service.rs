//! Item use-case service.
//!
//! # Responsibility
//! - Load category scopes, run them through `RankedListManager` and commit
//!   the dirty items.
//! - Provide create, edit, delete, listing and search entry points.
//!
//! # Invariants
//! - New items start in the Inbox.
//! - Deleting an item compacts the scope it leaves behind.
//! - Every fetch-renumber-commit cycle runs inside one repository write
//!   unit, so concurrent writers never renumber a stale scope.

use crate::model::category::CategoryId;
use crate::model::item::{Item, ItemId, Rank};
use crate::model::sight::Sight;
use crate::ranking::manager::{
    verify_scope, CategoryMove, RankedListManager, ScopeUpdate, ScopeViolation,
};
use crate::ranking::sections::{partition, Sections};
use crate::repo::item_repo::{ItemListQuery, ItemRepository, RepoError};
use crate::service::category_service::normalize_label;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from item service operations.
#[derive(Debug)]
pub enum ItemServiceError {
    ItemNotFound(ItemId),
    CategoryNotFound(CategoryId),
    /// Sight name is blank after normalization.
    InvalidSightName,
    Repo(RepoError),
}

impl Display for ItemServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::InvalidSightName => write!(f, "sight name must not be blank"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ItemServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ItemServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ItemNotFound(id) => Self::ItemNotFound(id),
            RepoError::CategoryNotFound(id) => Self::CategoryNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Outcome of [`ItemService::repair_scope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairReport {
    /// First violation found before repair, if any.
    pub violation: Option<ScopeViolation>,
    /// Items whose rank the repair rewrote.
    pub renumbered: Vec<ItemId>,
}

/// Item service facade.
pub struct ItemService<R: ItemRepository> {
    repo: R,
    manager: RankedListManager,
}

impl<R: ItemRepository> ItemService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            manager: RankedListManager::new(),
        }
    }

    /// Creates an Inbox item in an optional category.
    pub fn create_item(
        &self,
        name: impl Into<String>,
        details: impl Into<String>,
        category_id: Option<CategoryId>,
    ) -> Result<Item, ItemServiceError> {
        if let Some(category_id) = category_id {
            self.ensure_category(category_id)?;
        }

        let mut item = Item::new(normalize_label(&name.into()), category_id);
        item.details = details.into().trim().to_string();
        self.repo.create_item(&item)?;

        info!(
            "event=item_create module=service status=ok item={} category={}",
            item.id,
            scope_label(category_id)
        );
        Ok(item)
    }

    pub fn get_item(&self, id: ItemId) -> Result<Item, ItemServiceError> {
        self.repo
            .get_item(id)?
            .ok_or(ItemServiceError::ItemNotFound(id))
    }

    /// Replaces name and details. Rank and category are untouched.
    pub fn update_item_text(
        &self,
        id: ItemId,
        name: impl Into<String>,
        details: impl Into<String>,
    ) -> Result<Item, ItemServiceError> {
        let name = normalize_label(&name.into());
        let details = details.into().trim().to_string();
        self.repo.update_item_text(id, &name, &details)?;
        self.get_item(id)
    }

    /// Moves one item to `new_rank` inside its category scope.
    ///
    /// Out-of-range ranks are clamped to the Inbox or Archive sentinel.
    pub fn change_rank(
        &self,
        id: ItemId,
        new_rank: Rank,
    ) -> Result<ScopeUpdate, ItemServiceError> {
        let (old_rank, update) = self.repo.atomically(|| {
            let item = self.get_item(id)?;
            let scope = self.repo.fetch_siblings(item.category_id())?;
            let old_rank = item.rank();

            let update = self.manager.change_rank(item, old_rank, new_rank, scope);
            if old_rank != new_rank {
                self.repo.commit(&update.dirty_items())?;
            }
            Ok::<_, ItemServiceError>((old_rank, update))
        })?;

        info!(
            "event=item_rank_change module=service status=ok item={} old_rank={} requested_rank={} final_rank={} renumbered={}",
            id,
            old_rank,
            new_rank,
            update.item.rank(),
            update.renumbered.len()
        );
        Ok(update)
    }

    /// Moves one item to another category scope (or to the uncategorized
    /// scope with `None`).
    pub fn change_category(
        &self,
        id: ItemId,
        new_category_id: Option<CategoryId>,
    ) -> Result<CategoryMove, ItemServiceError> {
        if let Some(category_id) = new_category_id {
            self.ensure_category(category_id)?;
        }
        let (previous_category, moved) = self.repo.atomically(|| {
            let item = self.get_item(id)?;
            let previous_category = item.category_id();

            let old_scope = self.repo.fetch_siblings(previous_category)?;
            let new_scope = if previous_category == new_category_id {
                old_scope.clone()
            } else {
                self.repo.fetch_siblings(new_category_id)?
            };

            let moved = self
                .manager
                .change_category(item, new_category_id, old_scope, new_scope);
            if previous_category != new_category_id {
                self.repo.commit(&moved.dirty_items())?;
            }
            Ok::<_, ItemServiceError>((previous_category, moved))
        })?;

        info!(
            "event=item_category_change module=service status=ok item={} from_category={} to_category={} final_rank={} renumbered={}",
            id,
            scope_label(previous_category),
            scope_label(new_category_id),
            moved.item.rank(),
            moved.renumbered.len()
        );
        Ok(moved)
    }

    /// Deletes one item and compacts the scope it leaves.
    ///
    /// Returns the ids of siblings whose rank changed.
    pub fn delete_item(&self, id: ItemId) -> Result<Vec<ItemId>, ItemServiceError> {
        let survivors = self.repo.atomically(|| {
            let item = self.get_item(id)?;
            let mut scope = self.repo.fetch_siblings(item.category_id())?;
            scope.retain(|sibling| sibling.id != id);

            let survivors = rank_changes(&scope, self.manager.compact(scope.clone()));
            self.repo.delete_item(id, &survivors)?;
            Ok::<_, ItemServiceError>(survivors)
        })?;

        let renumbered = survivors.iter().map(|sibling| sibling.id).collect::<Vec<_>>();
        info!(
            "event=item_delete module=service status=ok item={} renumbered={}",
            id,
            renumbered.len()
        );
        Ok(renumbered)
    }

    /// Inbox / Ranked / Archive sections of one category scope.
    pub fn list_sections(
        &self,
        category_id: Option<CategoryId>,
    ) -> Result<Sections, ItemServiceError> {
        Ok(partition(self.repo.fetch_siblings(category_id)?))
    }

    /// Sections over every item of every category.
    pub fn list_all_sections(&self) -> Result<Sections, ItemServiceError> {
        Ok(partition(self.repo.list_items(&ItemListQuery::default())?))
    }

    /// Case-insensitive substring search over item names.
    ///
    /// Returns an empty list for blank input.
    pub fn search_items(&self, text: &str) -> Result<Vec<Item>, ItemServiceError> {
        let needle = normalize_label(text);
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let query = ItemListQuery {
            name_contains: Some(needle),
            ..ItemListQuery::default()
        };
        self.repo.list_items(&query).map_err(Into::into)
    }

    /// Appends a named sight to one item.
    pub fn add_sight(
        &self,
        item_id: ItemId,
        name: impl Into<String>,
    ) -> Result<Sight, ItemServiceError> {
        self.get_item(item_id)?;
        let name = normalize_label(&name.into());
        if name.is_empty() {
            return Err(ItemServiceError::InvalidSightName);
        }

        let sight = Sight::new(item_id, name);
        self.repo.create_sight(&sight)?;
        Ok(sight)
    }

    /// Lists sights of one item in insertion order.
    pub fn list_sights(&self, item_id: ItemId) -> Result<Vec<Sight>, ItemServiceError> {
        self.get_item(item_id)?;
        self.repo.list_sights(item_id).map_err(Into::into)
    }

    /// Re-runs compaction over one scope and commits any rewritten ranks.
    pub fn repair_scope(
        &self,
        category_id: Option<CategoryId>,
    ) -> Result<RepairReport, ItemServiceError> {
        let (violation, dirty) = self.repo.atomically(|| {
            let scope = self.repo.fetch_siblings(category_id)?;
            let violation = verify_scope(&scope).err();

            let dirty = rank_changes(&scope, self.manager.compact(scope.clone()));
            if !dirty.is_empty() {
                self.repo.commit(&dirty)?;
            }
            Ok::<_, ItemServiceError>((violation, dirty))
        })?;
        if let Some(violation) = &violation {
            warn!(
                "event=scope_repair module=service status=violation category={} detail={}",
                scope_label(category_id),
                violation
            );
        }

        info!(
            "event=scope_repair module=service status=ok category={} renumbered={}",
            scope_label(category_id),
            dirty.len()
        );
        Ok(RepairReport {
            violation,
            renumbered: dirty.iter().map(|item| item.id).collect(),
        })
    }

    fn ensure_category(&self, category_id: CategoryId) -> Result<(), ItemServiceError> {
        if self.repo.category_exists(category_id)? {
            Ok(())
        } else {
            Err(ItemServiceError::CategoryNotFound(category_id))
        }
    }
}

/// Items of `after` whose rank differs from the same position in `before`.
fn rank_changes(before: &[Item], after: Vec<Item>) -> Vec<Item> {
    after
        .into_iter()
        .zip(before)
        .filter(|(item, original)| item.rank() != original.rank())
        .map(|(item, _)| item)
        .collect()
}

fn scope_label(category_id: Option<CategoryId>) -> String {
    category_id.map_or_else(|| "none".to_string(), |id| id.to_string())
}
