//! Category use-case service.
//!
//! # Responsibility
//! - Normalize and deduplicate category names.
//! - Seed the predefined categories.
//!
//! # Invariants
//! - Stored names are trimmed with inner whitespace collapsed.
//! - Names are unique case-insensitively.

use crate::model::category::{Category, CategoryId, DEFAULT_CATEGORY_NAMES};
use crate::repo::category_repo::CategoryRepository;
use crate::repo::item_repo::RepoError;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Errors from category service operations.
#[derive(Debug)]
pub enum CategoryServiceError {
    /// Name is blank after normalization.
    InvalidName,
    /// Another category already uses this name.
    DuplicateName(String),
    CategoryNotFound(CategoryId),
    Repo(RepoError),
}

impl Display for CategoryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "category name must not be blank"),
            Self::DuplicateName(name) => write!(f, "category already exists: `{name}`"),
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CategoryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CategoryServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::CategoryNotFound(id) => Self::CategoryNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Category service facade.
pub struct CategoryService<R: CategoryRepository> {
    repo: R,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Inserts every predefined category that is missing.
    ///
    /// Idempotent. Returns the full category list afterwards.
    pub fn ensure_defaults(&self) -> Result<Vec<Category>, CategoryServiceError> {
        let mut created = 0usize;
        for name in DEFAULT_CATEGORY_NAMES {
            if self.repo.find_by_name(name)?.is_none() {
                self.repo.create_category(&Category::new(*name))?;
                created += 1;
            }
        }
        if created > 0 {
            info!("event=categories_seeded module=service status=ok created={created}");
        }
        self.list_categories()
    }

    /// Creates a category with a normalized, unique name.
    pub fn create_category(
        &self,
        name: impl Into<String>,
    ) -> Result<Category, CategoryServiceError> {
        let normalized = normalize_label(&name.into());
        if normalized.is_empty() {
            return Err(CategoryServiceError::InvalidName);
        }
        if self.repo.find_by_name(&normalized)?.is_some() {
            return Err(CategoryServiceError::DuplicateName(normalized));
        }

        let category = Category::new(normalized);
        self.repo.create_category(&category)?;
        info!(
            "event=category_create module=service status=ok category={}",
            category.id
        );
        Ok(category)
    }

    /// Lists categories ordered by name.
    pub fn list_categories(&self) -> Result<Vec<Category>, CategoryServiceError> {
        self.repo.list_categories().map_err(Into::into)
    }

    pub fn get_category(&self, id: CategoryId) -> Result<Category, CategoryServiceError> {
        self.repo
            .get_category(id)?
            .ok_or(CategoryServiceError::CategoryNotFound(id))
    }

    /// Looks a category up by name, ignoring case and extra whitespace.
    pub fn find_by_name(&self, name: &str) -> Result<Option<Category>, CategoryServiceError> {
        let normalized = normalize_label(name);
        if normalized.is_empty() {
            return Ok(None);
        }
        self.repo.find_by_name(&normalized).map_err(Into::into)
    }
}

/// Trims and collapses inner whitespace runs to one space.
pub(crate) fn normalize_label(value: &str) -> String {
    WHITESPACE_RE.replace_all(value.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::normalize_label;

    #[test]
    fn normalize_label_collapses_whitespace() {
        assert_eq!(normalize_label("  Video \t  Game\n"), "Video Game");
        assert_eq!(normalize_label(" \n "), "");
    }
}
