//! Category repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Names are unique case-insensitively (enforced by a unique index).
//! - Listing is ordered `name ASC` (case-insensitive), then `uuid ASC`.

use crate::model::category::{Category, CategoryId};
use crate::repo::item_repo::{parse_uuid, RepoResult};
use crate::repo::schema::{ensure_connection_ready, RequiredTable};
use rusqlite::{params, Connection, Row};

const CATEGORY_TABLES: &[RequiredTable] = &[("categories", &["uuid", "name", "created_at"])];

/// Repository interface for category persistence.
pub trait CategoryRepository {
    fn create_category(&self, category: &Category) -> RepoResult<CategoryId>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    /// Case-insensitive exact name lookup.
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>>;
    fn list_categories(&self) -> RepoResult<Vec<Category>>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, CATEGORY_TABLES)?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn create_category(&self, category: &Category) -> RepoResult<CategoryId> {
        category.validate()?;
        self.conn.execute(
            "INSERT INTO categories (uuid, name) VALUES (?1, ?2);",
            params![category.id.to_string(), category.name.as_str()],
        )?;
        Ok(category.id)
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, name FROM categories WHERE uuid = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_category_row(row)?));
        }
        Ok(None)
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, name FROM categories WHERE name = ?1 COLLATE NOCASE;")?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_category_row(row)?));
        }
        Ok(None)
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, name
             FROM categories
             ORDER BY name COLLATE NOCASE ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "categories.uuid")?;
    let category = Category::with_id(id, row.get::<_, String>("name")?)?;
    Ok(category)
}
