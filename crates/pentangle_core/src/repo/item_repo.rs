//! Item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Fetch complete category scopes for the ranking engine.
//! - Commit rank/category changes of one mutation in one transaction.
//! - Persist item text fields and owned sights.
//!
//! # Invariants
//! - Scopes are ordered `rank ASC, name ASC, uuid ASC`.
//! - `commit` writes ranking fields only; text edits go through
//!   `update_item_text`.
//! - Writes issued inside `atomically` join its transaction instead of
//!   opening their own.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::category::CategoryId;
use crate::model::item::{Item, ItemId};
use crate::model::sight::{Sight, SightId};
use crate::model::validation::ValidationError;
use crate::repo::schema::{ensure_connection_ready, RequiredTable};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    details,
    rank,
    category_uuid
FROM items";

const ITEM_TABLES: &[RequiredTable] = &[
    (
        "items",
        &[
            "uuid",
            "name",
            "details",
            "rank",
            "category_uuid",
            "created_at",
            "updated_at",
        ],
    ),
    ("sights", &["uuid", "item_uuid", "name", "created_at"]),
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for item and category persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    ItemNotFound(ItemId),
    CategoryNotFound(CategoryId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing items across all scopes.
#[derive(Debug, Clone, Default)]
pub struct ItemListQuery {
    /// Case-insensitive substring filter on `name`.
    pub name_contains: Option<String>,
}

/// Persistence contract consumed by the item service.
pub trait ItemRepository {
    /// Inserts a new item.
    fn create_item(&self, item: &Item) -> RepoResult<ItemId>;
    /// Replaces `name` and `details` of one item.
    fn update_item_text(&self, id: ItemId, name: &str, details: &str) -> RepoResult<()>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    /// Loads every item of one category scope; `None` is the uncategorized
    /// scope.
    fn fetch_siblings(&self, category_id: Option<CategoryId>) -> RepoResult<Vec<Item>>;
    /// Lists items of all scopes ordered by `name ASC, uuid ASC`.
    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<Item>>;
    /// Writes `rank` and `category_id` of every item atomically.
    fn commit(&self, items: &[Item]) -> RepoResult<()>;
    /// Deletes one item and commits its renumbered survivors atomically.
    fn delete_item(&self, id: ItemId, survivors: &[Item]) -> RepoResult<()>;
    fn category_exists(&self, id: CategoryId) -> RepoResult<bool>;
    fn create_sight(&self, sight: &Sight) -> RepoResult<SightId>;
    /// Lists sights of one item in insertion order.
    fn list_sights(&self, item_id: ItemId) -> RepoResult<Vec<Sight>>;
    /// Runs `f` as one write unit: the scope reads it issues and the writes
    /// that follow them commit together, or not at all on `Err`.
    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<RepoError>,
        F: FnOnce() -> Result<T, E>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, ITEM_TABLES)?;
        Ok(Self { conn })
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(&self, item: &Item) -> RepoResult<ItemId> {
        item.validate()?;

        self.conn.execute(
            "INSERT INTO items (
                uuid,
                name,
                details,
                rank,
                category_uuid
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                item.id.to_string(),
                item.name.as_str(),
                item.details.as_str(),
                item.rank(),
                item.category_id().map(|id| id.to_string()),
            ],
        )?;

        Ok(item.id)
    }

    fn update_item_text(&self, id: ItemId, name: &str, details: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE items
             SET
                name = ?2,
                details = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), name, details],
        )?;
        if changed == 0 {
            return Err(RepoError::ItemNotFound(id));
        }
        Ok(())
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(row)?));
        }
        Ok(None)
    }

    fn fetch_siblings(&self, category_id: Option<CategoryId>) -> RepoResult<Vec<Item>> {
        let mut items = Vec::new();
        match category_id {
            Some(category_id) => {
                let mut stmt = self.conn.prepare(&format!(
                    "{ITEM_SELECT_SQL}
                     WHERE category_uuid = ?1
                     ORDER BY rank ASC, name ASC, uuid ASC;"
                ))?;
                let mut rows = stmt.query([category_id.to_string()])?;
                while let Some(row) = rows.next()? {
                    items.push(parse_item_row(row)?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "{ITEM_SELECT_SQL}
                     WHERE category_uuid IS NULL
                     ORDER BY rank ASC, name ASC, uuid ASC;"
                ))?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    items.push(parse_item_row(row)?);
                }
            }
        }
        Ok(items)
    }

    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<Item>> {
        let mut sql = format!("{ITEM_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(text) = query.name_contains.as_deref() {
            sql.push_str(" AND name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(format!("%{}%", escape_like(text))));
        }

        sql.push_str(" ORDER BY name ASC, uuid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn commit(&self, items: &[Item]) -> RepoResult<()> {
        self.atomically(|| write_ranking_fields(self.conn, items))
    }

    fn delete_item(&self, id: ItemId, survivors: &[Item]) -> RepoResult<()> {
        self.atomically(|| {
            let changed = self
                .conn
                .execute("DELETE FROM items WHERE uuid = ?1;", [id.to_string()])?;
            if changed == 0 {
                return Err(RepoError::ItemNotFound(id));
            }
            write_ranking_fields(self.conn, survivors)
        })
    }

    fn category_exists(&self, id: CategoryId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create_sight(&self, sight: &Sight) -> RepoResult<SightId> {
        sight.validate()?;
        self.conn.execute(
            "INSERT INTO sights (uuid, item_uuid, name) VALUES (?1, ?2, ?3);",
            params![
                sight.id.to_string(),
                sight.item_id.to_string(),
                sight.name.as_str(),
            ],
        )?;
        Ok(sight.id)
    }

    fn list_sights(&self, item_id: ItemId) -> RepoResult<Vec<Sight>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, item_uuid, name
             FROM sights
             WHERE item_uuid = ?1
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([item_id.to_string()])?;
        let mut sights = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            let item_text: String = row.get("item_uuid")?;
            let sight = Sight {
                id: parse_uuid(&uuid_text, "sights.uuid")?,
                item_id: parse_uuid(&item_text, "sights.item_uuid")?,
                name: row.get("name")?,
            };
            sight.validate()?;
            sights.push(sight);
        }
        Ok(sights)
    }

    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<RepoError>,
        F: FnOnce() -> Result<T, E>,
    {
        // Nested call: the outer unit owns commit and rollback.
        if !self.conn.is_autocommit() {
            return f();
        }

        // IMMEDIATE takes the write lock before the first scope read, so a
        // second writer waits instead of renumbering a stale scope.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        let value = f()?;
        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }
}

fn write_ranking_fields(conn: &Connection, items: &[Item]) -> RepoResult<()> {
    for item in items {
        item.validate()?;
        let changed = conn.execute(
            "UPDATE items
             SET
                rank = ?2,
                category_uuid = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                item.id.to_string(),
                item.rank(),
                item.category_id().map(|id| id.to_string()),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::ItemNotFound(item.id));
        }
    }
    Ok(())
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "items.uuid")?;
    let category_id = row
        .get::<_, Option<String>>("category_uuid")?
        .map(|value| parse_uuid(&value, "items.category_uuid"))
        .transpose()?;

    let item = Item::from_parts(
        id,
        row.get::<_, String>("name")?,
        row.get::<_, String>("details")?,
        row.get("rank")?,
        category_id,
    )?;
    Ok(item)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
