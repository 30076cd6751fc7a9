//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Flatten core results into plain envelopes the UI can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every DB-backed call opens its own connection; the core engine is
//!   stateless, so nothing is cached between calls except the DB path.
//! - IDs cross the boundary as hyphenated UUID strings.

use log::warn;
use pentangle_core::db::open_db;
use pentangle_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CategoryService, Item, ItemService, Sections, SqliteCategoryRepository, SqliteItemRepository,
};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const ENTRY_DB_FILE_NAME: &str = "pentangle_entry.sqlite3";
const ENTRY_DB_PATH_ENV: &str = "PENTANGLE_DB_PATH";
static ENTRY_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Item projection for list rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryItem {
    pub item_id: String,
    pub name: String,
    pub details: String,
    pub rank: i32,
    /// `inbox|ranked|archive`.
    pub bucket: String,
    /// `None` for uncategorized items.
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCategory {
    pub category_id: String,
    pub name: String,
}

/// Category listing envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCategoriesResponse {
    pub ok: bool,
    pub categories: Vec<EntryCategory>,
    pub message: String,
}

/// Sectioned list envelope for one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySectionsResponse {
    pub ok: bool,
    /// Ordered by name.
    pub inbox: Vec<EntryItem>,
    /// Ordered by rank.
    pub ranked: Vec<EntryItem>,
    /// Ordered by name.
    pub archive: Vec<EntryItem>,
    pub message: String,
}

/// Generic action response envelope for mutating calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// ID of the created or changed entity.
    pub entity_id: Option<String>,
    /// Final rank of the changed item, when the call touches ranking.
    pub rank: Option<i32>,
    /// Number of sibling items whose rank was rewritten.
    pub renumbered: u32,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl EntryActionResponse {
    fn success(message: impl Into<String>, entity_id: Uuid) -> Self {
        Self {
            ok: true,
            entity_id: Some(entity_id.to_string()),
            rank: None,
            renumbered: 0,
            message: message.into(),
        }
    }

    fn ranked(message: impl Into<String>, item: &Item, renumbered: usize) -> Self {
        Self {
            rank: Some(item.rank()),
            renumbered: u32::try_from(renumbered).unwrap_or(u32::MAX),
            ..Self::success(message, item.id)
        }
    }

    fn failure(call: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        warn!("event=ffi_call module=ffi status=error call={call} error={message}");
        Self {
            ok: false,
            entity_id: None,
            rank: None,
            renumbered: 0,
            message: format!("{call} failed: {message}"),
        }
    }
}

/// Lists categories, seeding the predefined ones on first use.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_list_categories() -> EntryCategoriesResponse {
    let result = with_connection(|conn| {
        category_service(conn)?
            .ensure_defaults()
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(categories) => EntryCategoriesResponse {
            ok: true,
            message: format!("{} categories.", categories.len()),
            categories: categories
                .into_iter()
                .map(|category| EntryCategory {
                    category_id: category.id.to_string(),
                    name: category.name,
                })
                .collect(),
        },
        Err(message) => {
            warn!("event=ffi_call module=ffi status=error call=entry_list_categories error={message}");
            EntryCategoriesResponse {
                ok: false,
                categories: Vec::new(),
                message: format!("entry_list_categories failed: {message}"),
            }
        }
    }
}

/// Creates a user-defined category.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_create_category(name: String) -> EntryActionResponse {
    let result = with_connection(|conn| {
        category_service(conn)?
            .create_category(name)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(category) => EntryActionResponse::success("Category created.", category.id),
        Err(message) => EntryActionResponse::failure("entry_create_category", message),
    }
}

/// Creates an Inbox item.
///
/// # FFI contract
/// - `category_id = None` places the item in the uncategorized scope.
/// - Never panics; returns the created item ID on success.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_create_item(
    name: String,
    details: String,
    category_id: Option<String>,
) -> EntryActionResponse {
    let result = parse_optional_id(category_id.as_deref(), "category_id").and_then(|category| {
        with_connection(|conn| {
            item_service(conn)?
                .create_item(name, details, category)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(item) => EntryActionResponse::ranked("Item created.", &item, 0),
        Err(message) => EntryActionResponse::failure("entry_create_item", message),
    }
}

/// Moves one item to `new_rank` inside its category.
///
/// Ranks below 1 go to the Inbox, ranks above 5 to the Archive.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_change_rank(item_id: String, new_rank: i32) -> EntryActionResponse {
    let result = parse_id(&item_id, "item_id").and_then(|id| {
        with_connection(|conn| {
            item_service(conn)?
                .change_rank(id, new_rank)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(update) => {
            EntryActionResponse::ranked("Rank updated.", &update.item, update.renumbered.len())
        }
        Err(message) => EntryActionResponse::failure("entry_change_rank", message),
    }
}

/// Moves one item into another category, or out of any with `None`.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_change_category(item_id: String, category_id: Option<String>) -> EntryActionResponse {
    let result = parse_id(&item_id, "item_id").and_then(|id| {
        let category = parse_optional_id(category_id.as_deref(), "category_id")?;
        with_connection(|conn| {
            item_service(conn)?
                .change_category(id, category)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(moved) => {
            EntryActionResponse::ranked("Category updated.", &moved.item, moved.renumbered.len())
        }
        Err(message) => EntryActionResponse::failure("entry_change_category", message),
    }
}

/// Deletes one item; its former siblings are compacted.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_delete_item(item_id: String) -> EntryActionResponse {
    let result = parse_id(&item_id, "item_id").and_then(|id| {
        with_connection(|conn| {
            item_service(conn)?
                .delete_item(id)
                .map(|renumbered| (id, renumbered.len()))
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok((id, renumbered)) => EntryActionResponse {
            renumbered: u32::try_from(renumbered).unwrap_or(u32::MAX),
            ..EntryActionResponse::success("Item deleted.", id)
        },
        Err(message) => EntryActionResponse::failure("entry_delete_item", message),
    }
}

/// Lists one scope as Inbox / Ranked / Archive sections.
///
/// `category_id = None` lists the uncategorized scope.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_list_sections(category_id: Option<String>) -> EntrySectionsResponse {
    let result = parse_optional_id(category_id.as_deref(), "category_id").and_then(|category| {
        with_connection(|conn| {
            item_service(conn)?
                .list_sections(category)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(sections) => to_sections_response(sections),
        Err(message) => {
            warn!("event=ffi_call module=ffi status=error call=entry_list_sections error={message}");
            EntrySectionsResponse {
                ok: false,
                inbox: Vec::new(),
                ranked: Vec::new(),
                archive: Vec::new(),
                message: format!("entry_list_sections failed: {message}"),
            }
        }
    }
}

/// Appends a named sight to one item.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_add_sight(item_id: String, name: String) -> EntryActionResponse {
    let result = parse_id(&item_id, "item_id").and_then(|id| {
        with_connection(|conn| {
            item_service(conn)?
                .add_sight(id, name)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(sight) => EntryActionResponse::success("Sight added.", sight.id),
        Err(message) => EntryActionResponse::failure("entry_add_sight", message),
    }
}

fn resolve_entry_db_path() -> PathBuf {
    ENTRY_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(ENTRY_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(ENTRY_DB_FILE_NAME)
        })
        .clone()
}

fn with_connection<T>(f: impl FnOnce(&Connection) -> Result<T, String>) -> Result<T, String> {
    let db_path = resolve_entry_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("entry DB open failed: {err}"))?;
    f(&conn)
}

fn item_service(conn: &Connection) -> Result<ItemService<SqliteItemRepository<'_>>, String> {
    SqliteItemRepository::try_new(conn)
        .map(ItemService::new)
        .map_err(|err| format!("entry repo init failed: {err}"))
}

fn category_service(
    conn: &Connection,
) -> Result<CategoryService<SqliteCategoryRepository<'_>>, String> {
    SqliteCategoryRepository::try_new(conn)
        .map(CategoryService::new)
        .map_err(|err| format!("entry repo init failed: {err}"))
}

fn parse_id(raw: &str, field: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid {field} `{raw}`"))
}

/// Blank strings count as absent.
fn parse_optional_id(raw: Option<&str>, field: &str) -> Result<Option<Uuid>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_id(value, field).map(Some),
    }
}

fn to_sections_response(sections: Sections) -> EntrySectionsResponse {
    let total = sections.len();
    let convert = |items: Vec<Item>| items.into_iter().map(to_entry_item).collect::<Vec<_>>();
    EntrySectionsResponse {
        ok: true,
        inbox: convert(sections.inbox),
        ranked: convert(sections.ranked),
        archive: convert(sections.archive),
        message: if total == 0 {
            "No items.".to_string()
        } else {
            format!("{total} item(s).")
        },
    }
}

fn to_entry_item(item: Item) -> EntryItem {
    EntryItem {
        item_id: item.id.to_string(),
        rank: item.rank(),
        bucket: item.bucket().label().to_string(),
        category_id: item.category_id().map(|id| id.to_string()),
        name: item.name,
        details: item.details,
    }
}
