//! Command-line front end for the Pentangle ranked list.
//!
//! # Responsibility
//! - Drive core use cases against a local SQLite file.
//! - Exercise `pentangle_core` wiring outside Flutter.
//!
//! # Invariants
//! - One connection per invocation; every mutation commits before exit.
//! - Logging is off unless `--log-dir` is given.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use pentangle_core::db::open_db;
use pentangle_core::{
    default_log_level, init_logging, Category, CategoryId, CategoryService, Item, ItemService,
    Sections, SqliteCategoryRepository, SqliteItemRepository,
};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

const DEFAULT_DB_FILE: &str = "pentangle.sqlite3";

#[derive(Parser)]
#[command(name = "pentangle", version, about = "Ranked bucket-list manager")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "PENTANGLE_DB_PATH", default_value = DEFAULT_DB_FILE)]
    db: PathBuf,
    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,
    /// Directory for rolling log files; enables logging
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Store(StoreCommand),
    /// Print the core version without touching the database
    Version,
}

/// Commands that run against the opened database.
#[derive(Subcommand)]
enum StoreCommand {
    /// List categories (seeds the predefined ones)
    Categories,
    /// Create a category
    AddCategory { name: String },
    /// Create an Inbox item
    Add {
        name: String,
        #[arg(long, default_value = "")]
        details: String,
        /// Category name; omit for uncategorized
        #[arg(long)]
        category: Option<String>,
    },
    /// Move an item to a rank (below 1 = Inbox, above 5 = Archive)
    Rank {
        id: Uuid,
        #[arg(allow_negative_numbers = true)]
        rank: i32,
    },
    /// Move an item to another category
    Move {
        id: Uuid,
        /// Target category name; omit to uncategorize
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete an item and compact its category
    Delete { id: Uuid },
    /// Show Inbox / Ranked / Archive sections
    List {
        /// Limit to one category
        #[arg(long)]
        category: Option<String>,
    },
    /// Find items by name
    Search { text: String },
    /// Add a sight to an item
    Sight { id: Uuid, name: String },
    /// Re-compact one category, or every scope when omitted
    Repair {
        #[arg(long)]
        category: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let log_dir = if log_dir.is_absolute() {
            log_dir.clone()
        } else {
            std::env::current_dir()?.join(log_dir)
        };
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, &log_dir.to_string_lossy()).context("failed to initialize logging")?;
    }

    match cli.command {
        Commands::Version => {
            println!("pentangle_core version={}", pentangle_core::core_version());
            Ok(())
        }
        Commands::Store(command) => {
            let conn = open_db(&cli.db)
                .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
            run(&conn, command)
        }
    }
}

fn run(conn: &Connection, command: StoreCommand) -> Result<()> {
    let categories = CategoryService::new(SqliteCategoryRepository::try_new(conn)?);
    let items = ItemService::new(SqliteItemRepository::try_new(conn)?);
    let known = categories.ensure_defaults()?;

    match command {
        StoreCommand::Categories => {
            for category in &known {
                println!("{}  {}", category.id, category.name);
            }
        }
        StoreCommand::AddCategory { name } => {
            let category = categories.create_category(name)?;
            println!("created category {}  {}", category.id, category.name);
        }
        StoreCommand::Add {
            name,
            details,
            category,
        } => {
            let category_id = resolve_category(&categories, category.as_deref())?;
            let item = items.create_item(name, details, category_id)?;
            println!("created {}", item.id);
        }
        StoreCommand::Rank { id, rank } => {
            let update = items.change_rank(id, rank)?;
            println!(
                "{} -> {} ({}), {} sibling(s) renumbered",
                update.item.id,
                update.item.rank(),
                update.item.bucket().label(),
                update.renumbered.len()
            );
        }
        StoreCommand::Move { id, category } => {
            let category_id = resolve_category(&categories, category.as_deref())?;
            let moved = items.change_category(id, category_id)?;
            println!(
                "{} -> {} rank {}, {} sibling(s) renumbered",
                moved.item.id,
                category_label(&known, moved.item.category_id()),
                moved.item.rank(),
                moved.renumbered.len()
            );
        }
        StoreCommand::Delete { id } => {
            let renumbered = items.delete_item(id)?;
            println!("deleted {id}, {} sibling(s) renumbered", renumbered.len());
        }
        StoreCommand::List { category } => {
            let sections = match category.as_deref() {
                Some(name) => items.list_sections(resolve_category(&categories, Some(name))?)?,
                None => items.list_all_sections()?,
            };
            print_sections(&known, &sections);
        }
        StoreCommand::Search { text } => {
            for item in items.search_items(&text)? {
                print_item(&known, &item);
            }
        }
        StoreCommand::Sight { id, name } => {
            let sight = items.add_sight(id, name)?;
            println!("added sight {}", sight.id);
        }
        StoreCommand::Repair { category } => {
            let scopes: Vec<Option<CategoryId>> = match category.as_deref() {
                Some(name) => vec![resolve_category(&categories, Some(name))?],
                None => known
                    .iter()
                    .map(|category| Some(category.id))
                    .chain([None])
                    .collect(),
            };
            for scope in scopes {
                let report = items.repair_scope(scope)?;
                if let Some(violation) = report.violation {
                    println!(
                        "{}: {violation}; {} item(s) renumbered",
                        category_label(&known, scope),
                        report.renumbered.len()
                    );
                }
            }
        }
    }

    info!("event=cli_command module=cli status=ok");
    Ok(())
}

fn resolve_category(
    categories: &CategoryService<SqliteCategoryRepository<'_>>,
    name: Option<&str>,
) -> Result<Option<CategoryId>> {
    let Some(name) = name else {
        return Ok(None);
    };
    match categories.find_by_name(name)? {
        Some(category) => Ok(Some(category.id)),
        None => bail!("unknown category `{name}`"),
    }
}

fn category_label(known: &[Category], category_id: Option<CategoryId>) -> String {
    let names: HashMap<CategoryId, &str> = known
        .iter()
        .map(|category| (category.id, category.name.as_str()))
        .collect();
    category_id
        .and_then(|id| names.get(&id).map(|name| name.to_string()))
        .unwrap_or_else(|| "uncategorized".to_string())
}

fn print_sections(known: &[Category], sections: &Sections) {
    for (title, members) in [
        ("Inbox", &sections.inbox),
        ("Ranked", &sections.ranked),
        ("Archive", &sections.archive),
    ] {
        println!("{title} ({})", members.len());
        for item in members {
            print_item(known, item);
        }
    }
}

fn print_item(known: &[Category], item: &Item) {
    println!(
        "  {:>2}  {}  [{}]  {}",
        item.rank(),
        item.name,
        category_label(known, item.category_id()),
        item.id
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parses_without_a_store_command() {
        let cli = Cli::try_parse_from(["pentangle", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn store_commands_parse_into_the_store_variant() {
        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let cli = Cli::try_parse_from(["pentangle", "rank", id, "-1"]).unwrap();
        match cli.command {
            Commands::Store(StoreCommand::Rank { id: parsed, rank }) => {
                assert_eq!(parsed, Uuid::parse_str(id).unwrap());
                assert_eq!(rank, -1);
            }
            _ => panic!("rank should parse as a store command"),
        }

        let cli = Cli::try_parse_from(["pentangle", "repair"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Store(StoreCommand::Repair { category: None })
        ));
    }
}
