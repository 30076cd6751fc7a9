use pentangle_core::db::open_db_in_memory;
use pentangle_core::{
    Bucket, CategoryService, CategoryServiceError, ItemService, ItemServiceError,
    SqliteCategoryRepository, SqliteItemRepository, DEFAULT_CATEGORY_NAMES,
};
use uuid::Uuid;

#[test]
fn ensure_defaults_seeds_once() {
    let conn = open_db_in_memory().unwrap();
    let categories = CategoryService::new(SqliteCategoryRepository::try_new(&conn).unwrap());

    let first = categories.ensure_defaults().unwrap();
    let second = categories.ensure_defaults().unwrap();

    assert_eq!(first.len(), DEFAULT_CATEGORY_NAMES.len());
    assert_eq!(first, second);
    let names: Vec<&str> = first.iter().map(|category| category.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Artist", "Book", "Film", "Music", "Podcast", "TV Show", "Video Game"]
    );
}

#[test]
fn create_category_normalizes_and_rejects_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let categories = CategoryService::new(SqliteCategoryRepository::try_new(&conn).unwrap());

    let created = categories.create_category("  Board   Game ").unwrap();
    assert_eq!(created.name, "Board Game");

    assert!(matches!(
        categories.create_category("board game"),
        Err(CategoryServiceError::DuplicateName(_))
    ));
    assert!(matches!(
        categories.create_category(" \t "),
        Err(CategoryServiceError::InvalidName)
    ));

    let found = categories.find_by_name("BOARD  game").unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(categories.get_category(created.id).unwrap(), created);
    assert!(matches!(
        categories.get_category(Uuid::new_v4()),
        Err(CategoryServiceError::CategoryNotFound(_))
    ));
}

#[test]
fn create_item_requires_existing_category_and_normalizes_text() {
    let conn = open_db_in_memory().unwrap();
    let items = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());

    let item = items
        .create_item("  The   Wire ", "  all five seasons \n", None)
        .unwrap();
    assert_eq!(item.name, "The Wire");
    assert_eq!(item.details, "all five seasons");
    assert_eq!(item.bucket(), Bucket::Inbox);

    assert!(matches!(
        items.create_item("orphan", "", Some(Uuid::new_v4())),
        Err(ItemServiceError::CategoryNotFound(_))
    ));
}

#[test]
fn update_item_text_leaves_rank_untouched() {
    let conn = open_db_in_memory().unwrap();
    let items = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());
    let item = items.create_item("Draft", "", None).unwrap();
    items.change_rank(item.id, 1).unwrap();

    let updated = items
        .update_item_text(item.id, "Final", "second viewing")
        .unwrap();

    assert_eq!(updated.name, "Final");
    assert_eq!(updated.details, "second viewing");
    assert_eq!(updated.rank(), 1);
    assert!(matches!(
        items.update_item_text(Uuid::new_v4(), "x", ""),
        Err(ItemServiceError::ItemNotFound(_))
    ));
}

#[test]
fn sights_are_listed_in_insertion_order_and_cascade_on_delete() {
    let conn = open_db_in_memory().unwrap();
    let items = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());
    let trip = items.create_item("Paris", "", None).unwrap();

    items.add_sight(trip.id, "Louvre").unwrap();
    items.add_sight(trip.id, "  Musée   d'Orsay ").unwrap();
    assert!(matches!(
        items.add_sight(trip.id, "   "),
        Err(ItemServiceError::InvalidSightName)
    ));

    let names: Vec<String> = items
        .list_sights(trip.id)
        .unwrap()
        .into_iter()
        .map(|sight| sight.name)
        .collect();
    assert_eq!(names, vec!["Louvre", "Musée d'Orsay"]);

    items.delete_item(trip.id).unwrap();
    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM sights;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn add_sight_to_missing_item_fails() {
    let conn = open_db_in_memory().unwrap();
    let items = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());

    assert!(matches!(
        items.add_sight(Uuid::new_v4(), "Louvre"),
        Err(ItemServiceError::ItemNotFound(_))
    ));
}

#[test]
fn search_matches_names_case_insensitively_and_escapes_wildcards() {
    let conn = open_db_in_memory().unwrap();
    let items = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());
    items.create_item("Abbey Road", "", None).unwrap();
    items.create_item("Road House", "", None).unwrap();
    items.create_item("100% Fun", "", None).unwrap();
    items.create_item("1000 Fun", "", None).unwrap();

    let names = |text: &str| -> Vec<String> {
        items
            .search_items(text)
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect()
    };

    assert_eq!(names("road"), vec!["Abbey Road", "Road House"]);
    assert_eq!(names("100%"), vec!["100% Fun"]);
    assert!(names("   ").is_empty());
}

#[test]
fn list_all_sections_spans_every_scope() {
    let conn = open_db_in_memory().unwrap();
    let categories = CategoryService::new(SqliteCategoryRepository::try_new(&conn).unwrap());
    let items = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());
    let book = categories.create_category("Book").unwrap().id;

    let ranked = items.create_item("Ulysses", "", Some(book)).unwrap();
    items.change_rank(ranked.id, 1).unwrap();
    let archived = items.create_item("Emma", "", None).unwrap();
    items.change_rank(archived.id, 6).unwrap();
    items.create_item("Walden", "", None).unwrap();

    let sections = items.list_all_sections().unwrap();
    assert_eq!(sections.len(), 3);
    assert_eq!(sections.ranked[0].name, "Ulysses");
    assert_eq!(sections.archive[0].name, "Emma");
    assert_eq!(sections.inbox[0].name, "Walden");
}
