use pentangle_core::db::{open_db, open_db_in_memory};
use pentangle_core::{
    verify_scope, CategoryService, Item, ItemId, ItemRepository, ItemService, ItemServiceError,
    Rank, RankedListManager, RepoError, ScopeViolation, SqliteCategoryRepository,
    SqliteItemRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn services(
    conn: &Connection,
) -> (
    ItemService<SqliteItemRepository<'_>>,
    CategoryService<SqliteCategoryRepository<'_>>,
) {
    (
        ItemService::new(SqliteItemRepository::try_new(conn).unwrap()),
        CategoryService::new(SqliteCategoryRepository::try_new(conn).unwrap()),
    )
}

/// Creates `names` in order and ranks them `1..=n`.
fn seed_ranked(
    items: &ItemService<SqliteItemRepository<'_>>,
    category_id: Option<Uuid>,
    names: &[&str],
) -> Vec<ItemId> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let item = items.create_item(*name, "", category_id).unwrap();
            items.change_rank(item.id, index as Rank + 1).unwrap();
            item.id
        })
        .collect()
}

fn scope_ranks(conn: &Connection, category_id: Option<Uuid>) -> Vec<(String, Rank)> {
    let repo = SqliteItemRepository::try_new(conn).unwrap();
    let scope = repo.fetch_siblings(category_id).unwrap();
    verify_scope(&scope).unwrap();
    let mut ranks: Vec<(String, Rank)> = scope
        .into_iter()
        .map(|item| (item.name.clone(), item.rank()))
        .collect();
    ranks.sort();
    ranks
}

fn expected(pairs: &[(&str, Rank)]) -> Vec<(String, Rank)> {
    let mut pairs: Vec<(String, Rank)> = pairs
        .iter()
        .map(|(name, rank)| (name.to_string(), *rank))
        .collect();
    pairs.sort();
    pairs
}

#[test]
fn move_down_closes_the_gap_behind() {
    let conn = open_db_in_memory().unwrap();
    let (items, categories) = services(&conn);
    let film = categories.create_category("Film").unwrap().id;
    let ids = seed_ranked(&items, Some(film), &["A", "B", "C"]);

    let update = items.change_rank(ids[0], 3).unwrap();

    assert_eq!(update.item.rank(), 3);
    assert_eq!(update.renumbered.len(), 2);
    assert_eq!(
        scope_ranks(&conn, Some(film)),
        expected(&[("A", 3), ("B", 1), ("C", 2)])
    );
}

#[test]
fn move_up_shifts_displaced_siblings() {
    let conn = open_db_in_memory().unwrap();
    let (items, categories) = services(&conn);
    let film = categories.create_category("Film").unwrap().id;
    let ids = seed_ranked(&items, Some(film), &["A", "B", "C"]);

    items.change_rank(ids[2], 1).unwrap();

    assert_eq!(
        scope_ranks(&conn, Some(film)),
        expected(&[("A", 2), ("B", 3), ("C", 1)])
    );
}

#[test]
fn inbox_item_inserted_at_top_pushes_siblings_down() {
    let conn = open_db_in_memory().unwrap();
    let (items, categories) = services(&conn);
    let book = categories.create_category("Book").unwrap().id;
    seed_ranked(&items, Some(book), &["A", "B"]);

    let d = items.create_item("D", "", Some(book)).unwrap();
    assert_eq!(d.rank(), -1);
    items.change_rank(d.id, 1).unwrap();

    assert_eq!(
        scope_ranks(&conn, Some(book)),
        expected(&[("A", 2), ("B", 3), ("D", 1)])
    );
}

#[test]
fn insert_into_full_window_archives_the_last_ranked_item() {
    let conn = open_db_in_memory().unwrap();
    let (items, categories) = services(&conn);
    let music = categories.create_category("Music").unwrap().id;
    seed_ranked(&items, Some(music), &["A", "B", "C", "D", "E"]);

    let f = items.create_item("F", "", Some(music)).unwrap();
    items.change_rank(f.id, 1).unwrap();

    assert_eq!(
        scope_ranks(&conn, Some(music)),
        expected(&[("A", 2), ("B", 3), ("C", 4), ("D", 5), ("E", 6), ("F", 1)])
    );
    let sections = items.list_sections(Some(music)).unwrap();
    assert_eq!(sections.ranked.len(), 5);
    assert_eq!(sections.archive[0].name, "E");
}

#[test]
fn ranked_target_past_the_tail_lands_after_last_ranked_item() {
    let conn = open_db_in_memory().unwrap();
    let (items, _) = services(&conn);
    seed_ranked(&items, None, &["A", "B"]);

    let c = items.create_item("C", "", None).unwrap();
    let update = items.change_rank(c.id, 5).unwrap();

    assert_eq!(update.item.rank(), 3);
    assert_eq!(
        scope_ranks(&conn, None),
        expected(&[("A", 1), ("B", 2), ("C", 3)])
    );
}

#[test]
fn leaving_the_window_compacts_and_clamps_to_sentinels() {
    let conn = open_db_in_memory().unwrap();
    let (items, _) = services(&conn);
    let ids = seed_ranked(&items, None, &["A", "B", "C", "D"]);

    items.change_rank(ids[1], 0).unwrap();
    items.change_rank(ids[2], 42).unwrap();

    assert_eq!(
        scope_ranks(&conn, None),
        expected(&[("A", 1), ("B", -1), ("C", 6), ("D", 2)])
    );
}

#[test]
fn same_rank_change_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let (items, _) = services(&conn);
    let ids = seed_ranked(&items, None, &["A", "B"]);

    let update = items.change_rank(ids[1], 2).unwrap();

    assert!(update.renumbered.is_empty());
    assert_eq!(update.item.rank(), 2);
}

#[test]
fn categories_are_independent_scopes() {
    let conn = open_db_in_memory().unwrap();
    let (items, categories) = services(&conn);
    let book = categories.create_category("Book").unwrap().id;
    let film = categories.create_category("Film").unwrap().id;
    seed_ranked(&items, Some(book), &["b1", "b2"]);
    seed_ranked(&items, Some(film), &["f1", "f2"]);
    seed_ranked(&items, None, &["n1"]);

    let newcomer = items.create_item("b0", "", Some(book)).unwrap();
    items.change_rank(newcomer.id, 1).unwrap();

    assert_eq!(
        scope_ranks(&conn, Some(book)),
        expected(&[("b0", 1), ("b1", 2), ("b2", 3)])
    );
    assert_eq!(
        scope_ranks(&conn, Some(film)),
        expected(&[("f1", 1), ("f2", 2)])
    );
    assert_eq!(scope_ranks(&conn, None), expected(&[("n1", 1)]));
}

#[test]
fn change_category_compacts_old_scope_and_shifts_new_scope() {
    let conn = open_db_in_memory().unwrap();
    let (items, categories) = services(&conn);
    let book = categories.create_category("Book").unwrap().id;
    let film = categories.create_category("Film").unwrap().id;
    let books = seed_ranked(&items, Some(book), &["A", "B", "C"]);
    seed_ranked(&items, Some(film), &["X", "Y"]);

    let moved = items.change_category(books[1], Some(film)).unwrap();

    assert_eq!(moved.item.category_id(), Some(film));
    assert_eq!(moved.item.rank(), 2);
    assert_eq!(
        scope_ranks(&conn, Some(book)),
        expected(&[("A", 1), ("C", 2)])
    );
    assert_eq!(
        scope_ranks(&conn, Some(film)),
        expected(&[("B", 2), ("X", 1), ("Y", 3)])
    );
}

#[test]
fn change_category_to_uncategorized_scope() {
    let conn = open_db_in_memory().unwrap();
    let (items, categories) = services(&conn);
    let podcast = categories.create_category("Podcast").unwrap().id;
    let ids = seed_ranked(&items, Some(podcast), &["A", "B"]);

    let moved = items.change_category(ids[1], None).unwrap();

    assert_eq!(moved.item.category_id(), None);
    assert_eq!(moved.item.rank(), 1);
    assert_eq!(scope_ranks(&conn, Some(podcast)), expected(&[("A", 1)]));
    assert_eq!(scope_ranks(&conn, None), expected(&[("B", 1)]));
}

#[test]
fn change_category_to_same_category_is_a_noop() {
    let conn = open_db_in_memory().unwrap();
    let (items, categories) = services(&conn);
    let book = categories.create_category("Book").unwrap().id;
    let ids = seed_ranked(&items, Some(book), &["A", "B"]);

    let moved = items.change_category(ids[0], Some(book)).unwrap();

    assert!(moved.renumbered.is_empty());
    assert_eq!(
        scope_ranks(&conn, Some(book)),
        expected(&[("A", 1), ("B", 2)])
    );
}

#[test]
fn change_category_rejects_unknown_category() {
    let conn = open_db_in_memory().unwrap();
    let (items, _) = services(&conn);
    let item = items.create_item("A", "", None).unwrap();
    let missing = Uuid::new_v4();

    let err = items.change_category(item.id, Some(missing)).unwrap_err();
    assert!(matches!(err, ItemServiceError::CategoryNotFound(id) if id == missing));
}

#[test]
fn unknown_item_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let (items, _) = services(&conn);
    let missing = Uuid::new_v4();

    let err = items.change_rank(missing, 1).unwrap_err();
    assert!(matches!(err, ItemServiceError::ItemNotFound(id) if id == missing));
    assert!(matches!(
        items.delete_item(missing),
        Err(ItemServiceError::ItemNotFound(_))
    ));
}

#[test]
fn delete_item_compacts_remaining_scope() {
    let conn = open_db_in_memory().unwrap();
    let (items, _) = services(&conn);
    let ids = seed_ranked(&items, None, &["A", "B", "C"]);

    let renumbered = items.delete_item(ids[0]).unwrap();

    assert_eq!(renumbered.len(), 2);
    assert_eq!(scope_ranks(&conn, None), expected(&[("B", 1), ("C", 2)]));
    assert!(matches!(
        items.get_item(ids[0]),
        Err(ItemServiceError::ItemNotFound(_))
    ));
}

#[test]
fn repair_scope_fixes_externally_corrupted_ranks() {
    let conn = open_db_in_memory().unwrap();
    let (items, _) = services(&conn);
    let ids = seed_ranked(&items, None, &["A", "B", "C"]);
    conn.execute(
        "UPDATE items SET rank = 5 WHERE uuid = ?1;",
        [ids[1].to_string()],
    )
    .unwrap();

    let report = items.repair_scope(None).unwrap();

    assert_eq!(report.violation, Some(ScopeViolation::Gap { missing: 2 }));
    assert_eq!(report.renumbered.len(), 2);
    assert_eq!(
        scope_ranks(&conn, None),
        expected(&[("A", 1), ("B", 3), ("C", 2)])
    );

    let clean = items.repair_scope(None).unwrap();
    assert_eq!(clean.violation, None);
    assert!(clean.renumbered.is_empty());
}

#[test]
fn repair_scope_normalizes_overflow_values() {
    let conn = open_db_in_memory().unwrap();
    let (items, _) = services(&conn);
    let a = items.create_item("A", "", None).unwrap();
    let b = items.create_item("B", "", None).unwrap();
    conn.execute("UPDATE items SET rank = 0 WHERE uuid = ?1;", [a.id.to_string()])
        .unwrap();
    conn.execute("UPDATE items SET rank = 11 WHERE uuid = ?1;", [b.id.to_string()])
        .unwrap();

    let report = items.repair_scope(None).unwrap();

    assert!(matches!(
        report.violation,
        Some(ScopeViolation::Unnormalized { .. })
    ));
    assert_eq!(scope_ranks(&conn, None), expected(&[("A", -1), ("B", 6)]));
}

struct XorShift(u64);

impl XorShift {
    fn below(&mut self, bound: usize) -> usize {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 % bound as u64) as usize
    }
}

fn assert_dense(repo: &SqliteItemRepository<'_>, scopes: &[Option<Uuid>], step: usize) {
    for scope in scopes {
        let members = repo.fetch_siblings(*scope).unwrap();
        assert_eq!(verify_scope(&members), Ok(()), "scope {scope:?} after step {step}");
    }
}

#[test]
fn long_edit_session_keeps_every_scope_dense() {
    let conn = open_db_in_memory().unwrap();
    let (items, categories) = services(&conn);
    let repo = SqliteItemRepository::try_new(&conn).unwrap();
    let seeded = categories.ensure_defaults().unwrap();
    let scopes: Vec<Option<Uuid>> = seeded
        .iter()
        .take(2)
        .map(|category| Some(category.id))
        .chain([None])
        .collect();

    let mut ids: Vec<ItemId> = Vec::new();
    for index in 0..12 {
        let scope = scopes[index % scopes.len()];
        ids.push(items.create_item(format!("item-{index}"), "", scope).unwrap().id);
    }

    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
    for step in 0..400 {
        let pick = ids[rng.below(ids.len())];
        match rng.below(10) {
            0 => {
                items.delete_item(pick).unwrap();
                ids.retain(|id| *id != pick);
                let scope = scopes[rng.below(scopes.len())];
                ids.push(items.create_item(format!("item-r{step}"), "", scope).unwrap().id);
            }
            1 | 2 => {
                items
                    .change_category(pick, scopes[rng.below(scopes.len())])
                    .unwrap();
            }
            _ => {
                let rank = rng.below(9) as Rank - 1;
                items.change_rank(pick, rank).unwrap();
            }
        }
        assert_dense(&repo, &scopes, step);
    }

    assert_eq!(items.list_all_sections().unwrap().len(), 12);
}

#[test]
fn concurrent_writers_on_separate_connections_keep_scope_dense() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.sqlite3");
    drop(open_db(&path).unwrap());

    std::thread::scope(|threads| {
        for writer in 0..2 {
            let path = &path;
            threads.spawn(move || {
                let conn = open_db(path).unwrap();
                let items = ItemService::new(SqliteItemRepository::try_new(&conn).unwrap());
                for round in 0..15 {
                    let item = items
                        .create_item(format!("w{writer}-{round}"), "", None)
                        .unwrap();
                    items.change_rank(item.id, 1).unwrap();
                }
            });
        }
    });

    let conn = open_db(&path).unwrap();
    let repo = SqliteItemRepository::try_new(&conn).unwrap();
    let scope = repo.fetch_siblings(None).unwrap();
    assert_eq!(scope.len(), 30);
    assert_eq!(verify_scope(&scope), Ok(()));
    let ranked: Vec<Rank> = scope
        .iter()
        .map(Item::rank)
        .filter(|rank| (1..=5).contains(rank))
        .collect();
    assert_eq!(ranked, vec![1, 2, 3, 4, 5]);
}

#[test]
fn failed_write_unit_rolls_back_its_writes() {
    let conn = open_db_in_memory().unwrap();
    let (items, _) = services(&conn);
    let ids = seed_ranked(&items, None, &["A", "B"]);
    let repo = SqliteItemRepository::try_new(&conn).unwrap();

    let result: Result<(), RepoError> = repo.atomically(|| {
        let scope = repo.fetch_siblings(None)?;
        let update = RankedListManager::new().change_rank(scope[0].clone(), 1, 2, scope.clone());
        repo.commit(&update.dirty_items())?;
        Err(RepoError::ItemNotFound(ids[0]))
    });

    assert!(matches!(result, Err(RepoError::ItemNotFound(_))));
    assert!(conn.is_autocommit());
    assert_eq!(scope_ranks(&conn, None), expected(&[("A", 1), ("B", 2)]));
}
