//! Rank renumbering for one category scope.
//!
//! # Responsibility
//! - Apply one rank or category change and renumber the affected siblings.
//! - Provide the compaction pass as a standalone repair operation.
//! - Detect scopes that break the dense-sequence invariant.
//!
//! # Invariants
//! - Every operation is total: out-of-range ranks are clamped, never rejected.
//! - After any operation the ranked members of a scope hold `{1, ..., k}`.
//! - Sibling order in returned vectors matches the caller's input order.
//!
//! # Contract
//! - Scopes must be complete. An incomplete scope yields a locally consistent
//!   but globally wrong renumbering; this is not detected here.

use crate::model::category::CategoryId;
use crate::model::item::{Item, ItemId, Rank};
use crate::ranking::bucket::{
    bucket_sentinel, classify, normalize_rank, Bucket, ARCHIVE_RANK, MAX_RANK, MIN_RANK,
};
use log::debug;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of [`RankedListManager::change_rank`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeUpdate {
    /// The changed item with its final rank.
    pub item: Item,
    /// Siblings in input order, renumbered.
    pub siblings: Vec<Item>,
    /// Siblings whose rank differs from the input.
    pub renumbered: Vec<ItemId>,
}

impl ScopeUpdate {
    /// Items that must be written back: the changed item plus renumbered
    /// siblings.
    pub fn dirty_items(&self) -> Vec<Item> {
        dirty(&self.item, [self.siblings.as_slice()], &self.renumbered)
    }

    /// Consumes the update into the full scope, changed item last.
    pub fn into_items(self) -> Vec<Item> {
        let mut items = self.siblings;
        items.push(self.item);
        items
    }
}

/// Result of [`RankedListManager::change_category`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMove {
    /// The moved item, carrying its new category and final rank.
    pub item: Item,
    /// Former siblings, compacted.
    pub old_siblings: Vec<Item>,
    /// New siblings, renumbered around the inserted item.
    pub new_siblings: Vec<Item>,
    /// Siblings of either scope whose rank differs from the input.
    pub renumbered: Vec<ItemId>,
}

impl CategoryMove {
    /// Items that must be written back: the moved item plus renumbered
    /// siblings of both scopes.
    pub fn dirty_items(&self) -> Vec<Item> {
        dirty(
            &self.item,
            [self.old_siblings.as_slice(), self.new_siblings.as_slice()],
            &self.renumbered,
        )
    }
}

/// Ways a scope can break the dense-sequence invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeViolation {
    /// Items from different categories were passed as one scope.
    MixedScope { item: ItemId },
    /// Two ranked items share one rank.
    DuplicateRank {
        rank: Rank,
        first: ItemId,
        second: ItemId,
    },
    /// A rank inside `1..=k` is unoccupied.
    Gap { missing: Rank },
    /// An Inbox or Archive item is not at its sentinel value.
    Unnormalized { item: ItemId, rank: Rank },
}

impl Display for ScopeViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MixedScope { item } => {
                write!(f, "item {item} belongs to a different category scope")
            }
            Self::DuplicateRank {
                rank,
                first,
                second,
            } => write!(f, "rank {rank} is held by both {first} and {second}"),
            Self::Gap { missing } => write!(f, "ranked sequence has a gap at {missing}"),
            Self::Unnormalized { item, rank } => {
                write!(f, "item {item} has unnormalized overflow rank {rank}")
            }
        }
    }
}

impl Error for ScopeViolation {}

/// Stateless renumbering engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankedListManager;

impl RankedListManager {
    pub fn new() -> Self {
        Self
    }

    /// Moves `item` from `old_rank` to `new_rank` inside its scope.
    ///
    /// `scope` holds the item's siblings; an entry with the item's own id is
    /// ignored. Equal ranks are a no-op and return the scope untouched.
    ///
    /// A ranked target past the end of the sequence lands at `k + 1`.
    pub fn change_rank(
        &self,
        mut item: Item,
        old_rank: Rank,
        new_rank: Rank,
        scope: Vec<Item>,
    ) -> ScopeUpdate {
        let mut siblings = exclude(scope, item.id);
        if old_rank == new_rank {
            return ScopeUpdate {
                item,
                siblings,
                renumbered: Vec::new(),
            };
        }

        let before = ranks_of(&siblings);
        let target = normalize_rank(new_rank);
        let from = classify(old_rank);
        let to = classify(target);
        match (from, to) {
            (Bucket::Ranked, Bucket::Ranked) => shift_window(&mut siblings, old_rank, target),
            (_, Bucket::Ranked) => open_slot(&mut siblings, target),
            _ => {}
        }

        item.rank = target;
        let (item, siblings) = settle(item, siblings);
        let renumbered = renumbered_ids(&siblings, &before);

        debug!(
            "event=rank_change module=ranking item={} from={} to={} old_rank={} new_rank={} final_rank={} renumbered={}",
            item.id,
            from.label(),
            to.label(),
            old_rank,
            new_rank,
            item.rank,
            renumbered.len()
        );

        ScopeUpdate {
            item,
            siblings,
            renumbered,
        }
    }

    /// Moves `item` into `new_category_id`.
    ///
    /// The old scope is compacted. In the new scope the item keeps its rank:
    /// an occupied rank pushes the holder and everything after it up by one
    /// (overflow goes to Archive), a free rank is a straight insert.
    pub fn change_category(
        &self,
        mut item: Item,
        new_category_id: Option<CategoryId>,
        old_scope: Vec<Item>,
        new_scope: Vec<Item>,
    ) -> CategoryMove {
        let mut old_siblings = exclude(old_scope, item.id);
        let mut new_siblings = exclude(new_scope, item.id);
        if item.category_id == new_category_id {
            return CategoryMove {
                item,
                old_siblings,
                new_siblings,
                renumbered: Vec::new(),
            };
        }

        let old_before = ranks_of(&old_siblings);
        let new_before = ranks_of(&new_siblings);
        renumber(&mut old_siblings, None);

        let previous_category = item.category_id;
        item.category_id = new_category_id;
        item.rank = normalize_rank(item.rank);
        if classify(item.rank) == Bucket::Ranked
            && new_siblings.iter().any(|sibling| sibling.rank == item.rank)
        {
            open_slot(&mut new_siblings, item.rank);
        }
        let (item, new_siblings) = settle(item, new_siblings);

        let mut renumbered = renumbered_ids(&old_siblings, &old_before);
        renumbered.extend(renumbered_ids(&new_siblings, &new_before));

        debug!(
            "event=category_change module=ranking item={} from_category={} to_category={} final_rank={} renumbered={}",
            item.id,
            scope_label(previous_category),
            scope_label(new_category_id),
            item.rank,
            renumbered.len()
        );

        CategoryMove {
            item,
            old_siblings,
            new_siblings,
            renumbered,
        }
    }

    /// Renumbers ranked members to `1..k` and clamps overflow ranks.
    ///
    /// Ties are broken by name, then id. Safe to run on an already dense
    /// scope, where it changes nothing.
    pub fn compact(&self, scope: Vec<Item>) -> Vec<Item> {
        let mut scope = scope;
        renumber(&mut scope, None);
        scope
    }
}

/// Checks one scope against the dense-sequence invariant.
pub fn verify_scope(items: &[Item]) -> Result<(), ScopeViolation> {
    if let Some(first) = items.first() {
        if let Some(stray) = items
            .iter()
            .find(|item| item.category_id != first.category_id)
        {
            return Err(ScopeViolation::MixedScope { item: stray.id });
        }
    }

    let mut held: HashMap<Rank, ItemId> = HashMap::new();
    for item in items {
        match classify(item.rank) {
            Bucket::Ranked => {
                if let Some(first) = held.insert(item.rank, item.id) {
                    return Err(ScopeViolation::DuplicateRank {
                        rank: item.rank,
                        first,
                        second: item.id,
                    });
                }
            }
            bucket => {
                if bucket_sentinel(bucket) != Some(item.rank) {
                    return Err(ScopeViolation::Unnormalized {
                        item: item.id,
                        rank: item.rank,
                    });
                }
            }
        }
    }

    let count = held.len() as Rank;
    for rank in MIN_RANK..MIN_RANK + count {
        if !held.contains_key(&rank) {
            return Err(ScopeViolation::Gap { missing: rank });
        }
    }
    Ok(())
}

fn exclude(scope: Vec<Item>, id: ItemId) -> Vec<Item> {
    let mut scope = scope;
    scope.retain(|sibling| sibling.id != id);
    scope
}

fn ranks_of(items: &[Item]) -> Vec<Rank> {
    items.iter().map(|item| item.rank).collect()
}

fn renumbered_ids(items: &[Item], before: &[Rank]) -> Vec<ItemId> {
    items
        .iter()
        .zip(before)
        .filter(|(item, rank)| item.rank != **rank)
        .map(|(item, _)| item.id)
        .collect()
}

fn dirty<const N: usize>(item: &Item, scopes: [&[Item]; N], renumbered: &[ItemId]) -> Vec<Item> {
    let mut items = vec![item.clone()];
    for scope in scopes {
        items.extend(
            scope
                .iter()
                .filter(|sibling| renumbered.contains(&sibling.id))
                .cloned(),
        );
    }
    items
}

/// Local shift for a move inside the ordered window.
fn shift_window(siblings: &mut [Item], old_rank: Rank, new_rank: Rank) {
    for sibling in siblings.iter_mut() {
        if old_rank < new_rank && sibling.rank > old_rank && sibling.rank <= new_rank {
            sibling.rank -= 1;
        } else if old_rank > new_rank && sibling.rank >= new_rank && sibling.rank < old_rank {
            sibling.rank += 1;
        }
    }
}

/// Reserves `at` by pushing ranked siblings at or after it up by one.
fn open_slot(siblings: &mut [Item], at: Rank) {
    for sibling in siblings
        .iter_mut()
        .filter(|sibling| classify(sibling.rank) == Bucket::Ranked && sibling.rank >= at)
    {
        sibling.rank += 1;
    }
}

/// Runs compaction with `item` pinned at its current rank.
fn settle(item: Item, siblings: Vec<Item>) -> (Item, Vec<Item>) {
    let mut members = siblings;
    let pinned = members.len();
    members.push(item);
    renumber(&mut members, Some(pinned));
    let item = members.swap_remove(pinned);
    (item, members)
}

/// Compaction and clamp passes.
///
/// On equal ranks the pinned member sorts first so it keeps the slot it
/// asked for.
fn renumber(members: &mut [Item], pinned: Option<usize>) {
    let mut window: Vec<usize> = (0..members.len())
        .filter(|&index| classify(members[index].rank) == Bucket::Ranked)
        .collect();
    window.sort_by(|&a, &b| {
        let (left, right) = (&members[a], &members[b]);
        left.rank
            .cmp(&right.rank)
            .then_with(|| (Some(b) == pinned).cmp(&(Some(a) == pinned)))
            .then_with(|| left.name.cmp(&right.name))
            .then_with(|| left.id.cmp(&right.id))
    });

    for (position, index) in window.into_iter().enumerate() {
        let rank = MIN_RANK + position as Rank;
        members[index].rank = if rank > MAX_RANK { ARCHIVE_RANK } else { rank };
    }
    for member in members.iter_mut() {
        member.rank = normalize_rank(member.rank);
    }
}

fn scope_label(category_id: Option<CategoryId>) -> String {
    category_id.map_or_else(|| "none".to_string(), |id| id.to_string())
}
