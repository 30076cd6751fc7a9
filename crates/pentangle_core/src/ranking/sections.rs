//! Display partition of a list into Inbox / Ranked / Archive sections.

use crate::model::item::Item;
use crate::ranking::bucket::Bucket;
use serde::{Deserialize, Serialize};

/// Items of one list grouped by bucket.
///
/// `ranked` is ordered by rank; `inbox` and `archive` by name, then id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections {
    pub inbox: Vec<Item>,
    pub ranked: Vec<Item>,
    pub archive: Vec<Item>,
}

impl Sections {
    pub fn len(&self) -> usize {
        self.inbox.len() + self.ranked.len() + self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits items into display sections using [`crate::ranking::classify`].
pub fn partition(items: impl IntoIterator<Item = Item>) -> Sections {
    let mut sections = Sections::default();
    for item in items {
        match item.bucket() {
            Bucket::Inbox => sections.inbox.push(item),
            Bucket::Ranked => sections.ranked.push(item),
            Bucket::Archive => sections.archive.push(item),
        }
    }

    sections.ranked.sort_by(|left, right| {
        left.rank
            .cmp(&right.rank)
            .then_with(|| left.name.cmp(&right.name))
            .then_with(|| left.id.cmp(&right.id))
    });
    for overflow in [&mut sections.inbox, &mut sections.archive] {
        overflow.sort_by(|left, right| {
            left.name
                .cmp(&right.name)
                .then_with(|| left.id.cmp(&right.id))
        });
    }
    sections
}
