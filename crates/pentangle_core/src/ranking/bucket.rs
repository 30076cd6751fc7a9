//! Rank buckets and their canonical sentinel values.
//!
//! Classification is always a range test. Sentinels are only written after
//! clamping; archive ranks above `ARCHIVE_RANK` may appear mid-computation.

use crate::model::item::Rank;
use serde::{Deserialize, Serialize};

/// Lowest rank of the ordered window.
pub const MIN_RANK: Rank = 1;
/// Highest rank of the ordered window.
pub const MAX_RANK: Rank = 5;
/// Canonical Inbox rank.
pub const INBOX_RANK: Rank = -1;
/// Canonical Archive rank.
pub const ARCHIVE_RANK: Rank = MAX_RANK + 1;

/// Display bucket of a rank value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Unranked backlog, `rank < 1`.
    Inbox,
    /// Dense ordered window, `1 <= rank <= 5`.
    Ranked,
    /// Completed or deprioritized, `rank > 5`.
    Archive,
}

impl Bucket {
    /// Stable lowercase label used by logs and UI envelopes.
    pub fn label(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Ranked => "ranked",
            Self::Archive => "archive",
        }
    }
}

/// Maps a rank onto its bucket.
pub fn classify(rank: Rank) -> Bucket {
    if rank < MIN_RANK {
        Bucket::Inbox
    } else if rank > MAX_RANK {
        Bucket::Archive
    } else {
        Bucket::Ranked
    }
}

/// Canonical rank for an overflow bucket.
///
/// Returns `None` for [`Bucket::Ranked`], whose members carry their position.
pub fn bucket_sentinel(bucket: Bucket) -> Option<Rank> {
    match bucket {
        Bucket::Inbox => Some(INBOX_RANK),
        Bucket::Ranked => None,
        Bucket::Archive => Some(ARCHIVE_RANK),
    }
}

/// Clamps a rank into the nearest bucket's canonical value.
///
/// Ranks inside the window are returned unchanged.
pub fn normalize_rank(rank: Rank) -> Rank {
    bucket_sentinel(classify(rank)).unwrap_or(rank)
}

#[cfg(test)]
mod tests {
    use super::{bucket_sentinel, classify, normalize_rank, Bucket};

    #[test]
    fn classify_uses_range_boundaries() {
        assert_eq!(classify(0), Bucket::Inbox);
        assert_eq!(classify(1), Bucket::Ranked);
        assert_eq!(classify(5), Bucket::Ranked);
        assert_eq!(classify(6), Bucket::Archive);
        assert_eq!(classify(-100), Bucket::Inbox);
        assert_eq!(classify(999), Bucket::Archive);
    }

    #[test]
    fn sentinels_are_fixed() {
        assert_eq!(bucket_sentinel(Bucket::Inbox), Some(-1));
        assert_eq!(bucket_sentinel(Bucket::Archive), Some(6));
        assert_eq!(bucket_sentinel(Bucket::Ranked), None);
    }

    #[test]
    fn normalize_clamps_out_of_window_values() {
        assert_eq!(normalize_rank(-7), -1);
        assert_eq!(normalize_rank(0), -1);
        assert_eq!(normalize_rank(3), 3);
        assert_eq!(normalize_rank(6), 6);
        assert_eq!(normalize_rank(42), 6);
    }
}
