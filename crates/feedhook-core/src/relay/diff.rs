//! Incremental diff between a fresh listing and the last-seen marker.
//!
//! Listings arrive newest first. Everything in front of the last-seen item is
//! new; if the marker is gone from the listing, the whole listing is new.

use crate::feed::Item;

/// Outcome of comparing one listing against the stored marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePlan {
    /// Items at positions `[0, new_count)` of the listing are new
    pub new_count: usize,
    /// Id of the listing's first item, `None` for an empty listing
    pub newest_id: Option<String>,
}

/// Number of items ahead of `last_seen` in a newest-first listing
pub fn count_new(items: &[Item], last_seen: Option<&str>) -> usize {
    last_seen
        .and_then(|id| items.iter().position(|item| item.id == id))
        .unwrap_or(items.len())
}

pub fn plan(items: &[Item], last_seen: Option<&str>) -> CyclePlan {
    CyclePlan {
        new_count: count_new(items, last_seen),
        newest_id: items.first().map(|item| item.id.clone()),
    }
}

/// The new items in delivery order: oldest first
pub fn oldest_first(items: &[Item], new_count: usize) -> impl Iterator<Item = &Item> {
    items[..new_count.min(items.len())].iter().rev()
}
