//! Favorites and ratings as seen by the detail lookup.
//!
//! Persistence lives outside this crate. [`EngagementStore`] is the seam;
//! [`InMemoryEngagement`] backs the CLI and the tests.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::model::{ItemKey, Rating};

/// Read side of the favorites/ratings store.
pub trait EngagementStore: Send + Sync {
    fn is_favorite(&self, user: &str, item: &ItemKey) -> bool;

    fn has_rated(&self, user: &str, item: &ItemKey) -> bool;

    /// Vote histogram of one item across all users.
    fn votes(&self, item: &ItemKey) -> RatingVotes;
}

/// Count of votes per star value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingVotes {
    counts: [u64; 5],
}

impl RatingVotes {
    pub fn record(&mut self, rating: Rating) {
        self.counts[stars(rating) as usize - 1] += 1;
    }

    pub fn with(mut self, rating: Rating, votes: u64) -> Self {
        self.counts[stars(rating) as usize - 1] += votes;
        self
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Weighted mean with one decimal, rounded half up: `"4.5"`. `None`
    /// without votes.
    pub fn average_label(&self) -> Option<String> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let weighted: u64 = self
            .counts
            .iter()
            .zip(1u64..)
            .map(|(count, stars)| count * stars)
            .sum();
        let tenths = (weighted * 20 + total) / (2 * total);
        Some(format!("{}.{}", tenths / 10, tenths % 10))
    }
}

fn stars(rating: Rating) -> u8 {
    match rating {
        Rating::One => 1,
        Rating::Two => 2,
        Rating::Three => 3,
        Rating::Four => 4,
        Rating::Five => 5,
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryEngagement {
    /// Per user, in the order items were added.
    favorites: RwLock<HashMap<String, Vec<ItemKey>>>,
    ratings: RwLock<HashMap<ItemKey, HashMap<String, Rating>>>,
}

impl InMemoryEngagement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_favorite(&self, user: &str, item: ItemKey) {
        let mut favorites = self.favorites.write();
        let list = favorites.entry(user.to_string()).or_default();
        if !list.contains(&item) {
            list.push(item);
        }
    }

    pub fn remove_favorite(&self, user: &str, item: &ItemKey) {
        if let Some(list) = self.favorites.write().get_mut(user) {
            list.retain(|k| k != item);
        }
    }

    /// Favorites of `user`, oldest first.
    pub fn favorites(&self, user: &str) -> Vec<ItemKey> {
        self.favorites.read().get(user).cloned().unwrap_or_default()
    }

    /// Record or replace the vote of `user`.
    pub fn rate(&self, user: &str, item: ItemKey, rating: Rating) {
        self.ratings
            .write()
            .entry(item)
            .or_default()
            .insert(user.to_string(), rating);
    }
}

impl EngagementStore for InMemoryEngagement {
    fn is_favorite(&self, user: &str, item: &ItemKey) -> bool {
        self.favorites
            .read()
            .get(user)
            .is_some_and(|list| list.contains(item))
    }

    fn has_rated(&self, user: &str, item: &ItemKey) -> bool {
        self.ratings
            .read()
            .get(item)
            .is_some_and(|votes| votes.contains_key(user))
    }

    fn votes(&self, item: &ItemKey) -> RatingVotes {
        let mut votes = RatingVotes::default();
        if let Some(by_user) = self.ratings.read().get(item) {
            by_user.values().for_each(|rating| votes.record(*rating));
        }
        votes
    }
}
