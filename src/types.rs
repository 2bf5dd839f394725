/**
 * CoSim
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::cmp::Ordering;
use std::ops::{Add, AddAssign};

use fnv::FnvHashMap;
use serde_derive::Serialize;

/// A single observed rating of an item by a user.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub user_id: String,
    pub item_id: String,
    pub rating: f64,
}

impl Event {
    pub fn new(user_id: &str, item_id: &str, rating: f64) -> Self {
        Event { user_id: user_id.to_string(), item_id: item_id.to_string(), rating }
    }
}

/// Mean rating and number of visits of one user for one item.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserItemStat {
    pub user_id: String,
    pub item_id: String,
    pub avg_rating: f64,
    pub visit_count: u32,
}

/// All users that rated an item, with their per-item statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemProfile {
    pub item_id: String,
    pub stats: Vec<UserItemStat>,
}

/// Unordered pair of users, always stored with `user_a < user_b`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UserPair {
    pub user_a: String,
    pub user_b: String,
}

impl UserPair {

    /// Canonicalizes the pair, so that `(a, b)` and `(b, a)` share one key.
    pub fn new(first: &str, second: &str) -> Self {
        if first <= second {
            UserPair { user_a: first.to_string(), user_b: second.to_string() }
        } else {
            UserPair { user_a: second.to_string(), user_b: first.to_string() }
        }
    }

    /// The member of the pair which is not `user`.
    pub fn partner_of(&self, user: &str) -> Option<&str> {
        if self.user_a == user {
            Some(&self.user_b)
        } else if self.user_b == user {
            Some(&self.user_a)
        } else {
            None
        }
    }
}

/// Intermediate records flowing between the scoring stage and its consumers. Every record
/// carries its tag explicitly, consumers skip tags they have no use for.
#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    Training { pair: UserPair, affinity: f64 },
    Test { pair: UserPair, is_match: bool },
    SubCluster { item_id: String, members: Vec<String> },
}

impl Signal {

    /// The pair a signal is keyed by, sub-clusters are keyed by their item instead.
    pub fn pair(&self) -> Option<&UserPair> {
        match self {
            Signal::Training { pair, .. } | Signal::Test { pair, .. } => Some(pair),
            Signal::SubCluster { .. } => None,
        }
    }
}

/// Number of ground truth matches among a number of evaluated pairs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MatchCounts {
    pub match_count: u64,
    pub eval_count: u64,
}

impl MatchCounts {

    pub fn observe(&mut self, is_match: bool) {
        if is_match {
            self.match_count += 1;
        }
        self.eval_count += 1;
    }
}

impl Add for MatchCounts {
    type Output = MatchCounts;

    fn add(self, other: MatchCounts) -> MatchCounts {
        MatchCounts {
            match_count: self.match_count + other.match_count,
            eval_count: self.eval_count + other.eval_count,
        }
    }
}

impl AddAssign for MatchCounts {
    fn add_assign(&mut self, other: MatchCounts) {
        self.match_count += other.match_count;
        self.eval_count += other.eval_count;
    }
}

/// Reduction of all signals observed for one pair of users.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PairSummary {
    pub sum_affinity: f64,
    pub counts: MatchCounts,
}

/// Another user together with the summary of the pair it forms with the list owner.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Neighbor {
    pub user_id: String,
    pub score: f64,
    pub counts: MatchCounts,
}

/// Descending by score, ties by ascending user id. There is no total order on floating point
/// numbers, so incomparable scores are treated as equal.
pub fn cmp_neighbors(neighbor_a: &Neighbor, neighbor_b: &Neighbor) -> Ordering {
    match neighbor_b.score.partial_cmp(&neighbor_a.score) {
        Some(Ordering::Equal) | None => neighbor_a.user_id.cmp(&neighbor_b.user_id),
        Some(ordering) => ordering,
    }
}

/// Neighbors of a user, sorted descending by score.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NeighborList {
    pub user_id: String,
    pub neighbors: Vec<Neighbor>,
}

impl NeighborList {

    pub fn top_k(&self, k: usize) -> &[Neighbor] {
        let end = std::cmp::min(k, self.neighbors.len());
        &self.neighbors[..end]
    }
}

/// Sentinel for a ratio whose denominator is zero.
pub const UNDEFINED_ACCURACY: f64 = -1.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AccuracyResult {
    pub baseline: f64,
    pub model: f64,
}

pub type PairCounts = FnvHashMap<UserPair, MatchCounts>;
