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

use fnv::{FnvHashMap, FnvHashSet};
use scoped_pool::Pool;
use tracing::trace;

use crate::shuffle;
use crate::types::{ItemProfile, MatchCounts, PairCounts, Signal, UserPair};

/// Users of an item that visited it at least `freq_threshold` times and rated it at least
/// `star_threshold` on average, in profile order.
pub fn sub_cluster(profile: &ItemProfile, freq_threshold: u32, star_threshold: f64) -> Vec<String> {
    profile.stats.iter()
        .filter(|stat| stat.visit_count >= freq_threshold && stat.avg_rating >= star_threshold)
        .map(|stat| stat.user_id.clone())
        .collect()
}

/// Every unordered pair of distinct members, each emitted exactly once.
fn member_pairs(members: &[String]) -> Vec<UserPair> {
    let distinct: FnvHashSet<&str> = members.iter().map(|member| member.as_str()).collect();
    let mut distinct: Vec<&str> = distinct.into_iter().collect();
    distinct.sort();

    let mut pairs = Vec::with_capacity(distinct.len() * distinct.len().saturating_sub(1) / 2);
    for (index, user_a) in distinct.iter().enumerate() {
        for user_b in distinct[index + 1..].iter() {
            pairs.push(UserPair::new(user_a, user_b));
        }
    }

    pairs
}

/// Number of sub-clusters each pair of users appeared in together.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoOccurrenceCounts {
    counts: FnvHashMap<UserPair, u32>,
}

impl CoOccurrenceCounts {

    /// Counts over all sub-cluster signals. Every partition of the signals folds its sub-clusters
    /// into a partial count, the partials are then merged by addition.
    pub fn from_signals(pool: &Pool, num_partitions: usize, signals: &[Signal]) -> Self {

        let partials = shuffle::fold_partitions(pool, num_partitions, signals,
            |mut counts: CoOccurrenceCounts, signal| {
                if let Signal::SubCluster { item_id, members } = signal {
                    trace!(item_id = %item_id, num_members = members.len(), "sub-cluster");
                    counts.add_sub_cluster(members);
                }
                counts
            });

        partials.into_iter().fold(CoOccurrenceCounts::default(), CoOccurrenceCounts::merge)
    }

    /// One increment for every distinct pair of members.
    pub fn add_sub_cluster(&mut self, members: &[String]) {
        for pair in member_pairs(members) {
            *self.counts.entry(pair).or_insert(0) += 1;
        }
    }

    pub fn count(&self, pair: &UserPair) -> u32 {
        self.counts.get(pair).cloned().unwrap_or(0)
    }

    pub fn num_pairs(&self) -> usize {
        self.counts.len()
    }

    /// Adds the counts of another partial result.
    pub fn merge(mut self, other: CoOccurrenceCounts) -> Self {
        for (pair, count) in other.counts.into_iter() {
            *self.counts.entry(pair).or_insert(0) += count;
        }
        self
    }

    /// Pairs whose count reaches `times_threshold`.
    pub fn admit(&self, times_threshold: u32) -> AdmittedPairs {
        let pairs = self.counts.iter()
            .filter(|(_, count)| **count >= times_threshold)
            .map(|(pair, _)| pair.clone())
            .collect();

        AdmittedPairs { pairs }
    }
}

/// The final clustering, an edge set over users. Membership is pairwise, there is no implied
/// transitivity between admitted pairs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdmittedPairs {
    pairs: FnvHashSet<UserPair>,
}

impl AdmittedPairs {

    pub fn contains(&self, pair: &UserPair) -> bool {
        self.pairs.contains(pair)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Admitted pairs in canonical order.
    pub fn sorted(&self) -> Vec<&UserPair> {
        let mut pairs: Vec<&UserPair> = self.pairs.iter().collect();
        pairs.sort();
        pairs
    }

    /// Merges the admitted pairs into connected components with a union-find. Only used for
    /// reporting, evaluation works on the pairwise edges.
    pub fn components(&self) -> Vec<Vec<String>> {

        let mut index_of: FnvHashMap<&str, usize> = FnvHashMap::default();
        let mut users: Vec<&str> = Vec::new();

        for pair in self.sorted() {
            for &user in [pair.user_a.as_str(), pair.user_b.as_str()].iter() {
                if !index_of.contains_key(user) {
                    index_of.insert(user, users.len());
                    users.push(user);
                }
            }
        }

        let mut parents: Vec<usize> = (0..users.len()).collect();

        for pair in self.pairs.iter() {
            let root_a = find(&mut parents, index_of[pair.user_a.as_str()]);
            let root_b = find(&mut parents, index_of[pair.user_b.as_str()]);
            if root_a != root_b {
                let (low, high) = if root_a < root_b { (root_a, root_b) } else { (root_b, root_a) };
                parents[high] = low;
            }
        }

        let mut members_by_root: FnvHashMap<usize, Vec<String>> = FnvHashMap::default();
        for index in 0..users.len() {
            let root = find(&mut parents, index);
            members_by_root.entry(root).or_insert_with(Vec::new).push(users[index].to_string());
        }

        let mut components: Vec<Vec<String>> = members_by_root.into_iter()
            .map(|(_, mut members)| {
                members.sort();
                members
            })
            .collect();
        components.sort();

        components
    }
}

fn find(parents: &mut Vec<usize>, index: usize) -> usize {
    let mut root = index;
    while parents[root] != root {
        root = parents[root];
    }

    let mut current = index;
    while parents[current] != root {
        let next = parents[current];
        parents[current] = root;
        current = next;
    }

    root
}

/// Ground truth counts per pair, from the test signals of all items.
pub fn test_counts(pool: &Pool, num_partitions: usize, signals: &[Signal]) -> PairCounts {

    let labels = signals.iter().filter_map(|signal| match signal {
        Signal::Test { pair, is_match } => Some((pair.clone(), *is_match)),
        _ => None,
    });

    let by_pair = shuffle::group_by_key(labels);

    shuffle::reduce_by_key(pool, num_partitions, by_pair, |pair: &UserPair, labels| {
        let mut counts = MatchCounts::default();
        for is_match in labels.iter() {
            counts.observe(*is_match);
        }
        vec![(pair.clone(), counts)]
    })
    .into_iter()
    .collect()
}
