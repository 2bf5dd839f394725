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

use fnv::FnvHashSet;
use scoped_pool::Pool;

use crate::shuffle;
use crate::types::{cmp_neighbors, Neighbor, NeighborList, PairSummary, Signal, UserPair};

/// Sums the training affinities and counts the test labels observed for a pair.
pub fn summarize(signals: &[Signal]) -> PairSummary {
    let mut summary = PairSummary::default();

    for signal in signals {
        match *signal {
            Signal::Training { affinity, .. } => summary.sum_affinity += affinity,
            Signal::Test { is_match, .. } => summary.counts.observe(is_match),
            Signal::SubCluster { .. } => {},
        }
    }

    summary
}

/// Groups pair-keyed signals across all items and reduces them per pair. Signals without a pair
/// key are skipped.
pub fn pair_summaries<I>(
    pool: &Pool,
    num_partitions: usize,
    signals: I,
) -> Vec<(UserPair, PairSummary)>
    where I: IntoIterator<Item=Signal> {

    let by_pair = shuffle::group_by_key(
        signals.into_iter()
            .filter_map(|signal| signal.pair().cloned().map(|pair| (pair, signal))));

    shuffle::reduce_by_key(pool, num_partitions, by_pair, |pair: &UserPair, signals| {
        vec![(pair.clone(), summarize(signals))]
    })
}

/// Re-keys every pair under both of its users and sorts the partners of each user descending
/// by their summed affinity.
pub fn neighbor_lists(
    pool: &Pool,
    num_partitions: usize,
    summaries: &[(UserPair, PairSummary)],
) -> Vec<NeighborList> {

    let by_user = shuffle::group_by_key(
        summaries.iter().flat_map(|(pair, summary)| {
            let for_a = (pair.user_a.clone(), neighbor(&pair.user_b, summary));
            let for_b = (pair.user_b.clone(), neighbor(&pair.user_a, summary));
            vec![for_a, for_b]
        }));

    shuffle::reduce_by_key(pool, num_partitions, by_user, |user_id: &String, neighbors| {
        let mut neighbors = neighbors.to_vec();
        neighbors.sort_by(cmp_neighbors);
        vec![NeighborList { user_id: user_id.clone(), neighbors }]
    })
}

fn neighbor(user_id: &str, summary: &PairSummary) -> Neighbor {
    Neighbor {
        user_id: user_id.to_string(),
        score: summary.sum_affinity,
        counts: summary.counts,
    }
}

/// Pairs formed by each user and the first `k` entries of its neighbor list.
pub fn top_k_pairs(neighbor_lists: &[NeighborList], k: usize) -> FnvHashSet<UserPair> {
    neighbor_lists.iter()
        .flat_map(|list| {
            list.top_k(k).iter()
                .map(move |neighbor| UserPair::new(&list.user_id, &neighbor.user_id))
        })
        .collect()
}

/// The single most similar partner of every user.
pub fn most_similar(neighbor_lists: &[NeighborList]) -> Vec<(String, Neighbor)> {
    neighbor_lists.iter()
        .filter_map(|list| {
            list.neighbors.first().map(|best| (list.user_id.clone(), best.clone()))
        })
        .collect()
}
