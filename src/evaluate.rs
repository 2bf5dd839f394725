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

use crate::cluster::AdmittedPairs;
use crate::neighbors;
use crate::types::{AccuracyResult, MatchCounts, NeighborList, PairCounts, PairSummary, UserPair,
                   UNDEFINED_ACCURACY};

/// Share of matches among the evaluated pairs, or the sentinel if nothing was evaluated.
pub fn accuracy(counts: MatchCounts) -> f64 {
    if counts.eval_count == 0 {
        UNDEFINED_ACCURACY
    } else {
        counts.match_count as f64 / counts.eval_count as f64
    }
}

/// The baseline predicts every pair to be similar, so it is scored on all test pairs. The model
/// is scored on the test pairs it selected.
pub fn evaluate<'a, I, S>(test_counts: I, is_selected: S) -> AccuracyResult
    where I: IntoIterator<Item=(&'a UserPair, &'a MatchCounts)>, S: Fn(&UserPair) -> bool {

    let mut all = MatchCounts::default();
    let mut selected = MatchCounts::default();

    for (pair, counts) in test_counts {
        all += *counts;
        if is_selected(pair) {
            selected += *counts;
        }
    }

    AccuracyResult { baseline: accuracy(all), model: accuracy(selected) }
}

/// A test pair counts for the model if it is among the top-k neighbors of either of its users.
pub fn evaluate_neighbors(
    summaries: &[(UserPair, PairSummary)],
    neighbor_lists: &[NeighborList],
    k: usize,
) -> AccuracyResult {

    let recommended = neighbors::top_k_pairs(neighbor_lists, k);

    evaluate(
        summaries.iter().map(|(pair, summary)| (pair, &summary.counts)),
        |pair| recommended.contains(pair))
}

/// A test pair counts for the model if it is an admitted cluster pair.
pub fn evaluate_clusters(test_counts: &PairCounts, admitted: &AdmittedPairs) -> AccuracyResult {
    evaluate(test_counts.iter(), |pair| admitted.contains(pair))
}


#[cfg(test)]
mod tests {

    use fnv::FnvHashMap;
    use scoped_pool::Pool;

    use super::*;
    use crate::cluster::CoOccurrenceCounts;
    use crate::types::{MatchCounts, PairSummary, Signal, UserPair, UNDEFINED_ACCURACY};

    fn counts(match_count: u64, eval_count: u64) -> MatchCounts {
        MatchCounts { match_count, eval_count }
    }

    #[test]
    fn empty_denominators_yield_the_sentinel() {
        let mut test_counts: PairCounts = FnvHashMap::default();
        test_counts.insert(UserPair::new("a", "b"), counts(0, 0));
        test_counts.insert(UserPair::new("a", "c"), counts(0, 0));

        let result = evaluate(test_counts.iter(), |_| true);

        assert_eq!(result.baseline, UNDEFINED_ACCURACY);
        assert_eq!(result.model, UNDEFINED_ACCURACY);

        let nothing: PairCounts = FnvHashMap::default();
        let result = evaluate(nothing.iter(), |_| true);
        assert_eq!(result, AccuracyResult { baseline: -1.0, model: -1.0 });
    }

    #[test]
    fn model_only_sees_selected_pairs() {
        let mut test_counts: PairCounts = FnvHashMap::default();
        test_counts.insert(UserPair::new("a", "b"), counts(3, 4));
        test_counts.insert(UserPair::new("a", "c"), counts(0, 4));

        let result = evaluate(test_counts.iter(), |pair| *pair == UserPair::new("b", "a"));

        assert!((result.baseline - 3.0 / 8.0).abs() < 1e-12);
        assert!((result.model - 0.75).abs() < 1e-12);

        let result = evaluate(test_counts.iter(), |_| false);
        assert_eq!(result.model, UNDEFINED_ACCURACY);
    }

    #[test]
    fn admitted_pairs_without_test_signals_contribute_nothing() {
        let pool = Pool::new(2);

        let signals = vec![
            Signal::SubCluster {
                item_id: "B1".to_string(),
                members: vec!["a".to_string(), "b".to_string()],
            },
        ];
        let admitted = CoOccurrenceCounts::from_signals(&pool, 2, &signals).admit(1);
        assert!(admitted.contains(&UserPair::new("a", "b")));

        let mut test_counts: PairCounts = FnvHashMap::default();
        test_counts.insert(UserPair::new("a", "c"), counts(1, 2));

        let result = evaluate_clusters(&test_counts, &admitted);

        assert!((result.baseline - 0.5).abs() < 1e-12);
        assert_eq!(result.model, UNDEFINED_ACCURACY);

        pool.shutdown();
    }

    #[test]
    fn neighbors_restrict_the_model() {
        let pool = Pool::new(2);

        let summaries = vec![
            (UserPair::new("a", "b"), PairSummary { sum_affinity: 2.0, counts: counts(1, 1) }),
            (UserPair::new("a", "c"), PairSummary { sum_affinity: 0.5, counts: counts(0, 3) }),
            (UserPair::new("c", "d"), PairSummary { sum_affinity: 1.0, counts: counts(0, 0) }),
        ];

        let lists = crate::neighbors::neighbor_lists(&pool, 2, &summaries);

        // a and b pick each other, so do c and d
        let result = evaluate_neighbors(&summaries, &lists, 1);

        assert!((result.baseline - 0.25).abs() < 1e-12);
        assert!((result.model - 1.0).abs() < 1e-12);

        let result = evaluate_neighbors(&summaries, &lists, 2);
        assert!((result.model - 0.25).abs() < 1e-12);

        pool.shutdown();
    }
}
