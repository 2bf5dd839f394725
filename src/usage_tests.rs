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

#[cfg(test)]
mod tests {

    use crate::io;
    use crate::sampling::Sampler;
    use crate::types::{Event, UserPair, UNDEFINED_ACCURACY};
    use crate::{cluster_with_sampler, most_similar_users, rank, rank_with_sampler, Config};

    /// Holds out every item whose name starts with `T`, and nothing else.
    struct HoldOutTestItems;

    impl Sampler for HoldOutTestItems {
        fn draw(&self, unit: &str) -> f64 {
            if unit.starts_with('T') { 0.9 } else { 0.1 }
        }
    }

    const INTERACTIONS: &str = "user_id,business_id,stars\n\
                                alice,B1,5.0\n\
                                bob,B1,5.0\n\
                                carol,B1,1.0\n\
                                alice,B2,4.0\n\
                                bob,B2,4.0\n\
                                alice,T1,5.0\n\
                                bob,T1,5.0\n\
                                carol,T1,2.0\n\
                                this line is broken\n";

    fn interactions() -> Vec<Event> {
        let mut reader = io::csv_reader_from(INTERACTIONS.as_bytes());
        io::events_from_csv(&mut reader).collect()
    }

    fn config() -> Config {
        Config { num_threads: 2, top_k: 1, ..Config::default() }
    }

    #[test]
    fn ranking_beats_the_baseline() {

        let outcome = rank_with_sampler(interactions(), &config(), &HoldOutTestItems).unwrap();

        assert!((outcome.accuracy.baseline - 1.0 / 3.0).abs() < 1e-9);
        assert!((outcome.accuracy.model - 0.5).abs() < 1e-9);

        let alice_bob = outcome.summaries.iter()
            .find(|(pair, _)| *pair == UserPair::new("bob", "alice"))
            .map(|(_, summary)| *summary)
            .unwrap();
        assert!((alice_bob.sum_affinity - 1.4).abs() < 1e-9);
        assert_eq!(alice_bob.counts.match_count, 1);
        assert_eq!(alice_bob.counts.eval_count, 1);

        let carol = outcome.neighbor_lists.iter().find(|list| list.user_id == "carol").unwrap();
        assert_eq!(carol.top_k(1)[0].user_id, "alice");
    }

    #[test]
    fn clustering_admits_regulars_of_training_items() {

        let outcome = cluster_with_sampler(interactions(), &config(), &HoldOutTestItems).unwrap();

        assert_eq!(outcome.admitted.len(), 1);
        assert!(outcome.admitted.contains(&UserPair::new("alice", "bob")));
        assert_eq!(outcome.admitted.components(), vec![vec!["alice", "bob"]]);
        assert_eq!(outcome.test_counts.len(), 3);

        assert!((outcome.accuracy.baseline - 1.0 / 3.0).abs() < 1e-9);
        assert!((outcome.accuracy.model - 1.0).abs() < 1e-9);

        let strict = Config { times_threshold: 3, ..config() };
        let outcome = cluster_with_sampler(interactions(), &strict, &HoldOutTestItems).unwrap();

        assert!(outcome.admitted.is_empty());
        assert_eq!(outcome.accuracy.model, UNDEFINED_ACCURACY);
    }

    #[test]
    fn nothing_held_out_means_undefined_accuracy() {
        struct KeepEverything;

        impl Sampler for KeepEverything {
            fn draw(&self, _unit: &str) -> f64 { 0.0 }
        }

        let outcome = rank_with_sampler(interactions(), &config(), &KeepEverything).unwrap();

        assert_eq!(outcome.accuracy.baseline, UNDEFINED_ACCURACY);
        assert_eq!(outcome.accuracy.model, UNDEFINED_ACCURACY);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let seeded = Config { seed: Some(1234), top_k: 3, ..config() };

        let first = rank(interactions(), &seeded).unwrap();
        let second = rank(interactions(), &seeded).unwrap();

        assert_eq!(first.accuracy, second.accuracy);

        for accuracy in &[first.accuracy.baseline, first.accuracy.model] {
            assert!(*accuracy == UNDEFINED_ACCURACY || (*accuracy >= 0.0 && *accuracy <= 1.0));
        }
    }

    #[test]
    fn finds_the_most_similar_user() {
        let mut most_similar = most_similar_users(interactions(), &config()).unwrap();
        most_similar.sort_by(|a, b| a.0.cmp(&b.0));

        let pairs: Vec<(&str, &str)> = most_similar.iter()
            .map(|(user, neighbor)| (user.as_str(), neighbor.user_id.as_str()))
            .collect();

        assert_eq!(pairs, vec![("alice", "bob"), ("bob", "alice"), ("carol", "alice")]);
        assert!((most_similar[0].1.score - 2.1).abs() < 1e-9);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let broken = Config { weight: 2.0, ..config() };
        assert!(rank(interactions(), &broken).is_err());
    }
}
