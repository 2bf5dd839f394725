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

use crate::cluster;
use crate::config::Config;
use crate::sampling::{self, Granularity, Partition, Sampler, Splitter};
use crate::types::{ItemProfile, Signal, UserItemStat, UserPair};

/// Minimum frequency similarity for a pair to count as a ground truth match.
pub const MATCH_MIN_FREQ_SIM: f64 = 0.5;
/// Maximum rating distance for a pair to count as a ground truth match.
pub const MATCH_MAX_RATING_DIST: f64 = 0.2;

/// Ratio of the smaller to the larger visit count, in `(0, 1]`.
#[inline]
pub fn freq_sim(visits_a: u32, visits_b: u32) -> f64 {
    let smaller = std::cmp::min(visits_a, visits_b) as f64;
    let larger = std::cmp::max(visits_a, visits_b) as f64;
    smaller / larger
}

/// Absolute difference of the average ratings, normalized by the top of the rating scale.
#[inline]
pub fn rating_dist(avg_rating_a: f64, avg_rating_b: f64, scale_max: f64) -> f64 {
    (avg_rating_a - avg_rating_b).abs() / scale_max
}

/// Agreement in visit frequency raises the affinity, distance in ratings lowers it.
#[inline]
pub fn affinity(freq_sim: f64, rating_dist: f64, weight: f64) -> f64 {
    weight * freq_sim + (weight - 1.0) * rating_dist
}

#[inline]
pub fn is_match(freq_sim: f64, rating_dist: f64) -> bool {
    freq_sim >= MATCH_MIN_FREQ_SIM && rating_dist <= MATCH_MAX_RATING_DIST
}

/// Similarity signals of two users on one shared item.
#[derive(Clone, Debug, PartialEq)]
pub struct PairScore {
    pub pair: UserPair,
    pub freq_sim: f64,
    pub rating_dist: f64,
}

impl PairScore {

    pub fn of(stat_a: &UserItemStat, stat_b: &UserItemStat, scale_max: f64) -> Self {
        PairScore {
            pair: UserPair::new(&stat_a.user_id, &stat_b.user_id),
            freq_sim: freq_sim(stat_a.visit_count, stat_b.visit_count),
            rating_dist: rating_dist(stat_a.avg_rating, stat_b.avg_rating, scale_max),
        }
    }

    pub fn affinity(&self, weight: f64) -> f64 {
        affinity(self.freq_sim, self.rating_dist, weight)
    }

    pub fn is_match(&self) -> bool {
        is_match(self.freq_sim, self.rating_dist)
    }
}

/// Scores all unordered pairs of distinct users in the profile.
pub fn pair_scores(profile: &ItemProfile, scale_max: f64) -> Vec<PairScore> {
    let stats = &profile.stats;
    let mut scores = Vec::with_capacity(stats.len() * stats.len().saturating_sub(1) / 2);

    for (index, stat_a) in stats.iter().enumerate() {
        for stat_b in stats[index + 1..].iter() {
            if stat_a.user_id != stat_b.user_id {
                scores.push(PairScore::of(stat_a, stat_b, scale_max));
            }
        }
    }

    scores
}

/// What the training partition of an item turns into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScoringMode {
    /// Per pair affinity scores, each pair is split independently.
    Ranking,
    /// Per item sub-clusters of qualifying users, the whole item is split at once.
    Clustering { freq_threshold: u32, star_threshold: f64 },
}

impl ScoringMode {

    pub fn granularity(&self) -> Granularity {
        match *self {
            ScoringMode::Ranking => Granularity::PerPair,
            ScoringMode::Clustering { .. } => Granularity::PerItem,
        }
    }
}

/// Turns item profiles into tagged training and test signals.
pub struct SimilarityScorer<'a> {
    mode: ScoringMode,
    weight: f64,
    scale_max: f64,
    splitter: Splitter<'a>,
}

impl<'a> SimilarityScorer<'a> {

    pub fn for_ranking(config: &Config, sampler: &'a dyn Sampler) -> Self {
        SimilarityScorer::new(ScoringMode::Ranking, config, sampler)
    }

    pub fn for_clustering(config: &Config, sampler: &'a dyn Sampler) -> Self {
        let mode = ScoringMode::Clustering {
            freq_threshold: config.freq_threshold,
            star_threshold: config.star_threshold,
        };
        SimilarityScorer::new(mode, config, sampler)
    }

    fn new(mode: ScoringMode, config: &Config, sampler: &'a dyn Sampler) -> Self {
        SimilarityScorer {
            mode,
            weight: config.weight,
            scale_max: config.rating_scale_max,
            splitter: Splitter::new(config.split_ratio, sampler),
        }
    }

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    pub fn score(&self, profile: &ItemProfile) -> Vec<Signal> {
        match self.mode {
            ScoringMode::Ranking => self.score_per_pair(profile),
            ScoringMode::Clustering { freq_threshold, star_threshold } =>
                self.score_per_item(profile, freq_threshold, star_threshold),
        }
    }

    fn score_per_pair(&self, profile: &ItemProfile) -> Vec<Signal> {
        pair_scores(profile, self.scale_max)
            .into_iter()
            .map(|score| {
                let unit = sampling::pair_unit(
                    &profile.item_id, &score.pair.user_a, &score.pair.user_b);

                match self.splitter.assign(&unit) {
                    Partition::Training => {
                        let affinity = score.affinity(self.weight);
                        Signal::Training { pair: score.pair, affinity }
                    },
                    Partition::Test => {
                        let is_match = score.is_match();
                        Signal::Test { pair: score.pair, is_match }
                    },
                }
            })
            .collect()
    }

    fn score_per_item(
        &self,
        profile: &ItemProfile,
        freq_threshold: u32,
        star_threshold: f64,
    ) -> Vec<Signal> {
        match self.splitter.assign(&profile.item_id) {
            Partition::Training => {
                let members = cluster::sub_cluster(profile, freq_threshold, star_threshold);
                vec![Signal::SubCluster { item_id: profile.item_id.clone(), members }]
            },
            Partition::Test => test_signals(profile, self.scale_max),
        }
    }
}

/// Ground truth labels for all pairs of an item.
pub fn test_signals(profile: &ItemProfile, scale_max: f64) -> Vec<Signal> {
    pair_scores(profile, scale_max)
        .into_iter()
        .map(|score| {
            let is_match = score.is_match();
            Signal::Test { pair: score.pair, is_match }
        })
        .collect()
}

/// Affinity scores for all pairs of an item, without any train/test split.
pub fn affinity_signals(profile: &ItemProfile, weight: f64, scale_max: f64) -> Vec<Signal> {
    pair_scores(profile, scale_max)
        .into_iter()
        .map(|score| {
            let affinity = score.affinity(weight);
            Signal::Training { pair: score.pair, affinity }
        })
        .collect()
}
