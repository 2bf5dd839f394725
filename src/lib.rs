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

use std::time::Instant;

use scoped_pool::Pool;
use tracing::{debug, info};

pub mod aggregate;
pub mod cluster;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod io;
pub mod neighbors;
pub mod sampling;
pub mod shuffle;
pub mod similarity;
pub mod stats;
pub mod types;
pub mod utils;

mod usage_tests;

pub use crate::config::Config;
pub use crate::error::{Error, Result};

use crate::cluster::{AdmittedPairs, CoOccurrenceCounts};
use crate::sampling::{Sampler, SeededSampler, ThreadRngSampler};
use crate::similarity::SimilarityScorer;
use crate::types::{AccuracyResult, Event, Neighbor, NeighborList, PairCounts, PairSummary, Signal,
                   UserPair};

/// Result of a run in ranking mode.
pub struct RankingOutcome {
    pub accuracy: AccuracyResult,
    pub summaries: Vec<(UserPair, PairSummary)>,
    pub neighbor_lists: Vec<NeighborList>,
}

/// Result of a run in clustering mode.
pub struct ClusteringOutcome {
    pub accuracy: AccuracyResult,
    pub admitted: AdmittedPairs,
    pub test_counts: PairCounts,
}

/// The train/test split is reproducible if the configuration carries a seed.
pub fn sampler_for(config: &Config) -> Box<dyn Sampler> {
    match config.seed {
        Some(seed) => Box::new(SeededSampler::new(seed)),
        None => Box::new(ThreadRngSampler),
    }
}

/// Ranks the users most similar to each user by their summed affinity on co-visited items and
/// evaluates the top-k neighbors against held-out pairs.
pub fn rank<I>(events: I, config: &Config) -> Result<RankingOutcome>
    where I: IntoIterator<Item=Event> {

    let sampler = sampler_for(config);
    rank_with_sampler(events, config, sampler.as_ref())
}

pub fn rank_with_sampler<I>(
    events: I,
    config: &Config,
    sampler: &dyn Sampler,
) -> Result<RankingOutcome>
    where I: IntoIterator<Item=Event> {

    config.validate()?;

    let pool = Pool::new(config.num_threads);
    let num_partitions = config.num_threads;
    let start = Instant::now();

    let scorer = SimilarityScorer::for_ranking(config, sampler);
    let signals = score(&pool, num_partitions, events, &scorer);

    let summaries = neighbors::pair_summaries(&pool, num_partitions, signals);
    info!(num_pairs = summaries.len(), "reduced signals per user pair");

    let neighbor_lists = neighbors::neighbor_lists(&pool, num_partitions, &summaries);
    info!(num_users = neighbor_lists.len(), "sorted neighbor lists");

    let accuracy = evaluate::evaluate_neighbors(&summaries, &neighbor_lists, config.top_k);

    pool.shutdown();

    info!(
        "Ranking finished in {}ms, baseline accuracy {}, top-{} accuracy {}",
        utils::to_millis(start.elapsed()),
        accuracy.baseline,
        config.top_k,
        accuracy.model
    );

    Ok(RankingOutcome { accuracy, summaries, neighbor_lists })
}

/// Groups users that repeatedly show up together among the happy regulars of items and
/// evaluates the admitted pairs against held-out items.
pub fn cluster<I>(events: I, config: &Config) -> Result<ClusteringOutcome>
    where I: IntoIterator<Item=Event> {

    let sampler = sampler_for(config);
    cluster_with_sampler(events, config, sampler.as_ref())
}

pub fn cluster_with_sampler<I>(
    events: I,
    config: &Config,
    sampler: &dyn Sampler,
) -> Result<ClusteringOutcome>
    where I: IntoIterator<Item=Event> {

    config.validate()?;

    let pool = Pool::new(config.num_threads);
    let num_partitions = config.num_threads;
    let start = Instant::now();

    let scorer = SimilarityScorer::for_clustering(config, sampler);
    let signals = score(&pool, num_partitions, events, &scorer);

    let co_occurrences = CoOccurrenceCounts::from_signals(&pool, num_partitions, &signals);
    let admitted = co_occurrences.admit(config.times_threshold);
    info!(
        num_pairs = co_occurrences.num_pairs(),
        num_admitted = admitted.len(),
        "counted sub-cluster co-occurrences"
    );

    let test_counts = cluster::test_counts(&pool, num_partitions, &signals);
    let accuracy = evaluate::evaluate_clusters(&test_counts, &admitted);

    pool.shutdown();

    info!(
        "Clustering finished in {}ms, baseline accuracy {}, cluster accuracy {}",
        utils::to_millis(start.elapsed()),
        accuracy.baseline,
        accuracy.model
    );

    Ok(ClusteringOutcome { accuracy, admitted, test_counts })
}

/// The single most similar other user for every user, scored on all co-visited items without
/// holding anything out.
pub fn most_similar_users<I>(events: I, config: &Config) -> Result<Vec<(String, Neighbor)>>
    where I: IntoIterator<Item=Event> {

    config.validate()?;

    let pool = Pool::new(config.num_threads);
    let num_partitions = config.num_threads;

    let profiles = aggregate::aggregate(&pool, num_partitions, events);
    debug!(num_items = profiles.len(), "aggregated item profiles");

    let signals = shuffle::flat_map(&pool, num_partitions, &profiles, |profile| {
        similarity::affinity_signals(profile, config.weight, config.rating_scale_max)
    });

    let summaries = neighbors::pair_summaries(&pool, num_partitions, signals);
    let neighbor_lists = neighbors::neighbor_lists(&pool, num_partitions, &summaries);

    pool.shutdown();

    Ok(neighbors::most_similar(&neighbor_lists))
}

fn score<I>(
    pool: &Pool,
    num_partitions: usize,
    events: I,
    scorer: &SimilarityScorer,
) -> Vec<Signal>
    where I: IntoIterator<Item=Event> {

    let profiles = aggregate::aggregate(pool, num_partitions, events);
    debug!(num_items = profiles.len(), "aggregated item profiles");

    let signals = shuffle::flat_map(pool, num_partitions, &profiles, |profile| {
        scorer.score(profile)
    });
    debug!(
        num_signals = signals.len(),
        granularity = ?scorer.mode().granularity(),
        "scored user pairs"
    );

    signals
}
