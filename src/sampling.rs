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

use std::hash::Hasher;

use fnv::FnvHasher;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform random values in `[0, 1)`, one draw per evaluated unit.
pub trait Sampler: Sync {
    fn draw(&self, unit: &str) -> f64;
}

/// Fresh randomness for every draw, runs over the same input are not reproducible.
pub struct ThreadRngSampler;

impl Sampler for ThreadRngSampler {
    fn draw(&self, _unit: &str) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Derives the draw from a hash of the seed and the unit, so that a unit always ends up in the
/// same partition, independent of which worker processes it and in which order.
pub struct SeededSampler {
    seed: u64,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        SeededSampler { seed }
    }
}

impl Sampler for SeededSampler {
    fn draw(&self, unit: &str) -> f64 {
        let mut hasher = FnvHasher::default();
        hasher.write_u64(self.seed);
        hasher.write(unit.as_bytes());

        let mut rng = StdRng::seed_from_u64(hasher.finish());
        rng.gen::<f64>()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Partition {
    Training,
    Test,
}

/// Unit of the train/test assignment. With `PerPair`, every user pair on every item is assigned
/// independently. With `PerItem`, one draw decides for all pairs derived from an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Granularity {
    PerPair,
    PerItem,
}

pub struct Splitter<'a> {
    split_ratio: f64,
    sampler: &'a dyn Sampler,
}

impl<'a> Splitter<'a> {

    pub fn new(split_ratio: f64, sampler: &'a dyn Sampler) -> Self {
        Splitter { split_ratio, sampler }
    }

    pub fn assign(&self, unit: &str) -> Partition {
        if self.sampler.draw(unit) <= self.split_ratio {
            Partition::Training
        } else {
            Partition::Test
        }
    }
}

/// Unit name for a pair of users on an item.
pub fn pair_unit(item_id: &str, user_a: &str, user_b: &str) -> String {
    format!("{}\u{1f}{}\u{1f}{}", item_id, user_a, user_b)
}


#[cfg(test)]
pub mod tests {

    use super::*;

    /// Always draws the same value, handy to force every unit into one partition.
    pub struct FixedSampler(pub f64);

    impl Sampler for FixedSampler {
        fn draw(&self, _unit: &str) -> f64 {
            self.0
        }
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let sampler = SeededSampler::new(42);

        for unit in &["item_a", "item_b", "item_c"] {
            let first = sampler.draw(unit);
            let second = sampler.draw(unit);
            assert_eq!(first, second);
            assert!(first >= 0.0 && first < 1.0);
        }

        let other_seed = SeededSampler::new(43);
        let differs = (0..20)
            .map(|n| format!("item_{}", n))
            .any(|unit| sampler.draw(&unit) != other_seed.draw(&unit));
        assert!(differs);
    }

    #[test]
    fn unseeded_draws_are_in_range() {
        let sampler = ThreadRngSampler;
        for _ in 0..1000 {
            let r = sampler.draw("unit");
            assert!(r >= 0.0 && r < 1.0);
        }
    }

    #[test]
    fn split_boundary_is_inclusive() {
        let at_ratio = FixedSampler(0.7);
        assert_eq!(Splitter::new(0.7, &at_ratio).assign("x"), Partition::Training);

        let above_ratio = FixedSampler(0.71);
        assert_eq!(Splitter::new(0.7, &above_ratio).assign("x"), Partition::Test);
    }

    #[test]
    fn seeded_split_roughly_follows_ratio() {
        let sampler = SeededSampler::new(7);
        let splitter = Splitter::new(0.7, &sampler);

        let num_training = (0..10_000)
            .filter(|n| splitter.assign(&format!("unit_{}", n)) == Partition::Training)
            .count();

        assert!(num_training > 6_500 && num_training < 7_500);
    }
}
