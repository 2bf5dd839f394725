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

use std::fs::File;
use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tunable constants of a run. They are read once when a pipeline is constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum number of visits for a user to join the sub-cluster of an item.
    pub freq_threshold: u32,
    /// Minimum average rating for a user to join the sub-cluster of an item.
    pub star_threshold: f64,
    /// Number of shared sub-clusters after which a pair of users is admitted.
    pub times_threshold: u32,
    /// Draws at or below this value go to the training partition.
    pub split_ratio: f64,
    /// Trade-off between visit frequency agreement and rating distance.
    pub weight: f64,
    pub top_k: usize,
    pub rating_scale_max: f64,
    /// Makes the train/test split reproducible.
    pub seed: Option<u64>,
    pub num_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            freq_threshold: 1,
            star_threshold: 4.0,
            times_threshold: 1,
            split_ratio: 0.7,
            weight: 0.7,
            top_k: 3,
            rating_scale_max: 5.0,
            seed: None,
            num_threads: num_cpus::get(),
        }
    }
}

impl Config {

    /// Reads a JSON object, missing fields fall back to their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Config = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.weight) {
            return Err(invalid(format!("weight must be in [0, 1], got {}", self.weight)));
        }
        if !(0.0..=1.0).contains(&self.split_ratio) {
            return Err(invalid(format!("split_ratio must be in [0, 1], got {}", self.split_ratio)));
        }
        if !(self.rating_scale_max > 0.0) {
            return Err(invalid(format!(
                "rating_scale_max must be positive, got {}", self.rating_scale_max)));
        }
        if self.top_k == 0 {
            return Err(invalid("top_k must be at least 1".to_string()));
        }
        if self.times_threshold == 0 {
            return Err(invalid("times_threshold must be at least 1".to_string()));
        }
        if self.num_threads == 0 {
            return Err(invalid("num_threads must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidConfig(message)
}
