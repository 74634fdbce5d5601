// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::fsrs::DEFAULT_MAXIMUM_INTERVAL;
use crate::fsrs::DEFAULT_TARGET_RETENTION;
use crate::fsrs::Parameters;
use crate::fsrs::Weights;
use crate::scheduler::Algorithm;
use crate::scheduler::Scheduler;

pub const SETTINGS_FILE: &str = "settings.toml";

/// User settings, read from `settings.toml` in the notes directory. Every
/// field is optional.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub review_algorithm: Algorithm,
    /// Cards per day. Only used to report progress.
    pub daily_goal: u32,
    /// Desired recall probability, as a percentage.
    pub retention_target: f64,
    /// Longest FSRS interval, in days.
    pub maximum_interval: u32,
    /// FSRS weights. Must have exactly 17 entries.
    pub weights: Option<Vec<f64>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            review_algorithm: Algorithm::Fsrs,
            daily_goal: 20,
            retention_target: DEFAULT_TARGET_RETENTION * 100.0,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            weights: None,
        }
    }
}

impl Settings {
    /// Load the settings file from a directory. A missing file means
    /// default settings.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(SETTINGS_FILE);
        if !path.exists() {
            log::debug!("No settings file, using defaults.");
            return Ok(Self::default());
        }
        let content = read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Fallible<Self> {
        let settings: Settings = toml::from_str(content)?;
        // Reject bad scheduler settings up front rather than mid-session.
        settings.parameters()?;
        Ok(settings)
    }

    pub fn parameters(&self) -> Fallible<Parameters> {
        let weights: Weights = match &self.weights {
            Some(weights) => match weights.as_slice().try_into() {
                Ok(weights) => weights,
                Err(_) => {
                    return fail(format!(
                        "expected 17 FSRS weights, found {}.",
                        weights.len()
                    ));
                }
            },
            None => Parameters::default().weights,
        };
        Parameters::new(
            weights,
            self.retention_target / 100.0,
            self.maximum_interval,
        )
    }

    /// The scheduler for the configured algorithm, or for `algorithm` when
    /// given.
    pub fn scheduler(&self, algorithm: Option<Algorithm>) -> Fallible<Scheduler> {
        let algorithm = algorithm.unwrap_or(self.review_algorithm);
        Ok(Scheduler::new(algorithm, self.parameters()?))
    }
}
