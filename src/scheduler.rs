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

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use serde::Deserialize;
use serde::Serialize;

use crate::fsrs;
use crate::fsrs::Parameters;
use crate::sm2;
use crate::types::card::Flashcard;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

/// Which scheduling algorithm a user has chosen.
#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Algorithm {
    /// SuperMemo-2.
    #[serde(rename = "SM2")]
    Sm2,
    /// Free Spaced Repetition Scheduler.
    #[serde(rename = "FSRS")]
    Fsrs,
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Sm2 => write!(f, "SM2"),
            Algorithm::Fsrs => write!(f, "FSRS"),
        }
    }
}

/// A scheduling algorithm, ready to apply ratings.
#[derive(Clone, Debug, PartialEq)]
pub enum Scheduler {
    Sm2,
    Fsrs(Parameters),
}

impl Scheduler {
    pub fn new(algorithm: Algorithm, parameters: Parameters) -> Self {
        match algorithm {
            Algorithm::Sm2 => Scheduler::Sm2,
            Algorithm::Fsrs => Scheduler::Fsrs(parameters),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Scheduler::Sm2 => Algorithm::Sm2,
            Scheduler::Fsrs(_) => Algorithm::Fsrs,
        }
    }

    /// Apply a rating to a card, returning the updated card.
    pub fn schedule(&self, card: &Flashcard, rating: Rating, now: Timestamp) -> Flashcard {
        match self {
            Scheduler::Sm2 => sm2::review(card, rating, now),
            Scheduler::Fsrs(parameters) => fsrs::review(parameters, card, rating, now),
        }
    }
}
