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

//! The Free Spaced Repetition Scheduler.
//!
//! A card's memory is modelled by its difficulty, in [1, 10], and its
//! stability, in days. Retrievability, the probability of recall, decays
//! from the stability along an exponential forgetting curve.

use crate::error::Fallible;
use crate::error::fail;
use crate::types::card::CardState;
use crate::types::card::Flashcard;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

pub type Weights = [f64; 17];

pub type Difficulty = f64;

pub type Stability = f64;

pub type Retrievability = f64;

pub const DEFAULT_WEIGHTS: Weights = [
    0.4, 0.6, 2.4, 5.8, 4.93, 0.94, 0.86, 0.01, 1.49, 0.14, 0.94, 2.18, 0.05, 0.34, 1.26, 0.29,
    2.61,
];

/// The default desired probability of recall.
pub const DEFAULT_TARGET_RETENTION: f64 = 0.9;

/// The default longest interval, in days.
pub const DEFAULT_MAXIMUM_INTERVAL: u32 = 36500;

const MIN_DIFFICULTY: Difficulty = 1.0;
const MAX_DIFFICULTY: Difficulty = 10.0;

/// The recall probability the forgetting curve is anchored at.
const DECAY_REFERENCE: f64 = 0.9;

#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    pub weights: Weights,
    pub target_retention: f64,
    pub maximum_interval: u32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            target_retention: DEFAULT_TARGET_RETENTION,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
        }
    }
}

impl Parameters {
    pub fn new(weights: Weights, target_retention: f64, maximum_interval: u32) -> Fallible<Self> {
        if !(target_retention > 0.0 && target_retention < 1.0) {
            return fail(format!(
                "target retention must be between 0 and 1, got {target_retention}."
            ));
        }
        if maximum_interval == 0 {
            return fail("maximum interval must be at least one day.");
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return fail("FSRS weights must be finite numbers.");
        }
        Ok(Self {
            weights,
            target_retention,
            maximum_interval,
        })
    }

    /// Seed difficulty for a card's first review.
    pub fn initial_difficulty(&self, rating: Rating) -> Difficulty {
        let w = &self.weights;
        clamp_difficulty(w[4] - w[5] * (g(rating) - 3.0))
    }

    /// Seed stability for a card's first review.
    pub fn initial_stability(&self, rating: Rating) -> Stability {
        self.weights[rating.grade() as usize - 1]
    }

    /// Good leaves difficulty unchanged; better ratings lower it, worse
    /// ratings raise it.
    pub fn new_difficulty(&self, d: Difficulty, rating: Rating) -> Difficulty {
        clamp_difficulty(d - self.weights[6] * (g(rating) - 3.0))
    }

    /// Stability after a review, given the updated difficulty `d`, the prior
    /// stability `s` and the retrievability `r` at review time.
    pub fn new_stability(
        &self,
        d: Difficulty,
        s: Stability,
        r: Retrievability,
        rating: Rating,
    ) -> Stability {
        let w = &self.weights;
        if rating == Rating::Again {
            w[11] * d.powf(-w[12]) * ((s + 1.0).powf(w[13]) - 1.0) * (w[14] * (1.0 - r)).exp()
        } else {
            s * (1.0
                + w[8].exp() * (11.0 - d) * s.powf(-w[9]) * (((1.0 - r) * w[10]).exp() - 1.0))
        }
    }

    /// Days until the next review for the given stability, clamped to
    /// `[1, maximum_interval]`.
    pub fn interval(&self, s: Stability) -> u32 {
        let w = &self.weights;
        let raw = (s / w[9]) * (self.target_retention.powf(1.0 / w[10]) - 1.0);
        let max = self.maximum_interval.max(1) as f64;
        // NaN falls through `clamp` unchanged and casts to zero.
        (raw.round().clamp(1.0, max) as u32).max(1)
    }
}

/// Retrievability at the given stability, on the curve that decays to
/// 90% after one stability-length.
pub fn retrievability(s: Stability) -> Retrievability {
    (DECAY_REFERENCE.ln() * (1.0 / s)).exp()
}

fn clamp_difficulty(d: Difficulty) -> Difficulty {
    d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

fn g(rating: Rating) -> f64 {
    rating.grade() as f64
}

/// The state a card moves to after a review.
pub fn next_state(state: CardState, rating: Rating) -> CardState {
    match (rating, state) {
        (Rating::Again, CardState::New) => CardState::Learning,
        (Rating::Again, _) => CardState::Relearning,
        (Rating::Easy, CardState::New | CardState::Learning) => CardState::Review,
        (_, CardState::New | CardState::Learning) => CardState::Learning,
        (_, CardState::Review | CardState::Relearning) => CardState::Review,
    }
}

/// Review a card. Returns the updated card; the input is not modified.
pub fn review(params: &Parameters, card: &Flashcard, rating: Rating, now: Timestamp) -> Flashcard {
    // A stored stability of zero can't grow, so such a card is re-seeded.
    let seed = card.state == CardState::New || card.stability <= 0.0;
    let difficulty = if card.state == CardState::New {
        params.initial_difficulty(rating)
    } else {
        params.new_difficulty(card.difficulty, rating)
    };
    let stability = if seed {
        params.initial_stability(rating)
    } else {
        let r = retrievability(card.stability);
        params.new_stability(difficulty, card.stability, r, rating)
    };
    let interval = params.interval(stability);
    let repetitions = match rating {
        Rating::Again => 0,
        _ => card.repetitions + 1,
    };
    Flashcard {
        difficulty,
        stability,
        state: next_state(card.state, rating),
        interval,
        repetitions,
        next_review: now.plus_days(interval),
        updated_at: now,
        ..card.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_flashcards;

    fn new_card() -> Fallible<Flashcard> {
        let parsed = parse_flashcards("Q :: A");
        Ok(Flashcard::materialize(
            &parsed[0],
            None,
            Timestamp::from_millis(0)?,
        ))
    }

    fn now() -> Fallible<Timestamp> {
        Timestamp::from_millis(86_400_000)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_first_review_seeds_state() -> Fallible<()> {
        let params = Parameters::default();
        let card = new_card()?;
        let expected_difficulty = [6.81, 5.87, 4.93, 3.99];
        for (i, rating) in Rating::ALL.into_iter().enumerate() {
            let next = review(&params, &card, rating, now()?);
            assert!(approx(next.difficulty, expected_difficulty[i]));
            assert_eq!(next.stability, DEFAULT_WEIGHTS[i]);
        }
        Ok(())
    }

    #[test]
    fn test_state_transitions() {
        use CardState::*;
        assert_eq!(next_state(New, Rating::Again), Learning);
        assert_eq!(next_state(Learning, Rating::Again), Relearning);
        assert_eq!(next_state(Review, Rating::Again), Relearning);
        assert_eq!(next_state(Relearning, Rating::Again), Relearning);
        assert_eq!(next_state(New, Rating::Easy), Review);
        assert_eq!(next_state(Learning, Rating::Easy), Review);
        assert_eq!(next_state(New, Rating::Good), Learning);
        assert_eq!(next_state(Learning, Rating::Hard), Learning);
        assert_eq!(next_state(Review, Rating::Hard), Review);
        assert_eq!(next_state(Relearning, Rating::Good), Review);
    }

    #[test]
    fn test_repetitions() -> Fallible<()> {
        let params = Parameters::default();
        let mut card = new_card()?;
        card.repetitions = 4;
        card.state = CardState::Review;
        card.stability = 10.0;
        card.difficulty = 5.0;
        for rating in [Rating::Hard, Rating::Good, Rating::Easy] {
            assert_eq!(review(&params, &card, rating, now()?).repetitions, 5);
        }
        assert_eq!(review(&params, &card, Rating::Again, now()?).repetitions, 0);
        Ok(())
    }

    #[test]
    fn test_difficulty_stays_clamped() -> Fallible<()> {
        let params = Parameters::default();
        let mut card = new_card()?;
        for _ in 0..30 {
            card = review(&params, &card, Rating::Again, now()?);
            assert!((1.0..=10.0).contains(&card.difficulty));
        }
        assert_eq!(card.difficulty, 10.0);
        for _ in 0..30 {
            card = review(&params, &card, Rating::Easy, now()?);
            assert!((1.0..=10.0).contains(&card.difficulty));
        }
        assert_eq!(card.difficulty, 1.0);
        Ok(())
    }

    #[test]
    fn test_difficulty_direction() {
        let params = Parameters::default();
        assert!(approx(params.new_difficulty(5.0, Rating::Good), 5.0));
        assert!(params.new_difficulty(5.0, Rating::Easy) < 5.0);
        assert!(params.new_difficulty(5.0, Rating::Hard) > 5.0);
        assert!(approx(params.new_difficulty(5.0, Rating::Again), 6.72));
    }

    #[test]
    fn test_retrievability() {
        assert!(approx(retrievability(1.0), 0.9));
        assert!(retrievability(10.0) > retrievability(1.0));
    }

    #[test]
    fn test_stability_update_formulas() -> Fallible<()> {
        let params = Parameters::default();
        let w = DEFAULT_WEIGHTS;
        let mut card = new_card()?;
        card.state = CardState::Review;
        card.difficulty = 5.0;
        card.stability = 4.0;
        let r = retrievability(4.0);

        let good = review(&params, &card, Rating::Good, now()?);
        let expected = 4.0
            * (1.0 + w[8].exp() * (11.0 - 5.0) * 4f64.powf(-w[9]) * (((1.0 - r) * w[10]).exp() - 1.0));
        assert!(approx(good.stability, expected));
        assert!(good.stability > 4.0);

        let again = review(&params, &card, Rating::Again, now()?);
        let d = params.new_difficulty(5.0, Rating::Again);
        let expected =
            w[11] * d.powf(-w[12]) * (5f64.powf(w[13]) - 1.0) * (w[14] * (1.0 - r)).exp();
        assert!(approx(again.stability, expected));
        assert!(again.stability < 4.0);
        Ok(())
    }

    #[test]
    fn test_interval_bounds() {
        let params = Parameters::default();
        // With the default weights the curve term is negative, so the lower
        // bound applies.
        assert_eq!(params.interval(50.0), 1);
        let mut weights = DEFAULT_WEIGHTS;
        weights[9] = -0.1;
        let params = Parameters {
            weights,
            target_retention: 0.9,
            maximum_interval: 30,
        };
        assert_eq!(params.interval(1.0), 1);
        assert_eq!(params.interval(1000.0), 30);
    }

    #[test]
    fn test_due_date_follows_interval() -> Fallible<()> {
        let params = Parameters::default();
        let card = new_card()?;
        let next = review(&params, &card, Rating::Good, now()?);
        assert_eq!(next.next_review, now()?.plus_days(next.interval));
        assert_eq!(next.updated_at, now()?);
        Ok(())
    }

    #[test]
    fn test_zero_stability_is_reseeded() -> Fallible<()> {
        let params = Parameters::default();
        let mut card = new_card()?;
        card.state = CardState::Review;
        card.difficulty = 5.0;
        card.stability = 0.0;
        let next = review(&params, &card, Rating::Good, now()?);
        assert_eq!(next.stability, DEFAULT_WEIGHTS[2]);
        assert!(next.stability.is_finite());
        Ok(())
    }

    #[test]
    fn test_parameter_validation() {
        assert!(Parameters::new(DEFAULT_WEIGHTS, 0.9, 365).is_ok());
        assert!(Parameters::new(DEFAULT_WEIGHTS, 1.0, 365).is_err());
        assert!(Parameters::new(DEFAULT_WEIGHTS, 0.9, 0).is_err());
        let mut weights = DEFAULT_WEIGHTS;
        weights[3] = f64::NAN;
        assert!(Parameters::new(weights, 0.9, 365).is_err());
    }
}
