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

//! The SuperMemo-2 algorithm.

use crate::types::card::Flashcard;
use crate::types::card::MINIMUM_EASE_FACTOR;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

/// Quality scores below this are failures.
const PASSING_QUALITY: u8 = 3;

/// The ease factor after a review of the given quality.
pub fn new_ease_factor(ease_factor: f64, quality: u8) -> f64 {
    let q = 5.0 - quality as f64;
    (ease_factor + (0.1 - q * (0.08 + q * 0.02))).max(MINIMUM_EASE_FACTOR)
}

/// Review a card. Returns the updated card; the input is not modified.
pub fn review(card: &Flashcard, rating: Rating, now: Timestamp) -> Flashcard {
    let quality = rating.quality();
    let ease_factor = new_ease_factor(card.ease_factor, quality);
    let (repetitions, interval) = if quality < PASSING_QUALITY {
        (0, 1)
    } else {
        let repetitions = card.repetitions + 1;
        let interval = match repetitions {
            1 => 1,
            2 => 6,
            _ => (card.interval as f64 * ease_factor).round() as u32,
        };
        (repetitions, interval)
    };
    Flashcard {
        interval,
        ease_factor,
        repetitions,
        next_review: now.plus_days(interval),
        updated_at: now,
        ..card.clone()
    }
}
