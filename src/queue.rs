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

use crate::types::card::Flashcard;
use crate::types::timestamp::Timestamp;

/// Select the cards due at `now`, most overdue first.
///
/// Ties are broken by creation time and then id, so the order does not
/// depend on the iteration order of the input.
pub fn due_cards<'a>(
    cards: impl IntoIterator<Item = &'a Flashcard>,
    now: Timestamp,
) -> Vec<Flashcard> {
    let mut due: Vec<Flashcard> = cards
        .into_iter()
        .filter(|card| card.is_due(now))
        .cloned()
        .collect();
    due.sort_by(|a, b| {
        a.next_review
            .cmp(&b.next_review)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
    due
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::Fallible;
    use crate::parser::parse_flashcards;
    use crate::types::card_id::CardId;

    fn cards(due_at: &[i64]) -> Fallible<HashMap<CardId, Flashcard>> {
        let text: String = (0..due_at.len()).map(|i| format!("Q{i} :: A{i}\n")).collect();
        let parsed = parse_flashcards(&text);
        let mut map = HashMap::new();
        for (p, millis) in parsed.iter().zip(due_at) {
            let mut card = Flashcard::materialize(p, None, Timestamp::from_millis(0)?);
            card.next_review = Timestamp::from_millis(*millis)?;
            map.insert(card.id, card);
        }
        Ok(map)
    }

    #[test]
    fn test_filters_and_orders() -> Fallible<()> {
        let cards = cards(&[500, 100, 1_000, 300, 1_001, 100])?;
        let now = Timestamp::from_millis(1_000)?;
        let due = due_cards(cards.values(), now);
        let times: Vec<i64> = due.iter().map(|c| c.next_review.as_millis()).collect();
        assert_eq!(times, vec![100, 100, 300, 500, 1_000]);
        assert!(due.iter().all(|c| c.next_review <= now));
        Ok(())
    }

    #[test]
    fn test_nothing_due() -> Fallible<()> {
        let cards = cards(&[2_000, 3_000])?;
        let due = due_cards(cards.values(), Timestamp::from_millis(1_000)?);
        assert!(due.is_empty());
        Ok(())
    }

    #[test]
    fn test_selection_is_repeatable() -> Fallible<()> {
        let cards = cards(&[5, 5, 5, 1])?;
        let now = Timestamp::from_millis(10)?;
        assert_eq!(due_cards(cards.values(), now), due_cards(cards.values(), now));
        Ok(())
    }
}
