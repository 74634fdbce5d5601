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

use crate::collection::Collection;
use crate::error::Fallible;
use crate::queue::due_cards;
use crate::types::card::Flashcard;
use crate::types::timestamp::Timestamp;

pub fn list_due(directory: Option<String>) -> Fallible<()> {
    let now = Timestamp::now();
    for card in due_at(directory, now)? {
        println!("{}", format_due(&card, now));
    }
    Ok(())
}

/// The cards of a collection that are due at `now`, most overdue first.
pub fn due_at(directory: Option<String>, now: Timestamp) -> Fallible<Vec<Flashcard>> {
    let collection = Collection::open(directory, now)?;
    let cards = collection.db.cards()?;
    Ok(due_cards(cards.values(), now))
}

fn format_due(card: &Flashcard, now: Timestamp) -> String {
    let overdue = card.next_review.days_until(now).max(0);
    format!(
        "{}\t{}\t{overdue}d\t{}",
        card.id.short(),
        card.card_type.as_str(),
        card.front.replace('\n', " ")
    )
}
