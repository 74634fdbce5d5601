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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;
use crate::fsrs::Difficulty;
use crate::fsrs::Stability;
use crate::parser::ParsedFlashcard;
use crate::types::card_id::CardId;
use crate::types::card_id::IdHasher;
use crate::types::card_type::CardType;
use crate::types::timestamp::Timestamp;

/// The ease factor every card starts with.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// The lowest ease factor SM-2 allows.
pub const MINIMUM_EASE_FACTOR: f64 = 1.3;

/// The FSRS learning state of a card.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    New,
    Learning,
    Review,
    Relearning,
}

impl CardState {
    pub fn as_str(&self) -> &str {
        match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Review => "review",
            CardState::Relearning => "relearning",
        }
    }
}

impl TryFrom<String> for CardState {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "new" => Ok(CardState::New),
            "learning" => Ok(CardState::Learning),
            "review" => Ok(CardState::Review),
            "relearning" => Ok(CardState::Relearning),
            _ => fail(format!("Invalid card state: {}", value)),
        }
    }
}

impl ToSql for CardState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CardState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        CardState::try_from(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// A flashcard and its scheduling state.
///
/// The state is the union of what both schedulers need. Only the half that
/// belongs to the configured algorithm is meaningful; `repetitions`,
/// `interval` and `next_review` are shared.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: CardId,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub front: String,
    pub back: String,
    pub extra: Option<String>,
    /// The note this card was parsed from.
    pub note_id: Option<String>,
    /// The block within the note this card was parsed from, if any.
    pub rem_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// The card is due once this moment has passed.
    pub next_review: Timestamp,
    /// Days between the last review and `next_review`.
    pub interval: u32,
    /// SM-2 ease factor.
    pub ease_factor: f64,
    pub repetitions: u32,
    pub difficulty: Difficulty,
    pub stability: Stability,
    pub state: CardState,
}

impl Flashcard {
    /// Turn a parsed candidate into a new card, due immediately.
    ///
    /// The id is derived from the source note and the card's content, so
    /// parsing the same note twice yields the same ids.
    pub fn materialize(parsed: &ParsedFlashcard, note_id: Option<&str>, now: Timestamp) -> Self {
        let mut hasher = IdHasher::new();
        hasher.update(note_id.unwrap_or_default().as_bytes());
        hasher.update(parsed.card_type.as_str().as_bytes());
        hasher.update(parsed.front.as_bytes());
        hasher.update(parsed.back.as_bytes());
        Self {
            id: hasher.finalize(),
            card_type: parsed.card_type,
            front: parsed.front.clone(),
            back: parsed.back.clone(),
            extra: None,
            note_id: note_id.map(str::to_string),
            rem_id: None,
            created_at: now,
            updated_at: now,
            next_review: now,
            interval: 0,
            ease_factor: INITIAL_EASE_FACTOR,
            repetitions: 0,
            difficulty: 0.0,
            stability: 0.0,
            state: CardState::New,
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;
    use crate::parser::parse_flashcards;

    #[test]
    fn test_materialize() -> Fallible<()> {
        let now = Timestamp::from_millis(1_000)?;
        let parsed = parse_flashcards("Q :: A");
        let card = Flashcard::materialize(&parsed[0], Some("note.md"), now);
        assert_eq!(card.card_type, CardType::Basic);
        assert_eq!(card.front, "Q");
        assert_eq!(card.back, "A");
        assert_eq!(card.note_id.as_deref(), Some("note.md"));
        assert_eq!(card.next_review, now);
        assert_eq!(card.created_at, now);
        assert_eq!(card.interval, 0);
        assert_eq!(card.ease_factor, INITIAL_EASE_FACTOR);
        assert_eq!(card.repetitions, 0);
        assert_eq!(card.state, CardState::New);
        assert!(card.is_due(now));
        Ok(())
    }

    #[test]
    fn test_ids_are_stable_and_distinct() -> Fallible<()> {
        let now = Timestamp::from_millis(0)?;
        let later = Timestamp::from_millis(5_000)?;
        let parsed = parse_flashcards("Q :: A\n{x} y");
        let a = Flashcard::materialize(&parsed[0], Some("n.md"), now);
        let b = Flashcard::materialize(&parsed[0], Some("n.md"), later);
        let c = Flashcard::materialize(&parsed[0], Some("m.md"), now);
        let d = Flashcard::materialize(&parsed[1], Some("n.md"), now);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_ne!(a.id, d.id);
        Ok(())
    }

    #[test]
    fn test_json_shape() -> Fallible<()> {
        let now = Timestamp::from_millis(7)?;
        let parsed = parse_flashcards("Q :: A");
        let card = Flashcard::materialize(&parsed[0], None, now);
        let json = serde_json::to_value(&card)?;
        assert_eq!(json["type"], "basic");
        assert_eq!(json["nextReview"], 7);
        assert_eq!(json["easeFactor"], 2.5);
        assert_eq!(json["state"], "new");
        let back: Flashcard = serde_json::from_value(json)?;
        assert_eq!(back, card);
        Ok(())
    }
}
