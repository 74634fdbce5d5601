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

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::Scheduler;
use crate::types::card::Flashcard;
use crate::types::card_id::CardId;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

/// Where a review session is. The index points into the session's queue.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionState {
    /// The question of the card at this index is showing.
    AwaitingReveal(usize),
    /// The answer of the card at this index is showing.
    AwaitingRating(usize),
    Complete,
}

/// The result of rating one card.
#[derive(Clone, PartialEq, Debug)]
pub struct ReviewOutcome {
    pub card_id: CardId,
    pub rating: Rating,
    pub reviewed_at: Timestamp,
    pub correct: bool,
}

/// Totals for one sitting.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub cards_reviewed: usize,
    pub correct_cards: usize,
}

/// Drives one pass over a queue of due cards: show the question, reveal
/// the answer, rate, advance. Holds no state across sessions.
pub struct Session {
    scheduler: Scheduler,
    cards: Vec<Flashcard>,
    state: SessionState,
    outcomes: Vec<ReviewOutcome>,
    started_at: Timestamp,
}

impl Session {
    pub fn new(scheduler: Scheduler, cards: Vec<Flashcard>, started_at: Timestamp) -> Self {
        let state = if cards.is_empty() {
            SessionState::Complete
        } else {
            SessionState::AwaitingReveal(0)
        };
        Self {
            scheduler,
            cards,
            state,
            outcomes: Vec::new(),
            started_at,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    /// The card being reviewed, if the session is not complete.
    pub fn current_card(&self) -> Option<&Flashcard> {
        match self.state {
            SessionState::AwaitingReveal(i) | SessionState::AwaitingRating(i) => self.cards.get(i),
            SessionState::Complete => None,
        }
    }

    /// The number of cards not yet rated.
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.outcomes.len()
    }

    pub fn outcomes(&self) -> &[ReviewOutcome] {
        &self.outcomes
    }

    /// Show the answer of the current card. Revealing twice is harmless.
    pub fn reveal(&mut self) -> Fallible<()> {
        match self.state {
            SessionState::AwaitingReveal(i) => {
                self.state = SessionState::AwaitingRating(i);
                Ok(())
            }
            SessionState::AwaitingRating(_) => Ok(()),
            SessionState::Complete => fail("session is already complete."),
        }
    }

    /// Rate the current card and advance to the next one. Returns the
    /// updated card for the caller to persist.
    pub fn rate(&mut self, rating: Rating, now: Timestamp) -> Fallible<Flashcard> {
        let index = match self.state {
            SessionState::AwaitingRating(i) => i,
            SessionState::AwaitingReveal(_) => {
                return fail("cannot rate a card before its answer is revealed.");
            }
            SessionState::Complete => return fail("session is already complete."),
        };
        let card = &self.cards[index];
        let updated = self.scheduler.schedule(card, rating, now);
        log::debug!(
            "{} {} {} interval={}d due={}",
            card.id.short(),
            self.scheduler.algorithm(),
            rating.as_str(),
            updated.interval,
            updated.next_review
        );
        self.outcomes.push(ReviewOutcome {
            card_id: updated.id,
            rating,
            reviewed_at: now,
            correct: rating.is_correct(),
        });
        let next = index + 1;
        self.state = if next < self.cards.len() {
            SessionState::AwaitingReveal(next)
        } else {
            log::debug!("Session completed");
            SessionState::Complete
        };
        Ok(updated)
    }

    /// Totals for the cards rated so far.
    pub fn summary(&self, ended_at: Timestamp) -> SessionSummary {
        SessionSummary {
            started_at: self.started_at,
            ended_at,
            cards_reviewed: self.outcomes.len(),
            correct_cards: self.outcomes.iter().filter(|o| o.correct).count(),
        }
    }
}

/// Percentage of correct reviews across sessions; zero when nothing was
/// reviewed.
pub fn retention_rate(sessions: &[SessionSummary]) -> f64 {
    let total: usize = sessions.iter().map(|s| s.cards_reviewed).sum();
    let correct: usize = sessions.iter().map(|s| s.correct_cards).sum();
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsrs::Parameters;
    use crate::parser::parse_flashcards;
    use crate::queue::due_cards;
    use crate::scheduler::Algorithm;

    fn queue(n: usize) -> Fallible<Vec<Flashcard>> {
        let text: String = (0..n).map(|i| format!("Q{i} :: A{i}\n")).collect();
        let created = Timestamp::from_millis(0)?;
        let cards: Vec<Flashcard> = parse_flashcards(&text)
            .iter()
            .map(|p| Flashcard::materialize(p, None, created))
            .collect();
        Ok(due_cards(&cards, Timestamp::from_millis(1)?))
    }

    fn fsrs() -> Scheduler {
        Scheduler::new(Algorithm::Fsrs, Parameters::default())
    }

    #[test]
    fn test_two_card_session() -> Fallible<()> {
        let now = Timestamp::from_millis(1_000)?;
        let cards = queue(2)?;
        let mut session = Session::new(fsrs(), cards.clone(), now);
        assert_eq!(session.state(), SessionState::AwaitingReveal(0));
        assert_eq!(session.current_card(), Some(&cards[0]));

        session.reveal()?;
        assert_eq!(session.state(), SessionState::AwaitingRating(0));
        let updated = session.rate(Rating::Good, now)?;
        assert_eq!(updated.id, cards[0].id);
        assert_eq!(updated.repetitions, 1);
        assert_eq!(session.state(), SessionState::AwaitingReveal(1));

        // Rating before revealing is rejected and changes nothing.
        assert!(session.rate(Rating::Good, now).is_err());
        assert_eq!(session.state(), SessionState::AwaitingReveal(1));
        assert_eq!(session.outcomes().len(), 1);

        session.reveal()?;
        session.rate(Rating::Again, now)?;
        assert_eq!(session.state(), SessionState::Complete);
        assert!(session.is_complete());
        assert_eq!(session.current_card(), None);

        assert!(session.reveal().is_err());
        assert!(session.rate(Rating::Easy, now).is_err());
        assert_eq!(session.state(), SessionState::Complete);
        Ok(())
    }

    #[test]
    fn test_empty_queue_is_complete() -> Fallible<()> {
        let session = Session::new(fsrs(), Vec::new(), Timestamp::from_millis(0)?);
        assert!(session.is_complete());
        assert_eq!(session.remaining(), 0);
        Ok(())
    }

    #[test]
    fn test_double_reveal_is_harmless() -> Fallible<()> {
        let mut session = Session::new(fsrs(), queue(1)?, Timestamp::from_millis(0)?);
        session.reveal()?;
        session.reveal()?;
        assert_eq!(session.state(), SessionState::AwaitingRating(0));
        Ok(())
    }

    #[test]
    fn test_uses_configured_scheduler() -> Fallible<()> {
        let now = Timestamp::from_millis(0)?;
        let cards = queue(1)?;
        let scheduler = Scheduler::new(Algorithm::Sm2, Parameters::default());
        let mut session = Session::new(scheduler.clone(), cards.clone(), now);
        session.reveal()?;
        let updated = session.rate(Rating::Easy, now)?;
        assert_eq!(updated, scheduler.schedule(&cards[0], Rating::Easy, now));
        Ok(())
    }

    #[test]
    fn test_outcomes_and_summary() -> Fallible<()> {
        let start = Timestamp::from_millis(0)?;
        let mut session = Session::new(fsrs(), queue(3)?, start);
        for rating in [Rating::Good, Rating::Hard, Rating::Easy] {
            session.reveal()?;
            session.rate(rating, start)?;
        }
        let correct: Vec<bool> = session.outcomes().iter().map(|o| o.correct).collect();
        assert_eq!(correct, vec![true, false, true]);
        let end = Timestamp::from_millis(60_000)?;
        let summary = session.summary(end);
        assert_eq!(summary.cards_reviewed, 3);
        assert_eq!(summary.correct_cards, 2);
        assert_eq!(summary.ended_at, end);
        assert_eq!(session.remaining(), 0);
        Ok(())
    }

    #[test]
    fn test_retention_rate() -> Fallible<()> {
        assert_eq!(retention_rate(&[]), 0.0);
        let t = Timestamp::from_millis(0)?;
        let sessions = vec![
            SessionSummary {
                started_at: t,
                ended_at: t,
                cards_reviewed: 3,
                correct_cards: 3,
            },
            SessionSummary {
                started_at: t,
                ended_at: t,
                cards_reviewed: 1,
                correct_cards: 0,
            },
        ];
        assert_eq!(retention_rate(&sessions), 75.0);
        Ok(())
    }
}
