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

use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::Connection;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::Fallible;
use crate::error::fail;
use crate::session::ReviewOutcome;
use crate::session::SessionSummary;
use crate::types::card::Flashcard;
use crate::types::card_id::CardId;
use crate::types::timestamp::Timestamp;

const CARD_COLUMNS: &str = "card_id, card_type, front, back, extra, note_id, rem_id, created_at, updated_at, next_review, interval, ease_factor, repetitions, difficulty, stability, state";

/// Flashcards, sessions and reviews, stored in SQLite.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating database schema.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        Ok(Self { conn })
    }

    /// Insert a new card. If a card with the same id exists it is left
    /// untouched. Returns whether the card was inserted.
    pub fn insert_card(&self, card: &Flashcard) -> Fallible<bool> {
        let sql = format!(
            "insert or ignore into flashcards ({CARD_COLUMNS}) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);"
        );
        let count = self.conn.execute(
            &sql,
            rusqlite::params![
                card.id,
                card.card_type,
                card.front,
                card.back,
                card.extra,
                card.note_id,
                card.rem_id,
                card.created_at,
                card.updated_at,
                card.next_review,
                card.interval,
                card.ease_factor,
                card.repetitions,
                card.difficulty,
                card.stability,
                card.state,
            ],
        )?;
        if count > 0 {
            log::debug!("Added new card: {}", card.id.short());
        }
        Ok(count > 0)
    }

    /// Persist a card's scheduling state after a review. The card must
    /// exist.
    pub fn update_card(&self, card: &Flashcard) -> Fallible<()> {
        let sql = "update flashcards set updated_at = ?, next_review = ?, interval = ?, ease_factor = ?, repetitions = ?, difficulty = ?, stability = ?, state = ? where card_id = ?;";
        let count = self.conn.execute(
            sql,
            rusqlite::params![
                card.updated_at,
                card.next_review,
                card.interval,
                card.ease_factor,
                card.repetitions,
                card.difficulty,
                card.stability,
                card.state,
                card.id,
            ],
        )?;
        if count == 0 {
            return fail(format!("no card with id {}.", card.id));
        }
        Ok(())
    }

    /// All cards, keyed by id.
    pub fn cards(&self) -> Fallible<HashMap<CardId, Flashcard>> {
        let sql = format!("select {CARD_COLUMNS} from flashcards;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut cards = HashMap::new();
        while let Some(row) = rows.next()? {
            let card = card_from_row(row)?;
            cards.insert(card.id, card);
        }
        Ok(cards)
    }

    pub fn card_count(&self) -> Fallible<usize> {
        let sql = "select count(*) from flashcards;";
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(usize::try_from(count)?)
    }

    /// Save a finished session and the reviews made during it.
    pub fn save_session(
        &mut self,
        summary: &SessionSummary,
        outcomes: &[ReviewOutcome],
    ) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        let session_id = insert_session(&tx, summary)?;
        for outcome in outcomes {
            insert_review(&tx, session_id, outcome)?;
        }
        tx.commit()?;
        log::debug!("Saved session with {} reviews.", outcomes.len());
        Ok(())
    }

    /// Every saved session, oldest first.
    pub fn sessions(&self) -> Fallible<Vec<SessionSummary>> {
        let sql = "select started_at, ended_at, cards_reviewed, correct_cards from sessions order by started_at;";
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next()? {
            let cards_reviewed: i64 = row.get(2)?;
            let correct_cards: i64 = row.get(3)?;
            sessions.push(SessionSummary {
                started_at: row.get(0)?,
                ended_at: row.get(1)?,
                cards_reviewed: usize::try_from(cards_reviewed)?,
                correct_cards: usize::try_from(correct_cards)?,
            });
        }
        Ok(sessions)
    }

    /// The number of reviews made on the given local date.
    pub fn review_count_on(&self, date: NaiveDate) -> Fallible<usize> {
        let sql = "select reviewed_at from reviews;";
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut count = 0;
        while let Some(row) = rows.next()? {
            let reviewed_at: Timestamp = row.get(0)?;
            if reviewed_at.local_date() == date {
                count += 1;
            }
        }
        Ok(count)
    }
}

fn card_from_row(row: &Row) -> rusqlite::Result<Flashcard> {
    Ok(Flashcard {
        id: row.get(0)?,
        card_type: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        extra: row.get(4)?,
        note_id: row.get(5)?,
        rem_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        next_review: row.get(9)?,
        interval: row.get(10)?,
        ease_factor: row.get(11)?,
        repetitions: row.get(12)?,
        difficulty: row.get(13)?,
        stability: row.get(14)?,
        state: row.get(15)?,
    })
}

type SessionId = i64;

fn insert_session(tx: &Transaction, summary: &SessionSummary) -> Fallible<SessionId> {
    let sql = "insert into sessions (started_at, ended_at, cards_reviewed, correct_cards) values (?, ?, ?, ?) returning session_id;";
    let session_id: SessionId = tx.query_row(
        sql,
        (
            summary.started_at,
            summary.ended_at,
            i64::try_from(summary.cards_reviewed)?,
            i64::try_from(summary.correct_cards)?,
        ),
        |row| row.get(0),
    )?;
    Ok(session_id)
}

fn insert_review(tx: &Transaction, session_id: SessionId, outcome: &ReviewOutcome) -> Fallible<()> {
    let sql = "insert into reviews (session_id, card_id, reviewed_at, rating) values (?, ?, ?, ?);";
    tx.execute(
        sql,
        (
            session_id,
            outcome.card_id,
            outcome.reviewed_at,
            outcome.rating,
        ),
    )?;
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["flashcards"], |row| row.get(0))?;
    Ok(count > 0)
}
