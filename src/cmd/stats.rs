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
use serde::Serialize;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::queue::due_cards;
use crate::scheduler::Algorithm;
use crate::session::retention_rate;
use crate::types::timestamp::Timestamp;

#[derive(ValueEnum, Clone, Copy, PartialEq, Debug)]
pub enum StatsFormat {
    /// JSON output.
    Json,
    /// One `key: value` line per statistic.
    Text,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Json => write!(f, "json"),
            StatsFormat::Text => write!(f, "text"),
        }
    }
}

pub fn print_stats(directory: Option<String>, format: StatsFormat) -> Fallible<()> {
    let stats = collection_stats(directory, Timestamp::now())?;
    match format {
        StatsFormat::Json => {
            let stats_json = serde_json::to_string_pretty(&stats)?;
            println!("{stats_json}");
        }
        StatsFormat::Text => {
            println!("notes: {}", stats.note_count);
            println!("cards: {}", stats.card_count);
            println!("due: {}", stats.due_count);
            println!(
                "reviewed today: {}/{}",
                stats.today_review_count, stats.daily_goal
            );
            println!("retention: {:.1}%", stats.retention_rate);
            println!("algorithm: {}", stats.review_algorithm);
        }
    }
    Ok(())
}

pub fn collection_stats(directory: Option<String>, now: Timestamp) -> Fallible<Stats> {
    let collection = Collection::open(directory, now)?;
    let cards = collection.db.cards()?;
    let sessions = collection.db.sessions()?;
    Ok(Stats {
        note_count: collection.notes.len(),
        card_count: cards.len(),
        due_count: due_cards(cards.values(), now).len(),
        today_review_count: collection.db.review_count_on(now.local_date())?,
        daily_goal: collection.settings.daily_goal,
        session_count: sessions.len(),
        retention_rate: retention_rate(&sessions),
        review_algorithm: collection.settings.review_algorithm,
    })
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    note_count: usize,
    card_count: usize,
    due_count: usize,
    today_review_count: usize,
    daily_goal: u32,
    session_count: usize,
    /// Percentage of correct reviews over all sessions.
    retention_rate: f64,
    review_algorithm: Algorithm,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::create_tmp_copy_of_test_directory;

    #[test]
    fn test_fresh_collection() -> Fallible<()> {
        let directory = create_tmp_copy_of_test_directory()?;
        let stats = collection_stats(Some(directory), Timestamp::now())?;
        assert_eq!(stats.note_count, 2);
        assert_eq!(stats.card_count, 9);
        assert_eq!(stats.due_count, 9);
        assert_eq!(stats.today_review_count, 0);
        assert_eq!(stats.daily_goal, 10);
        assert_eq!(stats.session_count, 0);
        assert_eq!(stats.retention_rate, 0.0);
        assert_eq!(stats.review_algorithm, Algorithm::Sm2);
        Ok(())
    }

    #[test]
    fn test_json_field_names() -> Fallible<()> {
        let directory = create_tmp_copy_of_test_directory()?;
        let stats = collection_stats(Some(directory), Timestamp::now())?;
        let value: serde_json::Value = serde_json::to_value(&stats)?;
        assert_eq!(value["cardCount"], 9);
        assert_eq!(value["todayReviewCount"], 0);
        assert_eq!(value["reviewAlgorithm"], "SM2");
        Ok(())
    }

    #[test]
    fn test_non_existent_directory() {
        assert!(print_stats(Some("./derpherp".to_string()), StatsFormat::Json).is_err());
    }
}
