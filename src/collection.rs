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

use std::env::current_dir;
use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use walkdir::WalkDir;

use crate::config::Settings;
use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::parser::parse_flashcards;
use crate::types::card::Flashcard;
use crate::types::timestamp::Timestamp;

pub const DATABASE_FILE: &str = "notecards.db";

/// A note: a Markdown file in the notes directory.
#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    /// The path relative to the notes directory, with `/` separators.
    pub id: String,
    /// The file name without its extension.
    pub title: String,
    pub content: String,
}

/// A notes directory, its settings and its card database.
pub struct Collection {
    pub directory: PathBuf,
    pub settings: Settings,
    pub db: Database,
    pub notes: Vec<Note>,
}

impl Collection {
    /// Open a notes directory (the current directory if none is given),
    /// load every note, and store the cards of any note that are not yet
    /// in the database.
    pub fn open(directory: Option<String>, now: Timestamp) -> Fallible<Self> {
        let directory = resolve_directory(directory)?;
        let settings = Settings::load(&directory)?;

        let db_path: PathBuf = directory.join(DATABASE_FILE);
        let db_path: &str = db_path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        let db = Database::new(db_path)?;

        let notes = {
            log::debug!("Loading notes...");
            let start = Instant::now();
            let notes = load_notes(&directory)?;
            let duration = start.elapsed().as_millis();
            log::debug!("Loaded {} notes in {duration}ms.", notes.len());
            notes
        };

        let mut added = 0;
        for card in materialize_notes(&notes, now) {
            if db.insert_card(&card)? {
                added += 1;
            }
        }
        if added > 0 {
            log::info!("Added {added} new cards.");
        }

        Ok(Self {
            directory,
            settings,
            db,
            notes,
        })
    }
}

pub fn resolve_directory(directory: Option<String>) -> Fallible<PathBuf> {
    let directory: PathBuf = match directory {
        Some(dir) => PathBuf::from(dir),
        None => current_dir()?,
    };
    if directory.exists() {
        Ok(directory.canonicalize()?)
    } else {
        fail("directory does not exist.")
    }
}

/// Read every `.md` file under a directory, sorted by id.
pub fn load_notes(directory: &Path) -> Fallible<Vec<Note>> {
    let mut notes = Vec::new();
    for entry in WalkDir::new(directory) {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            let relative = path.strip_prefix(directory).unwrap_or(path);
            let id = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let title = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default();
            let content = read_to_string(path)?;
            notes.push(Note { id, title, content });
        }
    }
    notes.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(notes)
}

/// Build new cards for every candidate in every note.
pub fn materialize_notes(notes: &[Note], now: Timestamp) -> Vec<Flashcard> {
    notes
        .iter()
        .flat_map(|note| {
            parse_flashcards(&note.content)
                .into_iter()
                .map(move |parsed| Flashcard::materialize(&parsed, Some(note.id.as_str()), now))
        })
        .collect()
}
