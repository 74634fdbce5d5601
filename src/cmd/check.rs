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

use crate::collection::load_notes;
use crate::collection::resolve_directory;
use crate::error::Fallible;
use crate::parser::parse_flashcards;

/// Parse every note without touching the database. Returns the number of
/// flashcard candidates found.
pub fn check_notes(directory: Option<String>) -> Fallible<usize> {
    let directory = resolve_directory(directory)?;
    let notes = load_notes(&directory)?;
    let count: usize = notes
        .iter()
        .map(|note| parse_flashcards(&note.content).len())
        .sum();
    println!("{} notes, {count} cards: ok", notes.len());
    Ok(count)
}
