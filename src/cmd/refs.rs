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

use serde::Serialize;

use crate::collection::Note;
use crate::collection::load_notes;
use crate::collection::resolve_directory;
use crate::error::Fallible;
use crate::parser::Backlink;
use crate::parser::extract_references;
use crate::parser::extract_tags;
use crate::parser::find_backlinks;

/// The outgoing links, tags and incoming links of one note.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NoteRefs {
    pub note_id: String,
    pub links: Vec<String>,
    pub tags: Vec<String>,
    pub backlinks: Vec<String>,
}

pub fn print_refs(directory: Option<String>) -> Fallible<()> {
    let directory = resolve_directory(directory)?;
    let notes = load_notes(&directory)?;
    for refs in note_refs(&notes) {
        println!("{}", refs.note_id);
        for link in &refs.links {
            println!("  -> [[{link}]]");
        }
        for tag in &refs.tags {
            println!("  #{tag}");
        }
        for backlink in &refs.backlinks {
            println!("  <- {backlink}");
        }
    }
    Ok(())
}

pub fn note_refs(notes: &[Note]) -> Vec<NoteRefs> {
    notes
        .iter()
        .map(|note| {
            let backlinks: Vec<Backlink> = find_backlinks(
                &note.id,
                &note.title,
                notes.iter().map(|n| (n.id.as_str(), n.content.as_str())),
            );
            NoteRefs {
                note_id: note.id.clone(),
                links: extract_references(&note.content),
                tags: extract_tags(&note.content),
                backlinks: backlinks
                    .into_iter()
                    .map(|b| format!("{}: {}", b.note_id, b.context.replace('\n', " ")))
                    .collect(),
            }
        })
        .collect()
}
