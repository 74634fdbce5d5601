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

//! Extraction of flashcard candidates, links and tags from note text.
//!
//! Every function here is total: markup that does not match a rule is
//! skipped. Offsets are in characters, not bytes.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::card_type::CardType;

/// What a hidden cloze span is replaced with on the front of a card.
pub const CLOZE_PLACEHOLDER: &str = "[...]";

/// Characters of surrounding text kept on each side of a backlink.
const BACKLINK_CONTEXT: usize = 50;

static SIMPLE_CLOZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("invalid simple cloze pattern"));

static NUMBERED_CLOZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{c(\d+)::([^}]+)\}\}").expect("invalid numbered cloze pattern")
});

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("invalid link pattern"));

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([\w-]+(?:/[\w-]+)*)").expect("invalid tag pattern"));

/// A flashcard candidate found in a note. Not yet a card: it has no
/// identity or scheduling state.
#[derive(Clone, PartialEq, Debug)]
pub struct ParsedFlashcard {
    pub card_type: CardType,
    pub front: String,
    pub back: String,
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ParsedLink {
    /// The text between the double brackets, i.e. the title of the target.
    pub target: String,
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ParsedTag {
    /// The tag name without the leading `#`, e.g. `parent/child`.
    pub name: String,
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Backlink {
    pub note_id: String,
    pub context: String,
}

/// Parse every flashcard candidate in a note: basic cards first, then
/// clozes. The two scans are independent, so one line may contribute to
/// both.
pub fn parse_flashcards(text: &str) -> Vec<ParsedFlashcard> {
    let mut cards = parse_basic_flashcards(text);
    cards.extend(parse_cloze_flashcards(text));
    cards
}

/// Parse `front :: back` lines. Only the first `::` on a line separates the
/// two sides. It must come after at least one character and be followed by
/// at least one, though either side may be blank once trimmed.
pub fn parse_basic_flashcards(text: &str) -> Vec<ParsedFlashcard> {
    let mut cards = Vec::new();
    let mut offset = 0;
    for line in text.split('\n') {
        let length = line.chars().count();
        if let Some((front, back)) = split_basic_line(line) {
            cards.push(ParsedFlashcard {
                card_type: CardType::Basic,
                front: front.trim().to_string(),
                back: back.trim().to_string(),
                start_index: offset,
                end_index: offset + length,
            });
        }
        // Account for the newline.
        offset += length + 1;
    }
    cards
}

fn split_basic_line(line: &str) -> Option<(&str, &str)> {
    let first = line.chars().next()?;
    let skip = first.len_utf8();
    let separator = skip + line[skip..].find("::")?;
    let back = &line[separator + 2..];
    if back.is_empty() {
        return None;
    }
    Some((&line[..separator], back))
}

/// Parse cloze deletions. Each `{text}` span is its own card. Numbered spans
/// `{{cN::text}}` are grouped by `N`, and each group is one card hiding all
/// of its spans; other groups are left as written.
pub fn parse_cloze_flashcards(text: &str) -> Vec<ParsedFlashcard> {
    let numbered = numbered_clozes(text);
    let mut cards = Vec::new();

    for caps in SIMPLE_CLOZE.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let span = whole.range();
        // Braces belonging to numbered markup are not simple clozes.
        if numbered
            .iter()
            .any(|c| c.span.start <= span.start && span.end <= c.span.end)
        {
            continue;
        }
        cards.push(ParsedFlashcard {
            card_type: CardType::Cloze,
            front: hide_spans(text, std::slice::from_ref(&span)),
            back: inner.as_str().to_string(),
            start_index: char_offset(text, span.start),
            end_index: char_offset(text, span.end),
        });
    }

    // Groups in order of first appearance.
    let mut groups: Vec<(&str, Vec<&NumberedCloze>)> = Vec::new();
    for cloze in &numbered {
        match groups.iter_mut().find(|(key, _)| *key == cloze.group) {
            Some((_, members)) => members.push(cloze),
            None => groups.push((cloze.group, vec![cloze])),
        }
    }
    let length = text.chars().count();
    for (_, members) in groups {
        let spans: Vec<Range<usize>> = members.iter().map(|c| c.span.clone()).collect();
        let answers: Vec<&str> = members.iter().map(|c| c.text).collect();
        cards.push(ParsedFlashcard {
            card_type: CardType::Cloze,
            front: hide_spans(text, &spans),
            back: answers.join(", "),
            start_index: 0,
            end_index: length,
        });
    }

    cards
}

struct NumberedCloze<'a> {
    /// The cloze number without leading zeros, so `c01` and `c1` group
    /// together.
    group: &'a str,
    text: &'a str,
    /// Byte range of the whole `{{cN::text}}` markup.
    span: Range<usize>,
}

fn numbered_clozes(text: &str) -> Vec<NumberedCloze<'_>> {
    NUMBERED_CLOZE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(1)?;
            let inner = caps.get(2)?;
            Some(NumberedCloze {
                group: number.as_str().trim_start_matches('0'),
                text: inner.as_str(),
                span: whole.range(),
            })
        })
        .collect()
}

/// Replace the given byte ranges (sorted, non-overlapping) with the
/// placeholder.
fn hide_spans(text: &str, spans: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        out.push_str(&text[cursor..span.start]);
        out.push_str(CLOZE_PLACEHOLDER);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

/// Parse `[[target]]` links.
pub fn parse_links(text: &str) -> Vec<ParsedLink> {
    LINK.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let target = caps.get(1)?;
            Some(ParsedLink {
                target: target.as_str().to_string(),
                start_index: char_offset(text, whole.start()),
                end_index: char_offset(text, whole.end()),
            })
        })
        .collect()
}

/// Parse `#tag` and hierarchical `#parent/child` tags.
pub fn parse_tags(text: &str) -> Vec<ParsedTag> {
    TAG.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            Some(ParsedTag {
                name: name.as_str().to_string(),
                start_index: char_offset(text, whole.start()),
                end_index: char_offset(text, whole.end()),
            })
        })
        .collect()
}

/// The distinct link targets in a note, in order of first appearance.
pub fn extract_references(text: &str) -> Vec<String> {
    dedup(parse_links(text).into_iter().map(|l| l.target))
}

/// The distinct tag names in a note, in order of first appearance.
pub fn extract_tags(text: &str) -> Vec<String> {
    dedup(parse_tags(text).into_iter().map(|t| t.name))
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}

/// Find the notes that link to `target_title`. `notes` yields `(id, text)`
/// pairs; the target note itself is skipped.
pub fn find_backlinks<'a>(
    target_id: &str,
    target_title: &str,
    notes: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Vec<Backlink> {
    let mut backlinks = Vec::new();
    for (note_id, text) in notes {
        if note_id == target_id {
            continue;
        }
        let links = parse_links(text);
        if let Some(link) = links.iter().find(|l| l.target == target_title) {
            let start = link.start_index.saturating_sub(BACKLINK_CONTEXT);
            let end = link.end_index + BACKLINK_CONTEXT;
            let context: String = text.chars().skip(start).take(end - start).collect();
            backlinks.push(Backlink {
                note_id: note_id.to_string(),
                context: format!("...{context}..."),
            });
        }
    }
    backlinks
}
