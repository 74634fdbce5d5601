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

use std::io::BufRead;
use std::io::Write;
use std::io::stdin;
use std::io::stdout;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::queue::due_cards;
use crate::scheduler::Algorithm;
use crate::session::Session;
use crate::session::SessionSummary;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

pub fn drill(directory: Option<String>, algorithm: Option<Algorithm>) -> Fallible<()> {
    let mut input = stdin().lock();
    let mut output = stdout();
    run_drill(
        directory,
        algorithm,
        Timestamp::now(),
        &mut input,
        &mut output,
    )?;
    Ok(())
}

/// Review the due cards of a collection in the terminal. Each rated card is
/// saved as soon as it is rated. End of input abandons the session; the
/// cards rated so far are kept.
pub fn run_drill(
    directory: Option<String>,
    algorithm: Option<Algorithm>,
    now: Timestamp,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Fallible<SessionSummary> {
    let mut collection = Collection::open(directory, now)?;
    let scheduler = collection.settings.scheduler(algorithm)?;
    let cards = collection.db.cards()?;
    let queue = due_cards(cards.values(), now);
    if queue.is_empty() {
        writeln!(output, "No cards due.")?;
    } else {
        writeln!(
            output,
            "{} cards due. Scheduling with {}.",
            queue.len(),
            scheduler.algorithm()
        )?;
    }

    let mut session = Session::new(scheduler, queue, now);
    while let Some(card) = session.current_card().cloned() {
        writeln!(output)?;
        writeln!(output, "Q: {}", card.front)?;
        writeln!(output, "[press enter to reveal]")?;
        output.flush()?;
        if read_line(input)?.is_none() {
            break;
        }
        session.reveal()?;
        writeln!(output, "A: {}", card.back)?;
        let Some(rating) = read_rating(input, output)? else {
            break;
        };
        let updated = session.rate(rating, now)?;
        collection.db.update_card(&updated)?;
    }

    let summary = session.summary(Timestamp::now());
    if !session.outcomes().is_empty() {
        collection.db.save_session(&summary, session.outcomes())?;
    }
    if !session.is_complete() {
        log::warn!("Session ended with {} cards left.", session.remaining());
    }
    writeln!(
        output,
        "Reviewed {} cards, {} correct.",
        summary.cards_reviewed, summary.correct_cards
    )?;
    Ok(summary)
}

/// Read one line, without its line terminator. `None` at end of input.
fn read_line(input: &mut impl BufRead) -> Fallible<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn read_rating(input: &mut impl BufRead, output: &mut impl Write) -> Fallible<Option<Rating>> {
    loop {
        writeln!(output, "Rating: (1 = Again, 2 = Hard, 3 = Good, 4 = Easy)")?;
        output.flush()?;
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        match Rating::from_key(&line) {
            Some(rating) => return Ok(Some(rating)),
            None => writeln!(output, "Invalid input. Please enter a number between 1 and 4.")?,
        }
    }
}
