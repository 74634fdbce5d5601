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

use clap::Parser;

use crate::cmd::check::check_notes;
use crate::cmd::drill::drill;
use crate::cmd::due::list_due;
use crate::cmd::refs::print_refs;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;
use crate::error::Fallible;
use crate::scheduler::Algorithm;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Review the cards that are due.
    Drill {
        /// Path to the notes directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Scheduling algorithm to use instead of the one in the settings file.
        #[arg(long)]
        algorithm: Option<Algorithm>,
    },
    /// List the cards that are due, most overdue first.
    Due {
        /// Path to the notes directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Check that every note parses.
    Check {
        /// Path to the notes directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Print collection statistics.
    Stats {
        /// Path to the notes directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Output format.
        #[arg(long, default_value_t = StatsFormat::Json)]
        format: StatsFormat,
    },
    /// Print the links, tags and backlinks of every note.
    Refs {
        /// Path to the notes directory. By default, the current working directory is used.
        directory: Option<String>,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Drill {
            directory,
            algorithm,
        } => drill(directory, algorithm),
        Command::Due { directory } => list_due(directory),
        Command::Check { directory } => {
            check_notes(directory)?;
            Ok(())
        }
        Command::Stats { directory, format } => print_stats(directory, format),
        Command::Refs { directory } => print_refs(directory),
    }
}
