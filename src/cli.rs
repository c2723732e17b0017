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

use crate::cmd::answer::answer;
use crate::cmd::due::list_due;
use crate::cmd::init::init;
use crate::cmd::orphans::list_orphans;
use crate::cmd::show::show_card;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;
use crate::error::Fallible;
use crate::types::card_id::CardId;
use crate::types::timestamp::Timestamp;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Create progress records for every card in the catalog.
    Init {
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// List the cards due for review, in review order.
    Due {
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
        /// Pretend the current time is this RFC 3339 timestamp.
        #[arg(long)]
        now: Option<Timestamp>,
        /// Show at most this many cards.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Record an answer for a card.
    Answer {
        /// The card ID.
        id: CardId,
        /// `correct` or `incorrect`.
        outcome: String,
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
        /// Pretend the current time is this RFC 3339 timestamp.
        #[arg(long)]
        now: Option<Timestamp>,
    },
    /// Print the progress of a card as JSON.
    Show {
        /// The card ID.
        id: CardId,
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
        /// Pretend the current time is this RFC 3339 timestamp.
        #[arg(long)]
        now: Option<Timestamp>,
    },
    /// Print collection statistics.
    Stats {
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
        /// Pretend the current time is this RFC 3339 timestamp.
        #[arg(long)]
        now: Option<Timestamp>,
        /// Output format.
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
    /// List cards that have progress but are no longer in the catalog.
    Orphans {
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
        /// Delete the orphaned records.
        #[arg(long)]
        prune: bool,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Init { directory } => init(directory),
        Command::Due {
            directory,
            now,
            limit,
        } => list_due(directory, now, limit),
        Command::Answer {
            id,
            outcome,
            directory,
            now,
        } => answer(id, outcome, directory, now),
        Command::Show { id, directory, now } => show_card(id, directory, now),
        Command::Stats {
            directory,
            now,
            format,
        } => print_stats(directory, now, format),
        Command::Orphans { directory, prune } => list_orphans(directory, prune),
    }
}
