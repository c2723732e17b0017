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

use crate::clock::clock_from;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::scheduler::Stage;
use crate::scheduler::is_due;
use crate::scheduler::stage;
use crate::types::progress::ProgressRecord;
use crate::types::timestamp::Timestamp;

#[derive(ValueEnum, Clone)]
pub enum StatsFormat {
    /// Plain text output.
    Text,
    /// JSON output.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_stats(
    directory: Option<String>,
    now: Option<Timestamp>,
    format: StatsFormat,
) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let clock = clock_from(now);
    let records = coll.store.snapshot();
    let stats = Stats::compute(records.values(), clock.now());

    match format {
        StatsFormat::Text => {
            println!("Cards:      {}", stats.card_count);
            println!("  new:       {}", stats.new_count);
            println!("  learning:  {}", stats.learning_count);
            println!("  reviewing: {}", stats.reviewing_count);
            println!("  lapsed:    {}", stats.lapsed_count);
            println!("Due now:    {}", stats.due_count);
            println!("Reviews:    {}", stats.total_studied);
            if let Some(accuracy) = stats.accuracy {
                println!("Accuracy:   {:.1}%", accuracy * 100.0);
            }
            if let Some(ease) = stats.average_ease {
                println!("Mean ease:  {ease:.2}");
            }
        }
        StatsFormat::Json => {
            let stats_json = serde_json::to_string_pretty(&stats)?;
            println!("{stats_json}");
        }
    }
    Ok(())
}

#[derive(Serialize, Default, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    card_count: usize,
    new_count: usize,
    learning_count: usize,
    reviewing_count: usize,
    lapsed_count: usize,
    due_count: usize,
    total_studied: u64,
    total_correct: u64,
    total_incorrect: u64,
    /// Fraction of answers that were correct. Absent before the first answer.
    accuracy: Option<f64>,
    /// Mean ease factor of the cards that have been studied.
    average_ease: Option<f64>,
}

impl Stats {
    pub fn compute<'a>(
        records: impl IntoIterator<Item = &'a ProgressRecord>,
        now: Timestamp,
    ) -> Self {
        let mut stats = Stats::default();
        let mut ease_sum = 0.0;
        let mut studied = 0usize;
        for record in records {
            stats.card_count += 1;
            match stage(record) {
                Stage::New => stats.new_count += 1,
                Stage::Learning => stats.learning_count += 1,
                Stage::Reviewing => stats.reviewing_count += 1,
                Stage::Lapsed => stats.lapsed_count += 1,
            }
            if is_due(record, now) {
                stats.due_count += 1;
            }
            stats.total_studied += u64::from(record.total_studied);
            stats.total_correct += u64::from(record.total_correct);
            stats.total_incorrect += u64::from(record.total_incorrect);
            if record.times_studied > 0 {
                ease_sum += record.ease_factor;
                studied += 1;
            }
        }
        if stats.total_studied > 0 {
            stats.accuracy = Some(stats.total_correct as f64 / stats.total_studied as f64);
        }
        if studied > 0 {
            stats.average_ease = Some(ease_sum / studied as f64);
        }
        stats
    }
}
