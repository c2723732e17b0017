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

use crate::clock::Clock;
use crate::clock::clock_from;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::scheduler::Stage;
use crate::scheduler::review_queue;
use crate::scheduler::stage;
use crate::types::card_id::CardId;
use crate::types::date::Date;
use crate::types::timestamp::Timestamp;

#[derive(Debug, PartialEq)]
pub struct DueCard {
    pub id: CardId,
    pub stage: Stage,
    /// `None` for cards that were never studied.
    pub due_date: Option<Date>,
}

/// The review queue at the clock's current time, at most `limit` long.
pub fn due_cards(coll: &Collection, clock: &dyn Clock, limit: Option<usize>) -> Vec<DueCard> {
    let records = coll.store.snapshot();
    let queue = review_queue(records.values(), clock.now());
    queue
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .filter_map(|id| records.get(&id))
        .map(|record| DueCard {
            id: record.id,
            stage: stage(record),
            due_date: record.due_date(),
        })
        .collect()
}

pub fn list_due(
    directory: Option<String>,
    now: Option<Timestamp>,
    limit: Option<usize>,
) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let clock = clock_from(now);
    let cards = due_cards(&coll, clock.as_ref(), limit);
    if cards.is_empty() {
        println!("No cards due today.");
        return Ok(());
    }
    for card in cards {
        match card.due_date {
            Some(due_date) => println!("{}\t{}\t{}", card.id, card.stage, due_date),
            None => println!("{}\t{}", card.id, card.stage),
        }
    }
    Ok(())
}
