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
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::scheduler::Scheduled;
use crate::types::card_id::CardId;
use crate::types::outcome::Outcome;
use crate::types::progress::ProgressRecord;
use crate::types::timestamp::Timestamp;

/// Record an answer for a card and save the collection.
///
/// A card that is in the catalog but has no record yet is registered first,
/// so `init` does not have to run after every catalog edit.
pub fn record_answer(
    coll: &Collection,
    id: CardId,
    outcome: Outcome,
    clock: &dyn Clock,
) -> Fallible<Scheduled> {
    if !coll.store.contains(id) {
        if !coll.catalog()?.contains(&id) {
            return Err(ErrorReport::not_found(id, "answer"));
        }
        let policy = coll.scheduler.policy();
        coll.store.bootstrap_with(&[id], |id| policy.initial_record(id));
    }
    let now = clock.now();
    let update = |record: &ProgressRecord| Ok(coll.scheduler.update(record, outcome, now));
    let scheduled = coll.store.modify(id, update)?;
    coll.store.save()?;
    Ok(scheduled)
}

pub fn answer(
    id: CardId,
    outcome: String,
    directory: Option<String>,
    now: Option<Timestamp>,
) -> Fallible<()> {
    let outcome: Outcome = outcome.parse()?;
    let coll = Collection::new(directory)?;
    let clock = clock_from(now);
    let scheduled = record_answer(&coll, id, outcome, clock.as_ref())?;
    let interval = scheduled.record.interval_days;
    let days = if interval == 1 { "day" } else { "days" };
    println!(
        "Card {id}: {outcome}. Next review in {interval} {days}, on {}.",
        scheduled.due_date
    );
    Ok(())
}
