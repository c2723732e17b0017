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

use crate::clock::Clock;
use crate::clock::clock_from;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::scheduler::Stage;
use crate::scheduler::is_due;
use crate::scheduler::stage;
use crate::types::card_id::CardId;
use crate::types::date::Date;
use crate::types::progress::ProgressRecord;
use crate::types::timestamp::Timestamp;

#[derive(Serialize)]
pub struct CardReport {
    #[serde(flatten)]
    pub record: ProgressRecord,
    pub stage: Stage,
    pub due_date: Option<Date>,
    pub due_now: bool,
}

pub fn card_report(coll: &Collection, id: CardId, clock: &dyn Clock) -> Fallible<CardReport> {
    let record = coll.store.get(id)?;
    Ok(CardReport {
        stage: stage(&record),
        due_date: record.due_date(),
        due_now: is_due(&record, clock.now()),
        record,
    })
}

pub fn show_card(id: CardId, directory: Option<String>, now: Option<Timestamp>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let clock = clock_from(now);
    let report = card_report(&coll, id, clock.as_ref())?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
