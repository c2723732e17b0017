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

use crate::collection::Collection;
use crate::error::Fallible;

#[derive(Debug, PartialEq)]
pub struct InitSummary {
    pub added: usize,
    pub total: usize,
}

/// Give every catalog card without a progress record a fresh one, and save.
pub fn init_collection(coll: &Collection) -> Fallible<InitSummary> {
    let catalog = coll.catalog()?;
    let before = coll.store.len();
    let policy = coll.scheduler.policy();
    let all = coll
        .store
        .bootstrap_with(&catalog, |id| policy.initial_record(id));
    coll.store.save()?;
    Ok(InitSummary {
        added: all.len() - before,
        total: all.len(),
    })
}

pub fn init(directory: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let InitSummary { added, total } = init_collection(&coll)?;
    println!("Added {added} new cards ({total} total).");
    Ok(())
}
