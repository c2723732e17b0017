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

use std::collections::HashSet;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::types::card_id::CardId;

/// Cards that have a progress record but are no longer in the catalog, in
/// ascending order.
pub fn find_orphans(coll: &Collection) -> Fallible<Vec<CardId>> {
    let catalog: HashSet<CardId> = coll.catalog()?.into_iter().collect();
    let orphans = coll
        .store
        .snapshot()
        .into_keys()
        .filter(|id| !catalog.contains(id))
        .collect();
    Ok(orphans)
}

/// Delete the records of orphaned cards and save.
pub fn prune_orphans(coll: &Collection) -> Fallible<Vec<CardId>> {
    let catalog: HashSet<CardId> = coll.catalog()?.into_iter().collect();
    let removed = coll.store.retain(&catalog);
    if !removed.is_empty() {
        coll.store.save()?;
    }
    Ok(removed)
}

pub fn list_orphans(directory: Option<String>, prune: bool) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let orphans = if prune {
        prune_orphans(&coll)?
    } else {
        find_orphans(&coll)?
    };
    for id in orphans {
        println!("{id}");
    }
    Ok(())
}
