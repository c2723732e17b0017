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

use std::env::current_dir;
use std::path::PathBuf;

use crate::catalog::load_catalog;
use crate::config::Config;
use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::Scheduler;
use crate::store::ProgressStore;
use crate::types::card_id::CardId;

/// A study directory: its config, its progress store, and the scheduler
/// configured for it.
pub struct Collection {
    pub directory: PathBuf,
    pub config: Config,
    pub store: ProgressStore,
    pub scheduler: Scheduler,
}

impl Collection {
    pub fn new(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        let directory = if directory.exists() {
            directory.canonicalize()?
        } else {
            return fail("directory does not exist.");
        };

        let config = Config::load(&directory)?;
        let progress_path = directory.join(&config.progress_file);
        let store = ProgressStore::open_with(&progress_path, config.scheduler.min_ease)?;
        let scheduler = Scheduler::new(config.scheduler.clone());

        Ok(Self {
            directory,
            config,
            store,
            scheduler,
        })
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.directory.join(&self.config.catalog_file)
    }

    /// The card IDs of the catalog, in file order.
    pub fn catalog(&self) -> Fallible<Vec<CardId>> {
        load_catalog(&self.catalog_path())
    }
}
