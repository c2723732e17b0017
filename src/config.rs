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

use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::scheduler::Policy;

/// Name of the optional config file in a collection directory.
pub const CONFIG_FILE: &str = "kioku.toml";

/// Per-collection settings.
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Progress file, relative to the collection directory. A `.db`,
    /// `.sqlite` or `.sqlite3` extension selects the SQLite backend.
    pub progress_file: PathBuf,
    /// Flashcard file whose card IDs make up the catalog.
    pub catalog_file: PathBuf,
    pub scheduler: Policy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            progress_file: PathBuf::from("flashcard_progress.json"),
            catalog_file: PathBuf::from("flashcards_with_ids.json"),
            scheduler: Policy::default(),
        }
    }
}

impl Config {
    /// Load the config from `directory`, falling back to the defaults if
    /// there is no config file.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No {CONFIG_FILE}, using defaults.");
            return Ok(Self::default());
        }
        let content = match read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                let message = e.to_string();
                return Err(ErrorReport::Config { path, message });
            }
        };
        match Self::parse(&content) {
            Ok(config) => Ok(config),
            Err(message) => Err(ErrorReport::Config { path, message }),
        }
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let config: Config = toml::from_str(content).map_err(|e| e.to_string())?;
        config.scheduler.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() -> Fallible<()> {
        let dir = tempdir()?;
        assert_eq!(Config::load(dir.path())?, Config::default());
        Ok(())
    }

    #[test]
    fn test_partial_config() {
        let content = r#"
            progress_file = "progress.sqlite3"

            [scheduler]
            incorrect_penalty = 0.3
            max_interval = 365
        "#;
        let config = Config::parse(content).unwrap();
        assert_eq!(config.progress_file, PathBuf::from("progress.sqlite3"));
        assert_eq!(config.catalog_file, PathBuf::from("flashcards_with_ids.json"));
        assert_eq!(config.scheduler.incorrect_penalty, 0.3);
        assert_eq!(config.scheduler.max_interval, Some(365));
        assert_eq!(config.scheduler.correct_bonus, 0.1);
        assert_eq!(config.scheduler.min_ease, 1.3);
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        let result = Config::parse("[scheduler]\nmin_ease = 3.0\n");
        let err = result.err().unwrap();
        assert!(err.contains("initial_ease"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::parse("progres_file = \"typo.json\"\n").is_err());
        assert!(Config::parse("[scheduler]\nbonus = 0.2\n").is_err());
    }

    #[test]
    fn test_load_reports_path() -> Fallible<()> {
        let dir = tempdir()?;
        write(dir.path().join(CONFIG_FILE), "scheduler = 5")?;
        let err = Config::load(dir.path()).err().unwrap();
        assert!(matches!(err, ErrorReport::Config { .. }));
        assert!(err.to_string().contains(CONFIG_FILE));
        Ok(())
    }
}
