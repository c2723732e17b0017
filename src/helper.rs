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

use std::fs::write;

use serde_json::json;
use tempfile::TempDir;
use tempfile::tempdir;

use crate::error::Fallible;

/// Create a collection directory holding a catalog with the given card IDs
/// and no progress file.
pub fn create_test_collection(ids: &[u64]) -> Fallible<TempDir> {
    let dir = tempdir()?;
    let cards: Vec<_> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "word_hiragana": "ねこ",
                "english": format!("card {id}"),
            })
        })
        .collect();
    write(
        dir.path().join("flashcards_with_ids.json"),
        serde_json::to_string_pretty(&cards)?,
    )?;
    Ok(dir)
}

pub fn directory_arg(dir: &TempDir) -> Option<String> {
    Some(dir.path().display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Collection;

    #[test]
    fn test_create_test_collection() -> Fallible<()> {
        let dir = create_test_collection(&[1, 2, 3])?;
        let coll = Collection::new(directory_arg(&dir))?;
        assert_eq!(coll.catalog()?.len(), 3);
        assert!(coll.store.is_empty());
        Ok(())
    }
}
