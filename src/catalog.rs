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
use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::card_id::CardId;

/// Only the ID matters here; the card content is someone else's business.
#[derive(Deserialize)]
struct CatalogEntry {
    id: Option<Value>,
}

/// Read the card IDs from a flashcard file, in file order.
///
/// The file is a JSON array of card objects. Every card must have a unique,
/// positive integer `id`.
pub fn load_catalog(path: &Path) -> Fallible<Vec<CardId>> {
    let location = path.display().to_string();
    let content = match read_to_string(path) {
        Ok(content) => content,
        Err(e) => return Err(ErrorReport::store_io("load catalog", location, e)),
    };
    parse_catalog(&content).map_err(|e| match e {
        ErrorReport::Message(msg) => ErrorReport::store_io("load catalog", location, msg),
        ErrorReport::Json(e) => ErrorReport::store_io("load catalog", location, e),
        other => other,
    })
}

pub fn parse_catalog(content: &str) -> Fallible<Vec<CardId>> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(content)?;
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let Some(id) = entry.id.as_ref().and_then(Value::as_u64) else {
            return fail(format!("card at index {index} has no positive integer ID"));
        };
        if id == 0 {
            return fail(format!("card at index {index} has ID 0"));
        }
        let id = CardId::new(id)?;
        if !seen.insert(id) {
            return fail(format!("card ID {id} is used more than once"));
        }
        ids.push(id);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_parse_keeps_file_order() -> Fallible<()> {
        let content = r#"[
            {"id": 3, "english": "dog", "word_kanji": "犬"},
            {"id": 1, "english": "cat", "word_kanji": "猫"},
            {"id": 2, "english": "bird"}
        ]"#;
        let ids = parse_catalog(content)?;
        let ids: Vec<u64> = ids.into_iter().map(CardId::get).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        Ok(())
    }

    #[test]
    fn test_empty_catalog() -> Fallible<()> {
        assert!(parse_catalog("[]")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_id() {
        assert!(parse_catalog(r#"[{"english": "dog"}]"#).is_err());
        assert!(parse_catalog(r#"[{"id": "7"}]"#).is_err());
        assert!(parse_catalog(r#"[{"id": -1}]"#).is_err());
        assert!(parse_catalog(r#"[{"id": 0}]"#).is_err());
    }

    #[test]
    fn test_duplicate_id() {
        let err = parse_catalog(r#"[{"id": 4}, {"id": 4}]"#).err().unwrap();
        assert_eq!(err.to_string(), "error: card ID 4 is used more than once");
    }

    #[test]
    fn test_load_from_file() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("flashcards_with_ids.json");
        write(&path, r#"[{"id": 1}, {"id": 2}]"#)?;
        assert_eq!(load_catalog(&path)?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_load_errors_name_the_file() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("cards.json");
        let err = load_catalog(&path).err().unwrap();
        assert!(matches!(
            err,
            ErrorReport::StoreIo {
                operation: "load catalog",
                ..
            }
        ));
        write(&path, "not json")?;
        let err = load_catalog(&path).err().unwrap();
        assert!(err.to_string().contains("cards.json"));
        Ok(())
    }
}
