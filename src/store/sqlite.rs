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

use std::path::Path;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use rusqlite::Connection;
use rusqlite::Row;
use rusqlite::Transaction;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::store::Backend;
use crate::types::progress::ProgressRecord;

/// Stores the collection in a SQLite database, one row per card.
pub struct SqliteBackend {
    location: String,
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub fn new(database_path: &Path) -> Fallible<Self> {
        let location = database_path.display().to_string();
        let open_error = |e: rusqlite::Error| {
            ErrorReport::store_io("open progress database", location.clone(), e)
        };
        let mut conn = Connection::open(database_path).map_err(open_error)?;
        {
            let tx = conn.transaction().map_err(open_error)?;
            if !schema_exists(&tx).map_err(open_error)? {
                tx.execute_batch(include_str!("schema.sql"))
                    .map_err(open_error)?;
                tx.commit().map_err(open_error)?;
            }
        }
        Ok(Self {
            location,
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    #[cfg(test)]
    pub fn in_memory() -> Fallible<Self> {
        Self::new(Path::new(":memory:"))
    }

    fn acquire(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Backend for SqliteBackend {
    fn location(&self) -> String {
        self.location.clone()
    }

    fn read_all(&self) -> Fallible<Vec<ProgressRecord>> {
        let load_error =
            |e: rusqlite::Error| ErrorReport::store_io("load progress", self.location(), e);
        let conn = self.acquire();
        let sql = "select id, date_last_studied, num_times_studied, ease_factor, interval, repetitions, total_correct, total_incorrect, total_studied, total_correct_streak, total_incorrect_streak from progress order by id;";
        let mut stmt = conn.prepare(sql).map_err(load_error)?;
        let mut rows = stmt.query([]).map_err(load_error)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(load_error)? {
            records.push(read_record(row).map_err(load_error)?);
        }
        Ok(records)
    }

    fn write_all(&self, records: &[ProgressRecord]) -> Fallible<()> {
        let save_error =
            |e: rusqlite::Error| ErrorReport::store_io("save progress", self.location(), e);
        let mut conn = self.acquire();
        // Dropping an uncommitted transaction rolls it back, so a failure
        // anywhere below leaves the previous rows in place.
        let tx = conn.transaction().map_err(save_error)?;
        tx.execute("delete from progress;", []).map_err(save_error)?;
        for record in records {
            insert_record(&tx, record).map_err(save_error)?;
        }
        tx.commit().map_err(save_error)?;
        Ok(())
    }
}

fn read_record(row: &Row) -> rusqlite::Result<ProgressRecord> {
    Ok(ProgressRecord {
        id: row.get(0)?,
        last_studied_at: row.get(1)?,
        times_studied: row.get(2)?,
        ease_factor: row.get(3)?,
        interval_days: row.get(4)?,
        repetition_streak: row.get(5)?,
        total_correct: row.get(6)?,
        total_incorrect: row.get(7)?,
        total_studied: row.get(8)?,
        current_correct_streak: row.get(9)?,
        current_incorrect_streak: row.get(10)?,
    })
}

fn insert_record(tx: &Transaction, record: &ProgressRecord) -> rusqlite::Result<()> {
    let sql = "insert into progress (id, date_last_studied, num_times_studied, ease_factor, interval, repetitions, total_correct, total_incorrect, total_studied, total_correct_streak, total_incorrect_streak) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);";
    tx.execute(
        sql,
        (
            record.id,
            record.last_studied_at,
            record.times_studied,
            record.ease_factor,
            record.interval_days,
            record.repetition_streak,
            record.total_correct,
            record.total_incorrect,
            record.total_studied,
            record.current_correct_streak,
            record.current_incorrect_streak,
        ),
    )?;
    Ok(())
}

fn schema_exists(tx: &Transaction) -> rusqlite::Result<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["progress"], |row| row.get(0))?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use tempfile::tempdir;

    use super::*;
    use crate::types::card_id::CardId;
    use crate::types::timestamp::Timestamp;

    fn sample() -> Fallible<Vec<ProgressRecord>> {
        let mut studied = ProgressRecord::new(CardId::new(7)?);
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        studied.last_studied_at = Some(Timestamp::new(at));
        studied.times_studied = 3;
        studied.ease_factor = 2.3;
        studied.interval_days = 6;
        studied.repetition_streak = 2;
        studied.total_correct = 2;
        studied.total_incorrect = 1;
        studied.total_studied = 3;
        studied.current_correct_streak = 2;
        Ok(vec![ProgressRecord::new(CardId::new(2)?), studied])
    }

    #[test]
    fn test_in_memory_round_trip() -> Fallible<()> {
        let backend = SqliteBackend::in_memory()?;
        assert!(backend.read_all()?.is_empty());
        let records = sample()?;
        backend.write_all(&records)?;
        assert_eq!(backend.read_all()?, records);
        Ok(())
    }

    #[test]
    fn test_write_replaces_previous_rows() -> Fallible<()> {
        let backend = SqliteBackend::in_memory()?;
        backend.write_all(&sample()?)?;
        let only = vec![ProgressRecord::new(CardId::new(99)?)];
        backend.write_all(&only)?;
        assert_eq!(backend.read_all()?, only);
        Ok(())
    }

    #[test]
    fn test_reopen_file() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("progress.db");
        let records = sample()?;
        SqliteBackend::new(&path)?.write_all(&records)?;
        let reopened = SqliteBackend::new(&path)?;
        assert_eq!(reopened.read_all()?, records);
        Ok(())
    }

    #[test]
    fn test_duplicate_ids_roll_back() -> Fallible<()> {
        let backend = SqliteBackend::in_memory()?;
        let records = sample()?;
        backend.write_all(&records)?;
        let duplicated = vec![
            ProgressRecord::new(CardId::new(1)?),
            ProgressRecord::new(CardId::new(1)?),
        ];
        assert!(backend.write_all(&duplicated).is_err());
        assert_eq!(backend.read_all()?, records);
        Ok(())
    }
}
