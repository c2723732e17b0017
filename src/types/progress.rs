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

use serde::Deserialize;
use serde::Serialize;

use crate::types::card_id::CardId;
use crate::types::date::Date;
use crate::types::timestamp::Timestamp;

/// The ease factor of a card that has never been reviewed.
pub const INITIAL_EASE: f64 = 2.5;

/// The lowest ease factor a card can have.
pub const MIN_EASE: f64 = 1.3;

/// The interval of a card that has never been reviewed, in days.
pub const INITIAL_INTERVAL: u32 = 1;

/// The spaced repetition state of a single card.
///
/// The serialized field names are the on-disk layout of the progress file.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub id: CardId,
    /// When the card was last reviewed. `None` if it never was.
    #[serde(rename = "date_last_studied")]
    pub last_studied_at: Option<Timestamp>,
    #[serde(rename = "num_times_studied")]
    pub times_studied: u32,
    pub ease_factor: f64,
    /// Days from the last review to the next due date.
    #[serde(rename = "interval")]
    pub interval_days: u32,
    /// Consecutive correct answers since the last lapse.
    #[serde(rename = "repetitions")]
    pub repetition_streak: u32,
    pub total_correct: u32,
    pub total_incorrect: u32,
    pub total_studied: u32,
    #[serde(rename = "total_correct_streak")]
    pub current_correct_streak: u32,
    #[serde(rename = "total_incorrect_streak")]
    pub current_incorrect_streak: u32,
}

impl ProgressRecord {
    /// The state of a card that has just been registered.
    pub fn new(id: CardId) -> Self {
        Self::with_ease(id, INITIAL_EASE)
    }

    pub fn with_ease(id: CardId, ease_factor: f64) -> Self {
        Self {
            id,
            last_studied_at: None,
            times_studied: 0,
            ease_factor,
            interval_days: INITIAL_INTERVAL,
            repetition_streak: 0,
            total_correct: 0,
            total_incorrect: 0,
            total_studied: 0,
            current_correct_streak: 0,
            current_incorrect_streak: 0,
        }
    }

    /// The date the card next comes due. `None` for a card that has never
    /// been reviewed, which is always due.
    pub fn due_date(&self) -> Option<Date> {
        self.last_studied_at
            .map(|ts| ts.utc_date().add_days(self.interval_days))
    }

    /// Check the record's invariants, returning a description of the first
    /// violation.
    pub fn validate(&self, min_ease: f64) -> Result<(), String> {
        if !self.ease_factor.is_finite() || self.ease_factor < min_ease {
            return Err(format!(
                "card {}: ease factor {} is below {min_ease}",
                self.id, self.ease_factor
            ));
        }
        if self.interval_days < 1 {
            return Err(format!("card {}: interval must be at least one day", self.id));
        }
        if u64::from(self.total_studied)
            != u64::from(self.total_correct) + u64::from(self.total_incorrect)
        {
            return Err(format!(
                "card {}: total studied {} does not equal {} correct plus {} incorrect",
                self.id, self.total_studied, self.total_correct, self.total_incorrect
            ));
        }
        if self.current_correct_streak > 0 && self.current_incorrect_streak > 0 {
            return Err(format!(
                "card {}: correct and incorrect streaks are both nonzero",
                self.id
            ));
        }
        Ok(())
    }
}

impl AsRef<ProgressRecord> for ProgressRecord {
    fn as_ref(&self) -> &ProgressRecord {
        self
    }
}
