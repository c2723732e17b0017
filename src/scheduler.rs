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

//! SM-2 style scheduling. Everything here is a pure function of its inputs:
//! callers read a record from the store, pass it through [`Scheduler::update`]
//! and write the result back.

use std::cmp::Reverse;
use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::types::card_id::CardId;
use crate::types::date::Date;
use crate::types::outcome::Outcome;
use crate::types::progress::INITIAL_EASE;
use crate::types::progress::INITIAL_INTERVAL;
use crate::types::progress::MIN_EASE;
use crate::types::progress::ProgressRecord;
use crate::types::timestamp::Timestamp;

/// The numeric constants of the scheduling algorithm.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    /// Ease factor given to newly registered cards.
    pub initial_ease: f64,
    /// Floor for the ease factor.
    pub min_ease: f64,
    /// Added to the ease factor on a correct answer.
    pub correct_bonus: f64,
    /// Subtracted from the ease factor on an incorrect answer.
    pub incorrect_penalty: f64,
    /// Interval after the first correct answer in a streak.
    pub first_interval: u32,
    /// Interval after the second correct answer in a streak.
    pub second_interval: u32,
    /// Optional ceiling for the interval.
    pub max_interval: Option<u32>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            initial_ease: INITIAL_EASE,
            min_ease: MIN_EASE,
            correct_bonus: 0.1,
            incorrect_penalty: 0.2,
            first_interval: 1,
            second_interval: 6,
            max_interval: None,
        }
    }
}

impl Policy {
    pub fn validate(&self) -> Result<(), String> {
        let finite = [
            self.initial_ease,
            self.min_ease,
            self.correct_bonus,
            self.incorrect_penalty,
        ];
        if finite.iter().any(|x| !x.is_finite()) {
            return Err("ease parameters must be finite numbers".to_string());
        }
        if self.min_ease <= 0.0 {
            return Err("min_ease must be positive".to_string());
        }
        if self.initial_ease < self.min_ease {
            return Err("initial_ease must not be below min_ease".to_string());
        }
        if self.correct_bonus < 0.0 || self.incorrect_penalty < 0.0 {
            return Err("correct_bonus and incorrect_penalty must not be negative".to_string());
        }
        if self.first_interval < 1 || self.second_interval < 1 {
            return Err("intervals must be at least one day".to_string());
        }
        if let Some(max) = self.max_interval {
            if max < self.second_interval.max(self.first_interval) {
                return Err("max_interval must not be below the fixed intervals".to_string());
            }
        }
        Ok(())
    }

    /// The record of a card that has just been registered.
    pub fn initial_record(&self, id: CardId) -> ProgressRecord {
        ProgressRecord::with_ease(id, self.initial_ease)
    }
}

/// Where a card is in its learning lifecycle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Never reviewed.
    New,
    /// One or two correct answers in a row.
    Learning,
    /// Three or more correct answers in a row.
    Reviewing,
    /// The most recent answer was incorrect.
    Lapsed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::New => "new",
            Stage::Learning => "learning",
            Stage::Reviewing => "reviewing",
            Stage::Lapsed => "lapsed",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn stage(record: &ProgressRecord) -> Stage {
    if record.times_studied == 0 {
        Stage::New
    } else if record.current_incorrect_streak > 0 {
        Stage::Lapsed
    } else if record.repetition_streak >= 3 {
        Stage::Reviewing
    } else {
        Stage::Learning
    }
}

/// The outcome of scheduling a review.
#[derive(Clone, PartialEq, Debug)]
pub struct Scheduled {
    pub record: ProgressRecord,
    pub due_date: Date,
}

impl AsRef<ProgressRecord> for Scheduled {
    fn as_ref(&self) -> &ProgressRecord {
        &self.record
    }
}

#[derive(Clone, Default, Debug)]
pub struct Scheduler {
    policy: Policy,
}

impl Scheduler {
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Apply an answer to a card, returning its next state.
    pub fn update(&self, record: &ProgressRecord, outcome: Outcome, now: Timestamp) -> Scheduled {
        let mut next = record.clone();
        match outcome {
            Outcome::Correct => {
                next.repetition_streak = record.repetition_streak.saturating_add(1);
                next.current_correct_streak = record.current_correct_streak.saturating_add(1);
                next.current_incorrect_streak = 0;
                // The interval grows from the ease factor the card had going
                // into this review.
                next.interval_days = self.correct_interval(record, next.repetition_streak);
                next.ease_factor = self.clamp_ease(record.ease_factor + self.policy.correct_bonus);
            }
            Outcome::Incorrect => {
                next.repetition_streak = 0;
                next.current_incorrect_streak = record.current_incorrect_streak.saturating_add(1);
                next.current_correct_streak = 0;
                next.interval_days = INITIAL_INTERVAL;
                next.ease_factor =
                    self.clamp_ease(record.ease_factor - self.policy.incorrect_penalty);
            }
        }
        // The answer totals stop counting together once `total_studied` is
        // full, so their sum stays exact.
        if let Some(total_studied) = record.total_studied.checked_add(1) {
            next.total_studied = total_studied;
            match outcome {
                Outcome::Correct => {
                    next.total_correct = next.total_correct.saturating_add(1);
                }
                Outcome::Incorrect => {
                    next.total_incorrect = next.total_incorrect.saturating_add(1);
                }
            }
        }
        next.times_studied = record.times_studied.saturating_add(1);
        next.last_studied_at = Some(now);
        let due_date = now.utc_date().add_days(next.interval_days);
        log::debug!(
            "card {} {} EF={:.2} I={}d due={}",
            next.id,
            outcome,
            next.ease_factor,
            next.interval_days,
            due_date
        );
        Scheduled {
            record: next,
            due_date,
        }
    }

    /// Like [`Scheduler::update`], but takes the answer as user input.
    pub fn update_raw(
        &self,
        record: &ProgressRecord,
        answer: &str,
        now: Timestamp,
    ) -> Fallible<Scheduled> {
        let outcome: Outcome = answer.parse()?;
        Ok(self.update(record, outcome, now))
    }

    fn correct_interval(&self, record: &ProgressRecord, streak: u32) -> u32 {
        let interval = match streak {
            1 => self.policy.first_interval,
            2 => self.policy.second_interval,
            // Float to int casts saturate.
            _ => (f64::from(record.interval_days) * record.ease_factor).round() as u32,
        };
        let interval = interval.max(INITIAL_INTERVAL);
        match self.policy.max_interval {
            Some(max) => interval.min(max),
            None => interval,
        }
    }

    fn clamp_ease(&self, ease: f64) -> f64 {
        if ease.is_nan() {
            self.policy.min_ease
        } else {
            ease.max(self.policy.min_ease)
        }
    }
}

/// Whether a card should be reviewed at `now`. Cards that were never studied
/// are always due; otherwise only the date of `now` matters.
pub fn is_due(record: &ProgressRecord, now: Timestamp) -> bool {
    match record.due_date() {
        None => true,
        Some(due_date) => now.utc_date() >= due_date,
    }
}

/// The cards due at `now`, in the order they should be reviewed.
///
/// Cards that have been studied before come first, most overdue first. Cards
/// that were never studied follow. Ties are broken by ascending card ID.
pub fn review_queue<'a>(
    records: impl IntoIterator<Item = &'a ProgressRecord>,
    now: Timestamp,
) -> Vec<CardId> {
    let today = now.utc_date();
    let mut reviews: Vec<(i64, CardId)> = Vec::new();
    let mut new: Vec<CardId> = Vec::new();
    for record in records {
        match record.due_date() {
            None => new.push(record.id),
            Some(due_date) => {
                if today >= due_date {
                    reviews.push((today.days_since(due_date), record.id));
                }
            }
        }
    }
    reviews.sort_by_key(|(overdue, id)| (Reverse(*overdue), *id));
    new.sort();
    reviews.into_iter().map(|(_, id)| id).chain(new).collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;

    fn day(n: i64) -> Timestamp {
        let epoch = Utc.with_ymd_and_hms(2025, 1, 1, 9, 30, 0).unwrap();
        Timestamp::new(epoch + Duration::days(n))
    }

    fn id(n: u64) -> CardId {
        CardId::new(n).unwrap()
    }

    fn studied(n: u64, on: Timestamp, interval_days: u32) -> ProgressRecord {
        let mut record = ProgressRecord::new(id(n));
        record.last_studied_at = Some(on);
        record.times_studied = 1;
        record.total_correct = 1;
        record.total_studied = 1;
        record.current_correct_streak = 1;
        record.repetition_streak = 1;
        record.interval_days = interval_days;
        record
    }

    fn answer(
        scheduler: &Scheduler,
        record: &ProgressRecord,
        outcome: Outcome,
        now: Timestamp,
    ) -> ProgressRecord {
        scheduler.update(record, outcome, now).record
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_first_correct_answer() {
        let scheduler = Scheduler::default();
        let fresh = ProgressRecord::new(id(1));
        let Scheduled { record, due_date } = scheduler.update(&fresh, Outcome::Correct, day(0));
        assert_eq!(record.repetition_streak, 1);
        assert_eq!(record.interval_days, 1);
        assert_eq!(record.last_studied_at, Some(day(0)));
        assert_eq!(due_date, day(1).utc_date());
        assert!(!is_due(&record, day(0)));
        assert!(is_due(&record, day(1)));
        assert_eq!(stage(&record), Stage::Learning);
    }

    #[test]
    fn test_second_correct_answer() {
        let scheduler = Scheduler::default();
        let record = studied(1, day(0), 1);
        let next = answer(&scheduler, &record, Outcome::Correct, day(1));
        assert_eq!(next.repetition_streak, 2);
        assert_eq!(next.interval_days, 6);
        assert_eq!(next.current_correct_streak, 2);
    }

    #[test]
    fn test_interval_grows_by_ease() {
        let scheduler = Scheduler::default();
        let mut record = studied(1, day(0), 20);
        record.repetition_streak = 5;
        record.ease_factor = 2.5;
        let next = answer(&scheduler, &record, Outcome::Correct, day(20));
        assert_eq!(next.interval_days, 50);
        assert_eq!(next.repetition_streak, 6);
        assert!(close(next.ease_factor, 2.6));
        assert_eq!(stage(&next), Stage::Reviewing);
    }

    #[test]
    fn test_lapse_resets_streak() {
        let scheduler = Scheduler::default();
        let mut record = studied(1, day(0), 50);
        record.repetition_streak = 6;
        record.current_correct_streak = 6;
        record.ease_factor = 2.5;
        let next = answer(&scheduler, &record, Outcome::Incorrect, day(50));
        assert_eq!(next.repetition_streak, 0);
        assert_eq!(next.interval_days, 1);
        assert!(close(next.ease_factor, 2.3));
        assert_eq!(next.current_incorrect_streak, 1);
        assert_eq!(next.current_correct_streak, 0);
        assert_eq!(stage(&next), Stage::Lapsed);
    }

    #[test]
    fn test_never_studied_is_always_due() {
        let record = ProgressRecord::new(id(1));
        assert!(is_due(&record, day(-1000)));
        assert!(is_due(&record, day(0)));
        assert!(is_due(&record, day(1000)));
        assert_eq!(stage(&record), Stage::New);
    }

    #[test]
    fn test_due_ignores_time_of_day() {
        let scheduler = Scheduler::default();
        let late = Timestamp::new(Utc.with_ymd_and_hms(2025, 1, 1, 23, 59, 0).unwrap());
        let fresh = ProgressRecord::new(id(1));
        let record = answer(&scheduler, &fresh, Outcome::Correct, late);
        let early = Timestamp::new(Utc.with_ymd_and_hms(2025, 1, 2, 0, 1, 0).unwrap());
        assert!(is_due(&record, early));
    }

    #[test]
    fn test_ease_never_drops_below_floor() {
        let scheduler = Scheduler::default();
        let mut record = ProgressRecord::new(id(1));
        for n in 0..20 {
            record = answer(&scheduler, &record, Outcome::Incorrect, day(n));
            assert!(record.ease_factor >= MIN_EASE);
        }
        assert!(close(record.ease_factor, MIN_EASE));
        assert_eq!(record.current_incorrect_streak, 20);
        assert_eq!(record.interval_days, 1);
    }

    #[test]
    fn test_interval_ceiling() {
        let scheduler = Scheduler::new(Policy {
            max_interval: Some(30),
            ..Policy::default()
        });
        let mut record = studied(1, day(0), 20);
        record.repetition_streak = 4;
        let next = answer(&scheduler, &record, Outcome::Correct, day(20));
        assert_eq!(next.interval_days, 30);
    }

    #[test]
    fn test_huge_interval_saturates() {
        let scheduler = Scheduler::default();
        let mut record = studied(1, day(0), u32::MAX);
        record.repetition_streak = 9;
        let next = answer(&scheduler, &record, Outcome::Correct, day(0));
        assert_eq!(next.interval_days, u32::MAX);
    }

    #[test]
    fn test_configured_constants() {
        let scheduler = Scheduler::new(Policy {
            correct_bonus: 0.0,
            incorrect_penalty: 0.5,
            first_interval: 2,
            second_interval: 4,
            ..Policy::default()
        });
        let record = ProgressRecord::new(id(1));
        let record = answer(&scheduler, &record, Outcome::Correct, day(0));
        assert_eq!(record.interval_days, 2);
        assert!(close(record.ease_factor, 2.5));
        let record = answer(&scheduler, &record, Outcome::Correct, day(2));
        assert_eq!(record.interval_days, 4);
        let record = answer(&scheduler, &record, Outcome::Incorrect, day(6));
        assert!(close(record.ease_factor, 2.0));
    }

    #[test]
    fn test_answer_totals_stay_consistent_when_full() {
        let scheduler = Scheduler::default();
        let mut record = studied(1, day(0), 1);
        record.total_correct = u32::MAX;
        record.total_studied = u32::MAX;
        let next = answer(&scheduler, &record, Outcome::Incorrect, day(1));
        assert_eq!(next.total_studied, u32::MAX);
        assert_eq!(next.total_correct, u32::MAX);
        assert_eq!(next.total_incorrect, 0);
        assert_eq!(next.times_studied, 2);
        assert!(next.validate(MIN_EASE).is_ok());
    }

    #[test]
    fn test_update_raw_rejects_unknown_outcome() {
        let scheduler = Scheduler::default();
        let record = ProgressRecord::new(id(1));
        assert!(scheduler.update_raw(&record, "sort of", day(0)).is_err());
        let next = scheduler.update_raw(&record, "correct", day(0)).unwrap();
        assert_eq!(next.record.total_correct, 1);
    }

    /// Drive a record through a long pseudo-random answer sequence and check
    /// the invariants after every step.
    #[test]
    fn test_invariants_hold_over_long_sequences() {
        let scheduler = Scheduler::default();
        for seed in 1..20u64 {
            let mut state = seed;
            let mut record = ProgressRecord::new(id(seed));
            let mut offset = 0;
            for _ in 0..200 {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                let outcome = Outcome::from((state >> 33) % 3 != 0);
                let previous = record.clone();
                record = answer(&scheduler, &record, outcome, day(offset));

                assert!(record.ease_factor >= MIN_EASE);
                assert!(record.interval_days >= 1);
                assert_eq!(
                    record.total_studied,
                    record.total_correct + record.total_incorrect
                );
                assert!(record.total_studied >= previous.total_studied);
                assert_eq!(record.times_studied, previous.times_studied + 1);
                assert!(
                    (record.current_correct_streak > 0) != (record.current_incorrect_streak > 0)
                );
                match outcome {
                    Outcome::Correct => {
                        assert_eq!(record.repetition_streak, previous.repetition_streak + 1)
                    }
                    Outcome::Incorrect => assert_eq!(record.repetition_streak, 0),
                }
                assert!(record.validate(MIN_EASE).is_ok());
                offset += i64::from(record.interval_days.min(365));
            }
        }
    }

    #[test]
    fn test_review_queue_order() {
        let now = day(10);
        // Cards 3 and 5 are nine days overdue, card 2 is two days overdue,
        // card 9 is due today and card 4 is not due yet.
        let records = vec![
            studied(5, day(0), 1),
            studied(2, day(7), 1),
            studied(9, day(9), 1),
            studied(3, day(0), 1),
            studied(4, day(9), 6),
            ProgressRecord::new(id(8)),
            ProgressRecord::new(id(1)),
        ];
        let queue = review_queue(&records, now);
        assert_eq!(queue, vec![id(3), id(5), id(2), id(9), id(1), id(8)]);
    }

    #[test]
    fn test_review_queue_is_independent_of_input_order() {
        let now = day(10);
        let mut records = vec![
            studied(5, day(0), 1),
            studied(2, day(7), 1),
            ProgressRecord::new(id(8)),
            ProgressRecord::new(id(1)),
        ];
        let forward = review_queue(&records, now);
        records.reverse();
        assert_eq!(review_queue(&records, now), forward);
    }

    #[test]
    fn test_policy_validation() {
        assert!(Policy::default().validate().is_ok());
        let mut bad = vec![Policy::default(); 6];
        bad[0].min_ease = 0.0;
        bad[1].initial_ease = 1.0;
        bad[2].correct_bonus = -0.1;
        bad[3].incorrect_penalty = f64::INFINITY;
        bad[4].first_interval = 0;
        bad[5].max_interval = Some(3);
        for policy in bad {
            assert!(policy.validate().is_err(), "{policy:?}");
        }
    }

    #[test]
    fn test_initial_record_uses_policy() {
        let policy = Policy {
            initial_ease: 2.0,
            ..Policy::default()
        };
        let record = policy.initial_record(id(4));
        assert_eq!(record.ease_factor, 2.0);
        assert_eq!(record.interval_days, 1);
    }
}
