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

use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::card_id::CardId;

/// The boxed cause carried by storage errors.
pub type Cause = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum ErrorReport {
    /// No progress record exists for the card.
    #[error("error: no progress record for card {card_id} ({operation}).")]
    NotFound {
        card_id: CardId,
        operation: &'static str,
    },
    /// Reading or writing durable storage failed.
    #[error("error: {operation} failed for {location}: {source}")]
    StoreIo {
        operation: &'static str,
        location: String,
        #[source]
        source: Cause,
    },
    /// The answer given to the scheduler is neither correct nor incorrect.
    #[error("error: invalid outcome {value:?}, expected correct or incorrect.")]
    InvalidOutcome { value: String },
    #[error("error: invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    #[error("error: {0}")]
    Message(String),
    #[error("error: {0}")]
    Io(#[from] std::io::Error),
    #[error("error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ErrorReport {
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    pub fn store_io(
        operation: &'static str,
        location: impl Into<String>,
        source: impl Into<Cause>,
    ) -> Self {
        Self::StoreIo {
            operation,
            location: location.into(),
            source: source.into(),
        }
    }

    pub fn not_found(card_id: CardId, operation: &'static str) -> Self {
        Self::NotFound { card_id, operation }
    }
}

pub type Fallible<T> = Result<T, ErrorReport>;

pub fn fail<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(msg))
}
