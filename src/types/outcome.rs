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

use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use crate::error::ErrorReport;

/// The result of answering a card.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Correct => "correct",
            Outcome::Incorrect => "incorrect",
        }
    }
}

impl FromStr for Outcome {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "correct" | "c" | "yes" | "y" | "1" | "true" | "pass" => Ok(Outcome::Correct),
            "incorrect" | "i" | "no" | "n" | "0" | "false" | "fail" => Ok(Outcome::Incorrect),
            _ => Err(ErrorReport::InvalidOutcome {
                value: s.to_string(),
            }),
        }
    }
}

impl From<bool> for Outcome {
    fn from(correct: bool) -> Self {
        if correct {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        for s in ["correct", "C", " yes ", "1", "TRUE", "pass"] {
            assert_eq!(s.parse::<Outcome>().unwrap(), Outcome::Correct, "{s}");
        }
        for s in ["incorrect", "i", "No", "0", "false", "FAIL"] {
            assert_eq!(s.parse::<Outcome>().unwrap(), Outcome::Incorrect, "{s}");
        }
    }

    #[test]
    fn test_parse_out_of_domain() {
        let err = "maybe".parse::<Outcome>().err().unwrap();
        match err {
            ErrorReport::InvalidOutcome { value } => assert_eq!(value, "maybe"),
            other => panic!("unexpected error: {other}"),
        }
        assert!("2".parse::<Outcome>().is_err());
        assert!("".parse::<Outcome>().is_err());
    }

    #[test]
    fn test_from_bool() {
        assert_eq!(Outcome::from(true), Outcome::Correct);
        assert_eq!(Outcome::from(false), Outcome::Incorrect);
    }
}
