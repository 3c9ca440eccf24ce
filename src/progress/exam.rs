use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::progress::ProgressError;

/// Which of the two per-level vocabulary exams a submission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExamKind {
    Initial,
    Final,
}

impl ExamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for ExamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamKind {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(Self::Initial),
            "final" => Ok(Self::Final),
            other => Err(ProgressError::UnknownExamKind(other.to_string())),
        }
    }
}

/// Raw outcome of one exam: words answered right and wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExamScore {
    correct_words: u32,
    wrong_words: u32,
}

impl ExamScore {
    pub fn new(correct_words: u32, wrong_words: u32) -> Self {
        Self {
            correct_words,
            wrong_words,
        }
    }

    pub fn correct_words(&self) -> u32 {
        self.correct_words
    }

    pub fn wrong_words(&self) -> u32 {
        self.wrong_words
    }

    pub fn total_words(&self) -> u64 {
        u64::from(self.correct_words) + u64::from(self.wrong_words)
    }

    /// Share of correct words in percent. An empty exam scores zero.
    pub fn percentage(&self) -> f64 {
        let total = self.total_words();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.correct_words) / total as f64 * 100.0
    }
}
