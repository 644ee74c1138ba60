use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("score total must be > 0")]
    EmptyTotal,

    #[error("score ({correct}) exceeds total ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("too many items for a single score: {len}")]
    TooManyItems { len: usize },
}

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// Mutable counters for one activity run.
///
/// `correct`/`answered` are cumulative across rounds and feed the running
/// accuracy display. `pass_correct`/`pass_answered` restart with every round
/// and are what a completed pass reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub index: usize,
    pub correct: u32,
    pub answered: u32,
    pub round: u32,
    pub pass_correct: u32,
    pub pass_answered: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            index: 0,
            correct: 0,
            answered: 0,
            round: 1,
            pass_correct: 0,
            pass_answered: 0,
        }
    }
}

impl SessionState {
    /// Record one answer against both cumulative and per-pass counters.
    pub fn record(&mut self, correct: bool) {
        self.answered = self.answered.saturating_add(1);
        self.pass_answered = self.pass_answered.saturating_add(1);
        if correct {
            self.correct = self.correct.saturating_add(1);
            self.pass_correct = self.pass_correct.saturating_add(1);
        }
    }

    /// Start the next round, keeping cumulative counters.
    pub fn next_round(&mut self) {
        self.index = 0;
        self.round = self.round.saturating_add(1);
        self.pass_correct = 0;
        self.pass_answered = 0;
    }

    /// Running accuracy over every answer in this run, if any.
    #[must_use]
    pub fn accuracy(&self) -> Option<u8> {
        ScoreSummary::new(self.correct, self.answered)
            .ok()
            .map(|s| s.percentage())
    }

    /// Checks `pass_correct <= pass_answered <= index + 1 <= len`.
    #[must_use]
    pub fn is_consistent(&self, len: usize) -> bool {
        let answered = self.pass_answered as usize;
        self.pass_correct <= self.pass_answered
            && self.correct <= self.answered
            && answered <= self.index + 1
            && (len == 0 || self.index < len)
    }
}

//
// ─── SCORE SUMMARY ─────────────────────────────────────────────────────────────
//

/// `(correct, total)` for one completed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    correct: u32,
    total: u32,
}

impl ScoreSummary {
    /// # Errors
    ///
    /// Returns `ScoreError` when `total` is zero or `correct` exceeds it.
    pub fn new(correct: u32, total: u32) -> Result<Self, ScoreError> {
        if total == 0 {
            return Err(ScoreError::EmptyTotal);
        }
        if correct > total {
            return Err(ScoreError::CorrectExceedsTotal { correct, total });
        }
        Ok(Self { correct, total })
    }

    /// Build a summary for a pass over `len` items.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::TooManyItems` if `len` cannot fit in `u32`, or the
    /// errors of [`ScoreSummary::new`].
    pub fn for_pass(correct: u32, len: usize) -> Result<Self, ScoreError> {
        let total = u32::try_from(len).map_err(|_| ScoreError::TooManyItems { len })?;
        Self::new(correct, total)
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// `round(correct / total * 100)`, halves rounding up.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        let pct = (u64::from(self.correct) * 200 + u64::from(self.total)) / (u64::from(self.total) * 2);
        u8::try_from(pct).unwrap_or(100)
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.correct == self.total
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
