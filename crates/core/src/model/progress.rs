use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::activity::ActivityKey;
use crate::model::ids::CompletionId;
use crate::model::session::ScoreSummary;

//
// ─── COMPLETION RECORD ─────────────────────────────────────────────────────────
//

/// A reported activity completion, ready to hand to a progress store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub id: CompletionId,
    pub key: ActivityKey,
    pub score: ScoreSummary,
    pub completed_at: DateTime<Utc>,
}

impl CompletionRecord {
    #[must_use]
    pub fn new(key: ActivityKey, score: ScoreSummary, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: CompletionId::generate(),
            key,
            score,
            completed_at,
        }
    }
}

//
// ─── ACTIVITY PROGRESS ─────────────────────────────────────────────────────────
//

/// Aggregated progress for one activity across all recorded completions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityProgress {
    pub key: ActivityKey,
    pub attempts: u32,
    pub best_percentage: u8,
    pub last_score: ScoreSummary,
    pub last_completed_at: DateTime<Utc>,
}

impl ActivityProgress {
    /// Fold completions into a progress aggregate.
    ///
    /// Returns `None` for an empty slice. Completions are ordered by
    /// `completed_at` to pick the latest score.
    #[must_use]
    pub fn from_completions(key: ActivityKey, completions: &[CompletionRecord]) -> Option<Self> {
        let last = completions.iter().max_by_key(|c| c.completed_at)?;
        let best_percentage = completions
            .iter()
            .map(|c| c.score.percentage())
            .max()
            .unwrap_or(0);
        let attempts = u32::try_from(completions.len()).unwrap_or(u32::MAX);

        Some(Self {
            key,
            attempts,
            best_percentage,
            last_score: last.score,
            last_completed_at: last.completed_at,
        })
    }
}
