use async_trait::async_trait;
use quiz_core::model::{
    ActivityKey, ActivityProgress, CompletionId, CompletionRecord, GradeLevel, Subject,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for activity progress.
///
/// Stores aggregate by `ActivityKey` and are idempotent on `CompletionId`:
/// recording the same completion twice leaves the aggregate unchanged.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Persist a completion.
    ///
    /// Returns `false` when a completion with the same id was already stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the completion cannot be stored.
    async fn record_completion(&self, completion: &CompletionRecord) -> Result<bool, StorageError>;

    /// Aggregate progress for one activity, or `None` if never completed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn activity_progress(
        &self,
        key: &ActivityKey,
    ) -> Result<Option<ActivityProgress>, StorageError>;

    /// Progress for every completed activity of a grade, optionally narrowed to
    /// one subject. Ordered by subject, then activity id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_progress(
        &self,
        grade: GradeLevel,
        subject: Option<Subject>,
    ) -> Result<Vec<ActivityProgress>, StorageError>;

    /// Forget every completion of one activity. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn clear_activity(&self, key: &ActivityKey) -> Result<u64, StorageError>;
}

/// Simple in-memory store for tests and practice-only runs.
#[derive(Clone, Default)]
pub struct InMemoryProgressStore {
    completions: Arc<Mutex<HashMap<CompletionId, CompletionRecord>>>,
}

impl InMemoryProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            completions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<CompletionId, CompletionRecord>>, StorageError>
    {
        self.completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

pub(crate) fn group_by_key(
    completions: impl Iterator<Item = CompletionRecord>,
) -> Vec<ActivityProgress> {
    let mut grouped: HashMap<ActivityKey, Vec<CompletionRecord>> = HashMap::new();
    for completion in completions {
        grouped
            .entry(completion.key.clone())
            .or_default()
            .push(completion);
    }
    let mut out: Vec<ActivityProgress> = grouped
        .into_iter()
        .filter_map(|(key, records)| ActivityProgress::from_completions(key, &records))
        .collect();
    out.sort_by(|a, b| {
        (a.key.subject, &a.key.activity).cmp(&(b.key.subject, &b.key.activity))
    });
    out
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn record_completion(&self, completion: &CompletionRecord) -> Result<bool, StorageError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&completion.id) {
            return Ok(false);
        }
        guard.insert(completion.id, completion.clone());
        Ok(true)
    }

    async fn activity_progress(
        &self,
        key: &ActivityKey,
    ) -> Result<Option<ActivityProgress>, StorageError> {
        let guard = self.lock()?;
        let records: Vec<CompletionRecord> = guard
            .values()
            .filter(|c| &c.key == key)
            .cloned()
            .collect();
        Ok(ActivityProgress::from_completions(key.clone(), &records))
    }

    async fn list_progress(
        &self,
        grade: GradeLevel,
        subject: Option<Subject>,
    ) -> Result<Vec<ActivityProgress>, StorageError> {
        let guard = self.lock()?;
        let matching = guard
            .values()
            .filter(|c| c.key.grade == grade && subject.is_none_or(|s| c.key.subject == s))
            .cloned();
        Ok(group_by_key(matching))
    }

    async fn clear_activity(&self, key: &ActivityKey) -> Result<u64, StorageError> {
        let mut guard = self.lock()?;
        let before = guard.len();
        guard.retain(|_, c| &c.key != key);
        Ok(u64::try_from(before - guard.len()).unwrap_or(u64::MAX))
    }
}

/// Progress store behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressStore>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::ScoreSummary;
    use quiz_core::time::fixed_now;

    fn key(grade: GradeLevel, subject: Subject, name: &str) -> ActivityKey {
        ActivityKey::for_activity(grade, subject, name).unwrap()
    }

    fn completion(key: &ActivityKey, correct: u32, total: u32, minutes: i64) -> CompletionRecord {
        CompletionRecord::new(
            key.clone(),
            ScoreSummary::new(correct, total).unwrap(),
            fixed_now() + chrono::Duration::minutes(minutes),
        )
    }

    #[tokio::test]
    async fn recording_is_idempotent_on_completion_id() {
        let store = InMemoryProgressStore::new();
        let k = key(GradeLevel::Third, Subject::Math, "Times Tables");
        let c = completion(&k, 3, 5, 0);

        assert!(store.record_completion(&c).await.unwrap());
        assert!(!store.record_completion(&c).await.unwrap());

        let progress = store.activity_progress(&k).await.unwrap().unwrap();
        assert_eq!(progress.attempts, 1);
        assert_eq!(progress.best_percentage, 60);
    }

    #[tokio::test]
    async fn unknown_activity_has_no_progress() {
        let store = InMemoryProgressStore::new();
        let k = key(GradeLevel::Fifth, Subject::Science, "Planets");
        assert!(store.activity_progress(&k).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_by_grade_and_subject_and_sorts() {
        let store = InMemoryProgressStore::new();
        let science = key(GradeLevel::Fifth, Subject::Science, "Planets");
        let states = key(GradeLevel::Fifth, Subject::SocialStudies, "States and Capitals");
        let timeline = key(GradeLevel::Fifth, Subject::SocialStudies, "American History Timeline");
        let third = key(GradeLevel::Third, Subject::Math, "Times Tables");
        for (k, minutes) in [(&science, 0), (&states, 1), (&timeline, 2), (&third, 3)] {
            store
                .record_completion(&completion(k, 1, 2, minutes))
                .await
                .unwrap();
        }

        let fifth = store.list_progress(GradeLevel::Fifth, None).await.unwrap();
        let ids: Vec<&str> = fifth.iter().map(|p| p.key.activity.as_str()).collect();
        assert_eq!(
            ids,
            ["american-history-timeline", "states-and-capitals", "planets"]
        );

        let only_science = store
            .list_progress(GradeLevel::Fifth, Some(Subject::Science))
            .await
            .unwrap();
        assert_eq!(only_science.len(), 1);
    }

    #[tokio::test]
    async fn clear_removes_only_that_activity() {
        let store = InMemoryProgressStore::new();
        let a = key(GradeLevel::Third, Subject::Reading, "Vocabulary");
        let b = key(GradeLevel::Third, Subject::Math, "Times Tables");
        store.record_completion(&completion(&a, 1, 1, 0)).await.unwrap();
        store.record_completion(&completion(&a, 0, 1, 1)).await.unwrap();
        store.record_completion(&completion(&b, 1, 1, 2)).await.unwrap();

        assert_eq!(store.clear_activity(&a).await.unwrap(), 2);
        assert!(store.activity_progress(&a).await.unwrap().is_none());
        assert!(store.activity_progress(&b).await.unwrap().is_some());
    }
}
