use std::collections::VecDeque;
use std::sync::Arc;

use quiz_core::model::{ActivityKey, ActivityProgress, CompletionRecord, GradeLevel, Subject};
use storage::repository::ProgressStore;

use crate::error::ProgressError;

/// Progress for all completed activities of one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectOverview {
    pub grade: GradeLevel,
    pub subject: Subject,
    pub activities: Vec<ActivityProgress>,
}

impl SubjectOverview {
    /// Mean of the best percentages, rounded; `None` when nothing was completed.
    #[must_use]
    pub fn average_best(&self) -> Option<u8> {
        if self.activities.is_empty() {
            return None;
        }
        let sum: u32 = self
            .activities
            .iter()
            .map(|p| u32::from(p.best_percentage))
            .sum();
        let len = u32::try_from(self.activities.len()).unwrap_or(u32::MAX);
        u8::try_from((sum * 2 + len) / (len * 2)).ok()
    }
}

/// Persists reported completions and answers progress queries.
#[derive(Clone)]
pub struct ProgressService {
    store: Arc<dyn ProgressStore>,
}

impl ProgressService {
    #[must_use]
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Persist one completion. Returns `false` if it was already recorded.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on persistence failures.
    pub async fn record(&self, completion: &CompletionRecord) -> Result<bool, ProgressError> {
        let inserted = self.store.record_completion(completion).await?;
        tracing::debug!(
            activity = %completion.key,
            id = %completion.id,
            inserted,
            "completion persisted"
        );
        Ok(inserted)
    }

    /// Persist queued completions in order, removing each one only once the
    /// store has accepted it.
    ///
    /// Returns the number of newly stored completions. On failure the
    /// rejected completion and everything behind it stay queued; stores are
    /// idempotent on `CompletionId`, so a later flush can retry them.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on the first persistence failure.
    pub async fn flush(
        &self,
        pending: &mut VecDeque<CompletionRecord>,
    ) -> Result<usize, ProgressError> {
        let mut stored = 0;
        while let Some(completion) = pending.front() {
            if self.record(completion).await? {
                stored += 1;
            }
            pending.pop_front();
        }
        Ok(stored)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on backend failures.
    pub async fn activity_progress(
        &self,
        key: &ActivityKey,
    ) -> Result<Option<ActivityProgress>, ProgressError> {
        Ok(self.store.activity_progress(key).await?)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on backend failures.
    pub async fn subject_overview(
        &self,
        grade: GradeLevel,
        subject: Subject,
    ) -> Result<SubjectOverview, ProgressError> {
        let activities = self.store.list_progress(grade, Some(subject)).await?;
        Ok(SubjectOverview {
            grade,
            subject,
            activities,
        })
    }

    /// One overview per subject, in subject order, including empty ones.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on backend failures.
    pub async fn grade_overview(
        &self,
        grade: GradeLevel,
    ) -> Result<Vec<SubjectOverview>, ProgressError> {
        let all = self.store.list_progress(grade, None).await?;
        Ok(Subject::ALL
            .into_iter()
            .map(|subject| SubjectOverview {
                grade,
                subject,
                activities: all
                    .iter()
                    .filter(|p| p.key.subject == subject)
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    /// Forget every completion of one activity.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on backend failures.
    pub async fn reset_activity(&self, key: &ActivityKey) -> Result<u64, ProgressError> {
        let removed = self.store.clear_activity(key).await?;
        tracing::info!(activity = %key, removed, "activity progress cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::ScoreSummary;
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryProgressStore;

    fn service() -> ProgressService {
        ProgressService::new(Arc::new(InMemoryProgressStore::new()))
    }

    fn completion(grade: GradeLevel, subject: Subject, name: &str, correct: u32, total: u32) -> CompletionRecord {
        CompletionRecord::new(
            ActivityKey::for_activity(grade, subject, name).unwrap(),
            ScoreSummary::new(correct, total).unwrap(),
            fixed_now(),
        )
    }

    #[tokio::test]
    async fn flush_persists_queued_completions_once() {
        let svc = service();
        let c = completion(GradeLevel::Third, Subject::Math, "Times Tables", 3, 5);
        let mut pending = VecDeque::from([c.clone(), c.clone()]);

        assert_eq!(svc.flush(&mut pending).await.unwrap(), 1);
        assert!(pending.is_empty());
        assert_eq!(svc.flush(&mut pending).await.unwrap(), 0);

        let progress = svc.activity_progress(&c.key).await.unwrap().unwrap();
        assert_eq!(progress.attempts, 1);
    }

    #[tokio::test]
    async fn grade_overview_lists_every_subject() {
        let svc = service();
        svc.record(&completion(GradeLevel::Fifth, Subject::Science, "Planets", 1, 2))
            .await
            .unwrap();
        svc.record(&completion(GradeLevel::Fifth, Subject::Science, "Rocks", 2, 2))
            .await
            .unwrap();

        let overview = svc.grade_overview(GradeLevel::Fifth).await.unwrap();
        assert_eq!(overview.len(), Subject::ALL.len());
        let science = overview
            .iter()
            .find(|o| o.subject == Subject::Science)
            .unwrap();
        assert_eq!(science.activities.len(), 2);
        assert_eq!(science.average_best(), Some(75));

        let reading = overview
            .iter()
            .find(|o| o.subject == Subject::Reading)
            .unwrap();
        assert_eq!(reading.average_best(), None);
    }

    #[tokio::test]
    async fn reset_activity_clears_progress() {
        let svc = service();
        let c = completion(GradeLevel::Third, Subject::Reading, "Vocabulary", 4, 4);
        svc.record(&c).await.unwrap();
        assert_eq!(svc.reset_activity(&c.key).await.unwrap(), 1);
        assert!(svc.activity_progress(&c.key).await.unwrap().is_none());
        let overview = svc
            .subject_overview(GradeLevel::Third, Subject::Reading)
            .await
            .unwrap();
        assert!(overview.activities.is_empty());
    }
}
