use quiz_core::model::{ActivityKey, ActivityProgress, CompletionRecord, GradeLevel, Subject};

use super::SqliteRepository;
use super::mapping::map_completion_row;
use crate::repository::{ProgressStore, StorageError, group_by_key};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl ProgressStore for SqliteRepository {
    async fn record_completion(&self, completion: &CompletionRecord) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
                INSERT OR IGNORE INTO activity_completions (
                    id, grade, subject, activity_id, correct, total, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(completion.id.to_string())
        .bind(completion.key.grade.as_str())
        .bind(completion.key.subject.as_str())
        .bind(completion.key.activity.as_str())
        .bind(i64::from(completion.score.correct()))
        .bind(i64::from(completion.score.total()))
        .bind(completion.completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let inserted = res.rows_affected() == 1;
        if !inserted {
            tracing::debug!(id = %completion.id, "completion already recorded");
        }
        Ok(inserted)
    }

    async fn activity_progress(
        &self,
        key: &ActivityKey,
    ) -> Result<Option<ActivityProgress>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, grade, subject, activity_id, correct, total, completed_at
                FROM activity_completions
                WHERE grade = ?1 AND subject = ?2 AND activity_id = ?3
                ORDER BY completed_at ASC
            ",
        )
        .bind(key.grade.as_str())
        .bind(key.subject.as_str())
        .bind(key.activity.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let records = rows
            .iter()
            .map(map_completion_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ActivityProgress::from_completions(key.clone(), &records))
    }

    async fn list_progress(
        &self,
        grade: GradeLevel,
        subject: Option<Subject>,
    ) -> Result<Vec<ActivityProgress>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, grade, subject, activity_id, correct, total, completed_at
                FROM activity_completions
                WHERE grade = ?1 AND (?2 IS NULL OR subject = ?2)
            ",
        )
        .bind(grade.as_str())
        .bind(subject.map(Subject::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let records = rows
            .iter()
            .map(map_completion_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(group_by_key(records.into_iter()))
    }

    async fn clear_activity(&self, key: &ActivityKey) -> Result<u64, StorageError> {
        let res = sqlx::query(
            r"
                DELETE FROM activity_completions
                WHERE grade = ?1 AND subject = ?2 AND activity_id = ?3
            ",
        )
        .bind(key.grade.as_str())
        .bind(key.subject.as_str())
        .bind(key.activity.as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(res.rows_affected())
    }
}
