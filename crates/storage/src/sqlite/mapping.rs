use quiz_core::model::{
    ActivityId, ActivityKey, CompletionId, CompletionRecord, GradeLevel, ScoreSummary, Subject,
};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_completion_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<CompletionRecord, StorageError> {
    let id: CompletionId = row
        .try_get::<String, _>("id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let grade: GradeLevel = row
        .try_get::<String, _>("grade")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let subject: Subject = row
        .try_get::<String, _>("subject")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let activity = ActivityId::from_display_name(
        &row.try_get::<String, _>("activity_id").map_err(ser)?,
    )
    .map_err(ser)?;
    let correct = u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let score = ScoreSummary::new(correct, total).map_err(ser)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;

    Ok(CompletionRecord {
        id,
        key: ActivityKey::new(grade, subject, activity),
        score,
        completed_at,
    })
}
