mod activity;
mod ids;
mod item;
mod progress;
mod response;
mod session;

pub use activity::{ActivityError, ActivityId, ActivityKey, GradeLevel, Subject};
pub use ids::{CompletionId, ItemId, ParseIdError};
pub use item::{Item, ItemDraft, ItemError, ItemMeta, QuizItem};
pub use progress::{ActivityProgress, CompletionRecord};
pub use response::ResponseRecord;
pub use session::{ScoreError, ScoreSummary, SessionState};
