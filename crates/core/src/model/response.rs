use chrono::{DateTime, Utc};

use crate::model::ids::ItemId;

//
// ─── RESPONSE RECORD ───────────────────────────────────────────────────────────
//

/// One submitted answer.
///
/// Records are appended to the session log in answer order and are never
/// mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    pub item_id: ItemId,
    pub chosen: String,
    pub correct: bool,
    pub round: u32,
    pub answered_at: DateTime<Utc>,
}

impl ResponseRecord {
    #[must_use]
    pub fn new(
        item_id: ItemId,
        chosen: impl Into<String>,
        correct: bool,
        round: u32,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id,
            chosen: chosen.into(),
            correct,
            round,
            answered_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn record_creation_works() {
        let rec = ResponseRecord::new(ItemId::new(4), "Austin", true, 1, fixed_now());
        assert_eq!(rec.item_id, ItemId::new(4));
        assert_eq!(rec.chosen, "Austin");
        assert!(rec.correct);
        assert_eq!(rec.round, 1);
    }
}
