use quiz_core::model::{ItemId, ScoreSummary};

/// Where the engine sits in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// No content yet; the shell shows a loading/empty state.
    Loading,
    AwaitingAnswer,
    /// Feedback visible, options locked until `advance`.
    Answered,
    /// Terminal until `reset`.
    Completed,
}

/// Feedback for the most recent answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub item_id: ItemId,
    pub chosen: String,
    pub correct: bool,
    pub answer: String,
    pub explanation: Option<String>,
    pub fun_fact: Option<String>,
}

/// Result of an `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Not in `Answered`; nothing changed.
    Ignored,
    NextItem,
    /// The pass finished and a reshuffled round began.
    NextRound {
        round: u32,
        summary: ScoreSummary,
        reported: bool,
    },
    Completed {
        summary: ScoreSummary,
        reported: bool,
    },
}

impl AdvanceOutcome {
    /// Score of the pass that just ended, if this advance ended one.
    #[must_use]
    pub fn finished_pass(&self) -> Option<ScoreSummary> {
        match self {
            AdvanceOutcome::NextRound { summary, .. } | AdvanceOutcome::Completed { summary, .. } => {
                Some(*summary)
            }
            AdvanceOutcome::Ignored | AdvanceOutcome::NextItem => None,
        }
    }
}

/// Aggregated view of engine progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineProgress {
    pub phase: EnginePhase,
    /// 1-based position of the current item; 0 while loading.
    pub position: usize,
    pub total: usize,
    pub round: u32,
    pub correct: u32,
    pub answered: u32,
    pub accuracy: Option<u8>,
}

impl EngineProgress {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == EnginePhase::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pass_boundaries_carry_a_summary() {
        let summary = ScoreSummary::new(2, 4).unwrap();
        assert_eq!(AdvanceOutcome::Ignored.finished_pass(), None);
        assert_eq!(AdvanceOutcome::NextItem.finished_pass(), None);
        assert_eq!(
            AdvanceOutcome::Completed {
                summary,
                reported: true
            }
            .finished_pass(),
            Some(summary)
        );
        assert_eq!(
            AdvanceOutcome::NextRound {
                round: 2,
                summary,
                reported: false
            }
            .finished_pass(),
            Some(summary)
        );
    }
}
