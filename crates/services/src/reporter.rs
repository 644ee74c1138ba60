//! Score reporting seam between the engine and progress persistence.

use quiz_core::Clock;
use quiz_core::model::{ActivityKey, CompletionRecord, ScoreSummary};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Receives one call per reported activity completion.
///
/// The engine guarantees `summary.total() > 0` and
/// `summary.correct() <= summary.total()`.
pub trait ScoreReporter {
    fn report(&mut self, summary: &ScoreSummary);
}

impl<F> ScoreReporter for F
where
    F: FnMut(&ScoreSummary),
{
    fn report(&mut self, summary: &ScoreSummary) {
        self(summary);
    }
}

/// Turns reports into `CompletionRecord`s and queues them for persistence.
///
/// Sending is synchronous so the engine can report from a UI event handler;
/// the receiving half is collected by the activity loop and persisted with
/// `ProgressService::flush`.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    key: ActivityKey,
    clock: Clock,
    tx: UnboundedSender<CompletionRecord>,
}

impl ChannelReporter {
    #[must_use]
    pub fn new(key: ActivityKey, clock: Clock) -> (Self, UnboundedReceiver<CompletionRecord>) {
        let (tx, rx) = unbounded_channel();
        (Self { key, clock, tx }, rx)
    }

    #[must_use]
    pub fn key(&self) -> &ActivityKey {
        &self.key
    }
}

impl ScoreReporter for ChannelReporter {
    fn report(&mut self, summary: &ScoreSummary) {
        let record = CompletionRecord::new(self.key.clone(), *summary, self.clock.now());
        tracing::info!(
            activity = %self.key,
            correct = summary.correct(),
            total = summary.total(),
            "activity completed"
        );
        if self.tx.send(record).is_err() {
            tracing::warn!(activity = %self.key, "progress receiver dropped; completion lost");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{GradeLevel, Subject};
    use quiz_core::time::{fixed_clock, fixed_now};

    #[test]
    fn closures_are_reporters() {
        let mut seen = Vec::new();
        {
            let mut reporter = |s: &ScoreSummary| seen.push((s.correct(), s.total()));
            reporter.report(&ScoreSummary::new(3, 5).unwrap());
        }
        assert_eq!(seen, vec![(3, 5)]);
    }

    #[test]
    fn channel_reporter_queues_keyed_completions() {
        let key = ActivityKey::for_activity(GradeLevel::Third, Subject::Math, "Times Tables")
            .unwrap();
        let (mut reporter, mut rx) = ChannelReporter::new(key.clone(), fixed_clock());
        reporter.report(&ScoreSummary::new(4, 4).unwrap());

        let record = rx.try_recv().unwrap();
        assert_eq!(record.key, key);
        assert_eq!(record.score.correct(), 4);
        assert_eq!(record.completed_at, fixed_now());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_does_not_panic() {
        let key = ActivityKey::for_activity(GradeLevel::Fifth, Subject::Science, "Planets")
            .unwrap();
        let (mut reporter, rx) = ChannelReporter::new(key, fixed_clock());
        drop(rx);
        reporter.report(&ScoreSummary::new(1, 2).unwrap());
    }
}
