use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use quiz_core::model::{ActivityKey, CompletionRecord, QuizItem};
use quiz_core::{Clock, ContentProvider};
use tokio::sync::mpsc::UnboundedReceiver;

use super::config::EngineConfig;
use super::progress::AdvanceOutcome;
use super::service::ProgressionEngine;
use crate::error::ProgressError;
use crate::progress_service::ProgressService;
use crate::reporter::ChannelReporter;

/// One running activity: the engine plus the queue its reports land on.
///
/// Reported completions wait in `pending` until the store accepts them.
#[derive(Debug)]
pub struct ActivityRun<I: QuizItem> {
    key: ActivityKey,
    engine: ProgressionEngine<I>,
    completions: UnboundedReceiver<CompletionRecord>,
    pending: VecDeque<CompletionRecord>,
}

impl<I: QuizItem> ActivityRun<I> {
    #[must_use]
    pub fn key(&self) -> &ActivityKey {
        &self.key
    }

    #[must_use]
    pub fn engine(&self) -> &ProgressionEngine<I> {
        &self.engine
    }

    /// Mutable engine access for answering and resetting.
    pub fn engine_mut(&mut self) -> &mut ProgressionEngine<I> {
        &mut self.engine
    }

    /// Completions reported but not yet stored.
    #[must_use]
    pub fn pending(&self) -> &VecDeque<CompletionRecord> {
        &self.pending
    }

    fn collect_reports(&mut self) {
        while let Ok(completion) = self.completions.try_recv() {
            self.pending.push_back(completion);
        }
    }
}

/// Wires engines to the progress store: starts activities and persists
/// completions as passes finish.
#[derive(Clone)]
pub struct ActivityLoopService {
    clock: Clock,
    progress: ProgressService,
    seed: Option<u64>,
}

impl ActivityLoopService {
    #[must_use]
    pub fn new(clock: Clock, progress: ProgressService) -> Self {
        Self {
            clock,
            progress,
            seed: None,
        }
    }

    /// Deterministic shuffles for every started activity.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    /// Start an activity over the provider's content.
    pub fn start<P>(&self, key: ActivityKey, provider: &P, config: EngineConfig) -> ActivityRun<P::Item>
    where
        P: ContentProvider + ?Sized,
    {
        let (reporter, completions) = ChannelReporter::new(key.clone(), self.clock);
        let mut engine = ProgressionEngine::new(config)
            .with_clock(self.clock)
            .with_reporter(reporter);
        if let Some(seed) = self.seed {
            engine = engine.with_seed(seed);
        }
        engine.start_from(provider);
        tracing::info!(activity = %key, items = engine.item_set().len(), "activity started");

        ActivityRun {
            key,
            engine,
            completions,
            pending: VecDeque::new(),
        }
    }

    /// Advance the run and persist a completion if the pass just finished.
    ///
    /// Completions left over from an earlier storage failure are retried
    /// first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if a completion cannot be stored. The engine
    /// has still advanced and the completion stays pending on the run.
    pub async fn advance<I: QuizItem>(
        &self,
        run: &mut ActivityRun<I>,
    ) -> Result<AdvanceOutcome, ProgressError> {
        let outcome = run.engine.advance();
        self.flush(run).await?;
        Ok(outcome)
    }

    /// Fire a due auto-advance and persist its completion, if any.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if a completion cannot be stored.
    pub async fn tick<I: QuizItem>(
        &self,
        run: &mut ActivityRun<I>,
        now: DateTime<Utc>,
    ) -> Result<Option<AdvanceOutcome>, ProgressError> {
        let outcome = run.engine.tick(now);
        self.flush(run).await?;
        Ok(outcome)
    }

    /// Store every pending completion of the run. Returns how many were new.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` on the first completion the store rejects;
    /// it and the ones after it remain pending.
    pub async fn flush<I: QuizItem>(&self, run: &mut ActivityRun<I>) -> Result<usize, ProgressError> {
        run.collect_reports();
        if run.pending.is_empty() {
            return Ok(0);
        }
        let result = self.progress.flush(&mut run.pending).await;
        if let Err(err) = &result {
            tracing::warn!(
                activity = %run.key,
                pending = run.pending.len(),
                %err,
                "completion not stored; kept for retry"
            );
        }
        result
    }
}
