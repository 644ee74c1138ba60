use std::fmt;

use chrono::{DateTime, Utc};
use quiz_core::distractor::build_options;
use quiz_core::model::{QuizItem, ResponseRecord, ScoreSummary, SessionState};
use quiz_core::shuffle::shuffled;
use quiz_core::{Clock, ContentProvider};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::config::EngineConfig;
use super::progress::{AdvanceOutcome, EnginePhase, EngineProgress, Feedback};
use crate::reporter::ScoreReporter;

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Single-player walk through a shuffled item set.
///
/// Every illegal call (answering twice, advancing before answering, anything
/// while loading) is a no-op, so a presentation shell can forward raw input
/// events without guarding them.
pub struct ProgressionEngine<I: QuizItem> {
    config: EngineConfig,
    source: Vec<I>,
    items: Vec<I>,
    options: Vec<String>,
    state: SessionState,
    phase: EnginePhase,
    responses: Vec<ResponseRecord>,
    feedback: Option<Feedback>,
    passes_reported: u32,
    auto_advance_at: Option<DateTime<Utc>>,
    reporter: Option<Box<dyn ScoreReporter + Send>>,
    clock: Clock,
    rng: StdRng,
}

impl<I: QuizItem> ProgressionEngine<I> {
    /// Create an engine in `Loading`; call `start` to deal the first round.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            source: Vec::new(),
            items: Vec::new(),
            options: Vec::new(),
            state: SessionState::default(),
            phase: EnginePhase::Loading,
            responses: Vec::new(),
            feedback: None,
            passes_reported: 0,
            auto_advance_at: None,
            reporter: None,
            clock: Clock::default_clock(),
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Attach the reporter that receives completed-pass scores.
    #[must_use]
    pub fn with_reporter(mut self, reporter: impl ScoreReporter + Send + 'static) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Use a deterministic shuffle sequence.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    //
    // ─── TRANSITIONS ──────────────────────────────────────────────────────────
    //

    /// Load `source`, shuffle it and begin round 1.
    ///
    /// An empty source leaves the engine in `Loading`.
    pub fn start(&mut self, source: Vec<I>) {
        self.source = source;
        self.restart();
    }

    /// Convenience for `start(provider.items())`.
    pub fn start_from<P>(&mut self, provider: &P)
    where
        P: ContentProvider<Item = I> + ?Sized,
    {
        self.start(provider.items());
    }

    /// Supply content that was not available at start. Ignored unless loading.
    pub fn supply(&mut self, source: Vec<I>) {
        if self.phase != EnginePhase::Loading {
            tracing::trace!(phase = ?self.phase, "supply ignored");
            return;
        }
        self.start(source);
    }

    /// Back to round 1 with a fresh shuffle and zeroed counters.
    pub fn reset(&mut self) {
        tracing::debug!(round = self.state.round, "engine reset");
        self.restart();
    }

    /// Score `candidate` against the current item.
    ///
    /// Returns `None` without touching any counter unless the engine is
    /// awaiting an answer.
    pub fn submit_answer(&mut self, candidate: &str) -> Option<&Feedback> {
        if self.phase != EnginePhase::AwaitingAnswer {
            tracing::trace!(phase = ?self.phase, "submit ignored");
            return None;
        }
        let item = self.items.get(self.state.index)?;

        let chosen = candidate.trim();
        let correct = chosen == item.answer();
        let feedback = Feedback {
            item_id: item.id(),
            chosen: chosen.to_string(),
            correct,
            answer: item.answer().to_string(),
            explanation: item.explanation().map(str::to_string),
            fun_fact: item.fun_fact().map(str::to_string),
        };
        let now = self.clock.now();
        self.responses.push(ResponseRecord::new(
            item.id(),
            chosen,
            correct,
            self.state.round,
            now,
        ));

        self.state.record(correct);
        self.phase = EnginePhase::Answered;
        self.auto_advance_at = self
            .config
            .auto_advance_delay()
            .map(|delay| self.clock.deadline_after(delay));
        tracing::debug!(
            item = %feedback.item_id,
            correct,
            index = self.state.index,
            round = self.state.round,
            "answer recorded"
        );
        self.check_invariants();

        self.feedback = Some(feedback);
        self.feedback.as_ref()
    }

    /// Submit the option at `index` of [`options`](Self::options).
    ///
    /// An out-of-range index is ignored like any other illegal input.
    pub fn submit_choice(&mut self, index: usize) -> Option<&Feedback> {
        let Some(candidate) = self.options.get(index).cloned() else {
            tracing::trace!(index, "choice out of range");
            return None;
        };
        self.submit_answer(&candidate)
    }

    /// Move past the answered item.
    ///
    /// At the end of a pass the score is reported according to the report
    /// policy, then the activity either completes or deals the next round.
    pub fn advance(&mut self) -> AdvanceOutcome {
        if self.phase != EnginePhase::Answered {
            tracing::trace!(phase = ?self.phase, "advance ignored");
            return AdvanceOutcome::Ignored;
        }
        self.auto_advance_at = None;
        self.feedback = None;

        if self.state.index + 1 < self.items.len() {
            self.state.index += 1;
            self.phase = EnginePhase::AwaitingAnswer;
            self.prepare_options();
            self.check_invariants();
            return AdvanceOutcome::NextItem;
        }

        self.finish_pass()
    }

    /// Fire the pending auto-advance if its deadline has passed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<AdvanceOutcome> {
        let deadline = self.auto_advance_at?;
        if now < deadline {
            return None;
        }
        Some(self.advance())
    }

    //
    // ─── ACCESSORS ────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The item on screen, or `None` while loading.
    #[must_use]
    pub fn current_item(&self) -> Option<&I> {
        match self.phase {
            EnginePhase::Loading => None,
            _ => self.items.get(self.state.index),
        }
    }

    /// Options presented for the current item.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// The current round's shuffled item set.
    #[must_use]
    pub fn item_set(&self) -> &[I] {
        &self.items
    }

    /// Every answer of this run, in answer order.
    #[must_use]
    pub fn responses(&self) -> &[ResponseRecord] {
        &self.responses
    }

    /// Feedback for the current item while in `Answered`.
    #[must_use]
    pub fn last_feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    #[must_use]
    pub fn auto_advance_deadline(&self) -> Option<DateTime<Utc>> {
        self.auto_advance_at
    }

    #[must_use]
    pub fn progress(&self) -> EngineProgress {
        let position = match self.phase {
            EnginePhase::Loading => 0,
            _ => self.state.index + 1,
        };
        EngineProgress {
            phase: self.phase,
            position,
            total: self.items.len(),
            round: self.state.round,
            correct: self.state.correct,
            answered: self.state.answered,
            accuracy: self.state.accuracy(),
        }
    }

    //
    // ─── INTERNALS ────────────────────────────────────────────────────────────
    //

    fn restart(&mut self) {
        self.state = SessionState::default();
        self.responses.clear();
        self.feedback = None;
        self.passes_reported = 0;
        self.auto_advance_at = None;
        self.deal();
    }

    /// Shuffle a new item set from the source for the current round.
    fn deal(&mut self) {
        let mut items = shuffled(&self.source, &mut self.rng);
        if let Some(limit) = self.config.items_per_round() {
            items.truncate(limit);
        }
        self.items = items;

        if self.items.is_empty() {
            self.phase = EnginePhase::Loading;
            self.options.clear();
            tracing::debug!("no content available; engine loading");
            return;
        }
        self.phase = EnginePhase::AwaitingAnswer;
        self.prepare_options();
        tracing::debug!(
            items = self.items.len(),
            round = self.state.round,
            "item set dealt"
        );
    }

    fn prepare_options(&mut self) {
        self.options = match self.items.get(self.state.index) {
            Some(item) => build_options(
                item,
                &self.source,
                self.config.distractor_count(),
                self.config.shuffle_choices(),
                &mut self.rng,
            ),
            None => Vec::new(),
        };
    }

    fn finish_pass(&mut self) -> AdvanceOutcome {
        let summary = match ScoreSummary::for_pass(self.state.pass_correct, self.items.len()) {
            Ok(summary) => summary,
            Err(err) => {
                // Unreachable with a non-empty item set; stay answered.
                tracing::warn!(%err, "could not score finished pass");
                self.phase = EnginePhase::Answered;
                return AdvanceOutcome::Ignored;
            }
        };

        let reported = self.config.should_report(self.passes_reported);
        if reported {
            self.passes_reported += 1;
            if let Some(reporter) = self.reporter.as_mut() {
                reporter.report(&summary);
            }
        }

        let round = self.state.round;
        if self.config.is_last_round(round) {
            self.phase = EnginePhase::Completed;
            tracing::debug!(
                correct = summary.correct(),
                total = summary.total(),
                round,
                "activity completed"
            );
            return AdvanceOutcome::Completed { summary, reported };
        }

        self.state.next_round();
        self.deal();
        self.check_invariants();
        AdvanceOutcome::NextRound {
            round: self.state.round,
            summary,
            reported,
        }
    }

    fn check_invariants(&self) {
        debug_assert!(
            self.state.is_consistent(self.items.len()),
            "session state out of bounds: {:?} over {} items",
            self.state,
            self.items.len()
        );
    }
}

impl<I: QuizItem> fmt::Debug for ProgressionEngine<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressionEngine")
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("items_len", &self.items.len())
            .field("source_len", &self.source.len())
            .field("responses_len", &self.responses.len())
            .field("has_reporter", &self.reporter.is_some())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
