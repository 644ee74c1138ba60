use std::time::Duration;

use quiz_core::distractor::DEFAULT_DISTRACTOR_COUNT;
use serde::{Deserialize, Serialize};

use crate::error::EngineConfigError;

/// Upper bound on generated distractors per item.
pub const MAX_DISTRACTORS: usize = 9;

/// Longest allowed feedback pause before an automatic advance.
pub const MAX_AUTO_ADVANCE: Duration = Duration::from_secs(60);

/// How many passes an activity runs before it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounds {
    /// One pass, then `Completed`.
    #[default]
    Single,
    /// A fixed number of reshuffled passes.
    Fixed(u32),
    /// Practice mode: reshuffle and keep going until reset.
    Unlimited,
}

/// Which completed passes reach the score reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPolicy {
    /// Report the first full pass only; later rounds update the running
    /// accuracy without re-reporting.
    #[default]
    FirstPassOnly,
    EveryPass,
}

/// Per-activity engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    items_per_round: Option<usize>,
    distractor_count: usize,
    auto_advance_delay: Option<Duration>,
    rounds: Rounds,
    report_policy: ReportPolicy,
    shuffle_choices: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            items_per_round: None,
            distractor_count: DEFAULT_DISTRACTOR_COUNT,
            auto_advance_delay: None,
            rounds: Rounds::Single,
            report_policy: ReportPolicy::FirstPassOnly,
            shuffle_choices: false,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Endless practice: unlimited rounds, first pass reported.
    #[must_use]
    pub fn practice() -> Self {
        Self {
            rounds: Rounds::Unlimited,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn items_per_round(&self) -> Option<usize> {
        self.items_per_round
    }

    #[must_use]
    pub fn distractor_count(&self) -> usize {
        self.distractor_count
    }

    #[must_use]
    pub fn auto_advance_delay(&self) -> Option<Duration> {
        self.auto_advance_delay
    }

    #[must_use]
    pub fn rounds(&self) -> Rounds {
        self.rounds
    }

    #[must_use]
    pub fn report_policy(&self) -> ReportPolicy {
        self.report_policy
    }

    #[must_use]
    pub fn shuffle_choices(&self) -> bool {
        self.shuffle_choices
    }

    fn is_single_pass(&self) -> bool {
        matches!(self.rounds, Rounds::Single | Rounds::Fixed(1))
    }

    /// True when the pass that just finished ends the activity.
    pub(crate) fn is_last_round(&self, round: u32) -> bool {
        match self.rounds {
            Rounds::Single => true,
            Rounds::Fixed(n) => round >= n,
            Rounds::Unlimited => false,
        }
    }

    /// True when a finished pass should reach the reporter.
    pub(crate) fn should_report(&self, passes_reported: u32) -> bool {
        match self.report_policy {
            ReportPolicy::FirstPassOnly => passes_reported == 0,
            ReportPolicy::EveryPass => true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    #[must_use]
    pub fn items_per_round(mut self, n: usize) -> Self {
        self.config.items_per_round = Some(n);
        self
    }

    #[must_use]
    pub fn distractor_count(mut self, n: usize) -> Self {
        self.config.distractor_count = n;
        self
    }

    #[must_use]
    pub fn auto_advance_delay(mut self, delay: Duration) -> Self {
        self.config.auto_advance_delay = Some(delay);
        self
    }

    #[must_use]
    pub fn rounds(mut self, rounds: Rounds) -> Self {
        self.config.rounds = rounds;
        self
    }

    #[must_use]
    pub fn report_policy(mut self, policy: ReportPolicy) -> Self {
        self.config.report_policy = policy;
        self
    }

    #[must_use]
    pub fn shuffle_choices(mut self, shuffle: bool) -> Self {
        self.config.shuffle_choices = shuffle;
        self
    }

    /// # Errors
    ///
    /// Returns `EngineConfigError` when a value is out of range.
    pub fn build(self) -> Result<EngineConfig, EngineConfigError> {
        let config = self.config;
        if config.items_per_round == Some(0) {
            return Err(EngineConfigError::ZeroItemsPerRound);
        }
        if config.distractor_count > MAX_DISTRACTORS {
            return Err(EngineConfigError::TooManyDistractors {
                requested: config.distractor_count,
                max: MAX_DISTRACTORS,
            });
        }
        if let Some(delay) = config
            .auto_advance_delay
            .filter(|d| d.is_zero() || *d > MAX_AUTO_ADVANCE)
        {
            return Err(EngineConfigError::InvalidAutoAdvanceDelay {
                delay_ms: delay.as_millis(),
                max_ms: MAX_AUTO_ADVANCE.as_millis(),
            });
        }
        if config.rounds == Rounds::Fixed(0) {
            return Err(EngineConfigError::ZeroRounds);
        }
        // A lone pass reports its total as the content length.
        if let Some(n) = config.items_per_round.filter(|_| config.is_single_pass()) {
            return Err(EngineConfigError::PartialSinglePass(n));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_single_pass_with_three_distractors() {
        let config = EngineConfig::default();
        assert_eq!(config.rounds(), Rounds::Single);
        assert_eq!(config.distractor_count(), 3);
        assert_eq!(config.report_policy(), ReportPolicy::FirstPassOnly);
        assert!(config.auto_advance_delay().is_none());
        assert!(config.is_last_round(1));
    }

    #[test]
    fn builder_rejects_zero_items_per_round() {
        let err = EngineConfig::builder().items_per_round(0).build().unwrap_err();
        assert_eq!(err, EngineConfigError::ZeroItemsPerRound);
    }

    #[test]
    fn builder_rejects_truncated_single_pass() {
        assert_eq!(
            EngineConfig::builder().items_per_round(10).build(),
            Err(EngineConfigError::PartialSinglePass(10))
        );
        assert_eq!(
            EngineConfig::builder()
                .items_per_round(10)
                .rounds(Rounds::Fixed(1))
                .build(),
            Err(EngineConfigError::PartialSinglePass(10))
        );
        let practice = EngineConfig::builder()
            .items_per_round(10)
            .rounds(Rounds::Unlimited)
            .build()
            .unwrap();
        assert_eq!(practice.items_per_round(), Some(10));
    }

    #[test]
    fn builder_rejects_too_many_distractors() {
        let err = EngineConfig::builder().distractor_count(12).build().unwrap_err();
        assert!(matches!(
            err,
            EngineConfigError::TooManyDistractors { requested: 12, .. }
        ));
    }

    #[test]
    fn builder_rejects_zero_and_huge_delays() {
        assert!(
            EngineConfig::builder()
                .auto_advance_delay(Duration::ZERO)
                .build()
                .is_err()
        );
        assert!(
            EngineConfig::builder()
                .auto_advance_delay(Duration::from_secs(120))
                .build()
                .is_err()
        );
        assert!(
            EngineConfig::builder()
                .auto_advance_delay(Duration::from_millis(1500))
                .build()
                .is_ok()
        );
    }

    #[test]
    fn fixed_rounds_end_on_the_last_round() {
        let config = EngineConfig::builder()
            .rounds(Rounds::Fixed(3))
            .build()
            .unwrap();
        assert!(!config.is_last_round(2));
        assert!(config.is_last_round(3));
        assert_eq!(
            EngineConfig::builder().rounds(Rounds::Fixed(0)).build(),
            Err(EngineConfigError::ZeroRounds)
        );
    }

    #[test]
    fn report_policy_gates_repeat_passes() {
        let first_only = EngineConfig::practice();
        assert!(first_only.should_report(0));
        assert!(!first_only.should_report(1));

        let every = EngineConfig::builder()
            .report_policy(ReportPolicy::EveryPass)
            .build()
            .unwrap();
        assert!(every.should_report(4));
    }
}
