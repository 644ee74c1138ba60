#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod progress_service;
pub mod reporter;

pub use quiz_core::Clock;

pub use engine::{
    ActivityLoopService, ActivityRun, AdvanceOutcome, EngineConfig, EnginePhase, EngineProgress,
    Feedback, ProgressionEngine, ReportPolicy, Rounds,
};
pub use error::{EngineConfigError, ProgressError};
pub use progress_service::{ProgressService, SubjectOverview};
pub use reporter::{ChannelReporter, ScoreReporter};
