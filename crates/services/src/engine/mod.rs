mod config;
mod progress;
mod service;
mod workflow;

// Public API of the engine subsystem.
pub use crate::error::EngineConfigError;
pub use config::{EngineConfig, EngineConfigBuilder, MAX_AUTO_ADVANCE, MAX_DISTRACTORS, ReportPolicy, Rounds};
pub use progress::{AdvanceOutcome, EnginePhase, EngineProgress, Feedback};
pub use service::ProgressionEngine;
pub use workflow::{ActivityLoopService, ActivityRun};
