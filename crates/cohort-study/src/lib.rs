//! # Cohort Study - Layer 4: Feature
//!
//! One client-side study per process: deterministic enrollment, an
//! idempotent ending latch, and an interval-gated prompt scheduler.
//!
//! Everything here is generic over [`StudyEffects`], so hosts supply their
//! own storage, telemetry, eligibility and UI collaborators.
//!
//! ## Flow
//!
//! 1. [`Study::setup`](StudyApi::setup) validates the config, checks
//!    eligibility on first run, checks expiry, resolves the variation and
//!    configures the [`PromptScheduler`].
//! 2. Each trigger runs [`StudyApi::decide`]; a `Show` renders the prompt.
//! 3. The renderer's response feeds [`StudyApi::record_outcome`].
//! 4. Any trigger may call [`StudyApi::end_study`]; only the first one acts.

#![forbid(unsafe_code)]

pub mod effects;
pub mod enrollment;
pub mod lifecycle;
mod persist;
pub mod policy;
pub mod prompt_state;
pub mod scheduler;
pub mod selection;
pub mod study;
mod telemetry;

pub use effects::{StudyEffects, StudyRuntimeEffects};
pub use enrollment::EnrollmentRecord;
pub use lifecycle::{Activation, EndOutcome, LifecycleState, SetupOutcome, StudyLifecycle};
pub use policy::PromptPolicy;
pub use prompt_state::PromptState;
pub use scheduler::{PromptDecision, PromptScheduler, SuppressReason};
pub use selection::PromptSelection;
pub use study::{Flow, Study, StudyApi};
