//! # Cohort Core - Layer 1: Foundation
//!
//! Types, pure algorithms and collaborator contracts for a client-side study:
//! deterministic variation bucketing, the persisted key layout, study
//! configuration, and the effect traits every piece of I/O goes through.
//!
//! ## What Belongs Here
//!
//! - Pure functions (bucketing, config validation, URL templating)
//! - Effect trait definitions (storage, time, telemetry, eligibility, ...)
//! - Shared domain types (ending reasons, prompt view model, events)
//!
//! ## What Does NOT Belong Here
//!
//! - Effect handler implementations (belong in `cohort-effects`)
//! - Lifecycle and scheduling logic (belongs in `cohort-study`)
//! - Mock handlers (belong in `cohort-testkit`)

#![forbid(unsafe_code)]

/// Study configuration and validation
pub mod config;

/// Collaborator effect traits
pub mod effects;

/// Ending reasons
pub mod ending;

/// Unified error type
pub mod errors;

/// Trigger events and subscriptions
pub mod events;

/// Persisted key names
pub mod keys;

/// Prompt view model and responses
pub mod prompt;

/// Typed persisted state
pub mod state;

/// Epoch-second timestamps
pub mod time;

/// Variation bucketing
pub mod variation;

pub use config::{
    EndingConfig, ExpireConfig, IntervalConfig, PromptConfig, StudyConfig, TelemetryConfig,
    TestingOverrides,
};
pub use ending::EndingReason;
pub use errors::{CohortError, Result};
pub use events::{ShutdownReason, StudyEvent, Subscription, SubscriptionId};
pub use prompt::{
    DismissCause, PromptMode, PromptOutcome, PromptResponse, PromptView, ProviderCandidate,
};
pub use state::PersistedState;
pub use time::{Timestamp, SECONDS_PER_DAY};
pub use variation::{assign, bucketing_salt, choose_weighted, hash_fraction, VariationDefinition};
