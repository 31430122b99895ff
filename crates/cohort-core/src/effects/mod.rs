//! Collaborator contracts.
//!
//! Every piece of I/O the study performs goes through one of these traits.
//! Production handlers live in `cohort-effects`; deterministic mocks live in
//! `cohort-testkit`.
//!
//! - **StorageEffects**: durable key/value store
//! - **PhysicalTimeEffects**: wall clock
//! - **TelemetryEffects**: pings and the per-install client id
//! - **EligibilityEffects**: first-run enrollment check
//! - **NavigationEffects**: opening ending URLs
//! - **AlarmEffects**: cancelable one-shot alarms
//! - **PromptRendererEffects**: prompt UI
//! - **EventBusEffects**: named trigger topics

pub mod alarm;
pub mod eligibility;
pub mod events;
pub mod navigation;
pub mod prompt;
pub mod storage;
pub mod telemetry;
pub mod time;

pub use alarm::{AlarmEffects, AlarmId, EXPIRY_ALARM};
pub use eligibility::EligibilityEffects;
pub use events::EventBusEffects;
pub use navigation::NavigationEffects;
pub use prompt::PromptRendererEffects;
pub use storage::{StorageEffects, StorageError};
pub use telemetry::{TelemetryEffects, TelemetryEventKind, TelemetryPayload};
pub use time::{PhysicalTimeEffects, TimeError};
