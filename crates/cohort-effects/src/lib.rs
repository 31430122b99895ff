//! # Cohort Effects - Layer 3: Effect Handlers
//!
//! Stateless or self-contained production implementations of the effect
//! traits defined in `cohort-core`.
//!
//! **Layer Constraint**: no mock handlers here. Deterministic doubles with
//! failure injection live in `cohort-testkit`.

#![forbid(unsafe_code)]

pub mod alarm;
pub mod composite;
pub mod eligibility;
pub mod event_bus;
pub mod navigation;
pub mod prompt;
pub mod storage;
pub mod telemetry;
pub mod time;

pub use alarm::TokioAlarmHandler;
pub use composite::HostEffects;
pub use eligibility::StaticEligibilityHandler;
pub use event_bus::EventBus;
pub use navigation::LogNavigationHandler;
pub use prompt::LogPromptRenderer;
pub use storage::{FilesystemStorageHandler, MemoryStorageHandler};
pub use telemetry::TracingTelemetryHandler;
pub use time::RealTimeHandler;
