//! Effect composition for study operations.
//!
//! The lifecycle and scheduler bound only the collaborators they use, so a
//! single mock covers every test and hosts can mix production handlers
//! freely.
//!
//! - **StorageEffects**: enrollment record and prompt state
//! - **PhysicalTimeEffects**: enrollment time, expiry, interval gating
//! - **TelemetryEffects**: client id for the bucketing salt, lifecycle pings
//! - **EligibilityEffects**: first-run enrollment check
//! - **NavigationEffects**: ending survey URLs
//! - **AlarmEffects**: expiry alarm
//! - **PromptRendererEffects**: showing and clearing the prompt
//!
//! The event runtime additionally needs **EventBusEffects**.

use cohort_core::effects::{
    AlarmEffects, EligibilityEffects, EventBusEffects, NavigationEffects, PhysicalTimeEffects,
    PromptRendererEffects, StorageEffects, TelemetryEffects,
};

/// Composed effects required by the study lifecycle and prompt scheduler.
pub trait StudyEffects:
    StorageEffects
    + PhysicalTimeEffects
    + TelemetryEffects
    + EligibilityEffects
    + NavigationEffects
    + AlarmEffects
    + PromptRendererEffects
    + Send
    + Sync
{
}

/// Blanket implementation for any type that implements all required traits.
impl<T> StudyEffects for T where
    T: StorageEffects
        + PhysicalTimeEffects
        + TelemetryEffects
        + EligibilityEffects
        + NavigationEffects
        + AlarmEffects
        + PromptRendererEffects
        + Send
        + Sync
{
}

/// Study effects plus the event bus, for [`crate::Study::run`] hosts.
pub trait StudyRuntimeEffects: StudyEffects + EventBusEffects {}

impl<T> StudyRuntimeEffects for T where T: StudyEffects + EventBusEffects {}
