//! Trigger events and subscriptions.
//!
//! Triggers are delivered on named topics. A [`Subscription`] is the
//! unsubscribe handle: dropping it, or calling [`Subscription::unsubscribe`],
//! detaches it from the bus.

use crate::effects::AlarmId;
use crate::prompt::{PromptResponse, ProviderCandidate};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// A provider candidate became available (e.g. a download started).
pub const CANDIDATE_DETECTED: &str = "candidate-detected";
/// The renderer reported a user interaction.
pub const PROMPT_RESPONSE: &str = "prompt-response";
/// A scheduled alarm fired.
pub const ALARM: &str = "alarm";
/// The user asked to leave the study.
pub const DISABLE_REQUESTED: &str = "disable-requested";
/// The host is shutting the study down.
pub const HOST_SHUTDOWN: &str = "host-shutdown";

/// Every topic the study runtime listens on.
pub const ALL_TOPICS: [&str; 5] = [
    CANDIDATE_DETECTED,
    PROMPT_RESPONSE,
    ALARM,
    DISABLE_REQUESTED,
    HOST_SHUTDOWN,
];

/// Host shutdown causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShutdownReason {
    /// The application is exiting; study state is kept.
    AppShutdown,
    /// The study was disabled by the user.
    Disable,
    /// The study was uninstalled.
    Uninstall,
    /// The study package is being upgraded.
    Upgrade,
}

impl ShutdownReason {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AppShutdown => "app-shutdown",
            Self::Disable => "disable",
            Self::Uninstall => "uninstall",
            Self::Upgrade => "upgrade",
        }
    }

    /// Whether this shutdown ends the study (as a user-disable).
    pub fn ends_study(self) -> bool {
        matches!(self, Self::Disable | Self::Uninstall)
    }
}

/// Events delivered to the study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StudyEvent {
    /// Prompt trigger with the providers available right now.
    CandidateDetected {
        /// Available providers.
        candidates: Vec<ProviderCandidate>,
    },
    /// User interaction with a visible prompt.
    PromptResponded {
        /// What the user did.
        response: PromptResponse,
    },
    /// A scheduled alarm fired.
    AlarmFired {
        /// Alarm name.
        name: String,
        /// Alarm handle.
        id: AlarmId,
    },
    /// Explicit request to leave the study.
    DisableRequested,
    /// Host lifecycle signal.
    HostShutdown {
        /// Shutdown cause.
        reason: ShutdownReason,
    },
}

impl StudyEvent {
    /// Topic this event is published on.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::CandidateDetected { .. } => CANDIDATE_DETECTED,
            Self::PromptResponded { .. } => PROMPT_RESPONSE,
            Self::AlarmFired { .. } => ALARM,
            Self::DisableRequested => DISABLE_REQUESTED,
            Self::HostShutdown { .. } => HOST_SHUTDOWN,
        }
    }
}

/// Subscription identifier.
pub type SubscriptionId = Uuid;

type Detach = Box<dyn FnOnce(SubscriptionId) + Send>;

/// Receiving end of a bus subscription.
pub struct Subscription {
    id: SubscriptionId,
    topics: Vec<String>,
    receiver: mpsc::UnboundedReceiver<StudyEvent>,
    detach: Option<Detach>,
}

impl Subscription {
    /// Build a subscription; `detach` runs once on unsubscribe or drop.
    pub fn new(
        id: SubscriptionId,
        topics: Vec<String>,
        receiver: mpsc::UnboundedReceiver<StudyEvent>,
        detach: impl FnOnce(SubscriptionId) + Send + 'static,
    ) -> Self {
        Self {
            id,
            topics,
            receiver,
            detach: Some(Box::new(detach)),
        }
    }

    /// Subscription identifier.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Subscribed topics.
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Next event, `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<StudyEvent> {
        self.receiver.recv().await
    }

    /// Next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<StudyEvent> {
        self.receiver.try_recv().ok()
    }

    /// Detach from the bus.
    pub fn unsubscribe(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach(self.id);
        }
        self.receiver.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topics", &self.topics)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn topics_match_variants() {
        assert_eq!(StudyEvent::DisableRequested.topic(), DISABLE_REQUESTED);
        assert_eq!(
            StudyEvent::CandidateDetected { candidates: vec![] }.topic(),
            CANDIDATE_DETECTED
        );
    }

    #[test]
    fn only_disable_and_uninstall_end_the_study() {
        assert!(ShutdownReason::Uninstall.ends_study());
        assert!(ShutdownReason::Disable.ends_study());
        assert!(!ShutdownReason::AppShutdown.ends_study());
        assert!(!ShutdownReason::Upgrade.ends_study());
    }

    #[test]
    fn detach_runs_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let (_tx, rx) = mpsc::unbounded_channel();
        let sub = Subscription::new(Uuid::new_v4(), vec![ALARM.into()], rx, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
