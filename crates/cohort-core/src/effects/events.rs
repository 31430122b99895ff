//! In-process event bus effect.

use crate::events::{StudyEvent, Subscription};

/// Named-topic publish/subscribe.
///
/// Publishing never suspends; events queue on each subscriber's channel and
/// are drained in publish order.
pub trait EventBusEffects: Send + Sync {
    /// Subscribe to one or more topics.
    fn subscribe(&self, topics: &[&str]) -> Subscription;

    /// Deliver `event` to every subscriber of its topic. Returns the number
    /// of subscribers reached.
    fn publish(&self, event: StudyEvent) -> usize;
}

impl<T: EventBusEffects + ?Sized> EventBusEffects for std::sync::Arc<T> {
    fn subscribe(&self, topics: &[&str]) -> Subscription {
        (**self).subscribe(topics)
    }

    fn publish(&self, event: StudyEvent) -> usize {
        (**self).publish(event)
    }
}
