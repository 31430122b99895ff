//! In-process event bus.

use cohort_core::effects::EventBusEffects;
use cohort_core::events::{StudyEvent, Subscription, SubscriptionId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::trace;
use uuid::Uuid;

#[derive(Debug)]
struct Subscriber {
    topics: Vec<String>,
    sender: mpsc::UnboundedSender<StudyEvent>,
}

type Registry = Mutex<HashMap<SubscriptionId, Subscriber>>;

/// Topic-routed, unbounded, in-process bus. Clones share subscribers.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Registry>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Live subscription count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl EventBusEffects for EventBus {
    fn subscribe(&self, topics: &[&str]) -> Subscription {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();
        let topics: Vec<String> = topics.iter().map(|t| t.to_string()).collect();
        self.subscribers.lock().insert(
            id,
            Subscriber {
                topics: topics.clone(),
                sender,
            },
        );

        let registry: Weak<Registry> = Arc::downgrade(&self.subscribers);
        Subscription::new(id, topics, receiver, move |id| {
            if let Some(registry) = registry.upgrade() {
                registry.lock().remove(&id);
            }
        })
    }

    fn publish(&self, event: StudyEvent) -> usize {
        let topic = event.topic();
        let mut subscribers = self.subscribers.lock();
        let mut delivered = 0;
        subscribers.retain(|_, subscriber| {
            if !subscriber.topics.iter().any(|t| t == topic) {
                return true;
            }
            match subscriber.sender.send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                // receiver closed without detaching
                Err(_) => false,
            }
        });
        trace!(topic, delivered, "Published event");
        delivered
    }
}
