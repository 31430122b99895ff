//! Tokio-backed alarms that fire onto the event bus.

use crate::event_bus::EventBus;
use async_trait::async_trait;
use cohort_core::effects::{AlarmEffects, AlarmId, EventBusEffects, PhysicalTimeEffects};
use cohort_core::{CohortError, StudyEvent, Timestamp};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// Alarm handler that sleeps on the tokio timer and publishes
/// [`StudyEvent::AlarmFired`] when due.
#[derive(Clone)]
pub struct TokioAlarmHandler<C> {
    bus: EventBus,
    clock: C,
    pending: Arc<Mutex<HashMap<AlarmId, JoinHandle<()>>>>,
}

impl<C: PhysicalTimeEffects> TokioAlarmHandler<C> {
    /// Create a handler publishing on `bus`, measuring delays with `clock`.
    pub fn new(bus: EventBus, clock: C) -> Self {
        Self {
            bus,
            clock,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Alarms scheduled and not yet fired or cancelled.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl<C> std::fmt::Debug for TokioAlarmHandler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioAlarmHandler")
            .field("pending", &self.pending.lock().len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<C: PhysicalTimeEffects> AlarmEffects for TokioAlarmHandler<C> {
    async fn schedule_alarm(&self, name: &str, at: Timestamp) -> Result<AlarmId, CohortError> {
        let now = self.clock.now().await?;
        let delay = Duration::from_secs(at.secs_since(now));
        let id = Uuid::new_v4();
        let name = name.to_string();
        let bus = self.bus.clone();
        let pending = self.pending.clone();

        debug!(alarm = %name, %at, delay_secs = delay.as_secs(), "Scheduling alarm");
        // Hold the lock across spawn so the task cannot remove itself first
        let mut guard = self.pending.lock();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            pending.lock().remove(&id);
            bus.publish(StudyEvent::AlarmFired { name, id });
        });
        guard.insert(id, handle);
        Ok(id)
    }

    async fn cancel_alarm(&self, id: AlarmId) -> bool {
        match self.pending.lock().remove(&id) {
            Some(handle) => {
                handle.abort();
                debug!(alarm_id = %id, "Cancelled alarm");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::RealTimeHandler;
    use cohort_core::effects::EXPIRY_ALARM;
    use cohort_core::events::ALARM;

    #[tokio::test(start_paused = true)]
    async fn fires_onto_the_bus() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(&[ALARM]);
        let alarms = TokioAlarmHandler::new(bus.clone(), RealTimeHandler::new());

        let now = RealTimeHandler::new().now().await.unwrap();
        let id = alarms
            .schedule_alarm(EXPIRY_ALARM, now.plus_secs(5))
            .await
            .unwrap();

        match sub.recv().await {
            Some(StudyEvent::AlarmFired { name, id: fired }) => {
                assert_eq!(name, EXPIRY_ALARM);
                assert_eq!(fired, id);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(alarms.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_alarm_never_fires() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(&[ALARM]);
        let alarms = TokioAlarmHandler::new(bus.clone(), RealTimeHandler::new());

        let now = RealTimeHandler::new().now().await.unwrap();
        let id = alarms
            .schedule_alarm(EXPIRY_ALARM, now.plus_secs(60))
            .await
            .unwrap();
        assert!(alarms.cancel_alarm(id).await);
        assert!(!alarms.cancel_alarm(id).await);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(sub.try_recv().is_none());
    }
}
