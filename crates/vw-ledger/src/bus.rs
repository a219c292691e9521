//! Event bus boundary for change set notifications.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BusError;

/// One event handed to the bus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusEvent {
    /// Producer identifier, e.g. `virtwallet`.
    pub source: String,
    /// Event type, e.g. `new account version`.
    pub detail_type: String,
    pub time: DateTime<Utc>,
    /// Serialized payload.
    pub detail: String,
}

/// Bus acknowledgement for a publish call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishAck {
    /// Number of events the bus did not accept.
    pub failed_count: usize,
    /// Per-event failure descriptions.
    pub details: Vec<String>,
}

impl PublishAck {
    pub fn is_complete(&self) -> bool {
        self.failed_count == 0
    }
}

/// Event bus transport.
///
/// A call may succeed as a whole and still reject individual events; those
/// are reported through [`PublishAck::failed_count`].
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, events: Vec<BusEvent>) -> Result<PublishAck, BusError>;
}

/// How [`InMemoryEventBus`] answers publish calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BusMode {
    /// Accept and record every event.
    #[default]
    Accept,
    /// Answer with every event reported as failed.
    Reject,
    /// Fail the call with a transport error.
    Unavailable,
}

/// In-memory event bus for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryEventBus {
    events: RwLock<Vec<BusEvent>>,
    mode: RwLock<BusMode>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mode(&self, mode: BusMode) {
        if let Ok(mut current) = self.mode.write() {
            *current = mode;
        }
    }

    /// Events accepted so far, in publication order.
    pub fn events(&self) -> Vec<BusEvent> {
        self.events.read().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, events: Vec<BusEvent>) -> Result<PublishAck, BusError> {
        let mode = *self
            .mode
            .read()
            .map_err(|e| BusError::Transport(format!("lock poisoned: {e}")))?;

        match mode {
            BusMode::Accept => {
                let mut stored = self
                    .events
                    .write()
                    .map_err(|e| BusError::Transport(format!("lock poisoned: {e}")))?;
                stored.extend(events);
                Ok(PublishAck::default())
            }
            BusMode::Reject => Ok(PublishAck {
                failed_count: events.len(),
                details: events
                    .iter()
                    .map(|e| format!("rejected {} from {}", e.detail_type, e.source))
                    .collect(),
            }),
            BusMode::Unavailable => Err(BusError::Transport("bus unavailable".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> BusEvent {
        BusEvent {
            source: "virtwallet".into(),
            detail_type: "new account version".into(),
            time: Utc::now(),
            detail: "{}".into(),
        }
    }

    #[tokio::test]
    async fn accepts_and_records() {
        let bus = InMemoryEventBus::new();
        let ack = bus.publish(vec![event(), event()]).await.unwrap();
        assert!(ack.is_complete());
        assert_eq!(bus.len(), 2);
    }

    #[tokio::test]
    async fn reject_mode_reports_failures() {
        let bus = InMemoryEventBus::new();
        bus.set_mode(BusMode::Reject);
        let ack = bus.publish(vec![event()]).await.unwrap();
        assert_eq!(ack.failed_count, 1);
        assert_eq!(ack.details.len(), 1);
        assert!(bus.is_empty());
    }

    #[tokio::test]
    async fn unavailable_mode_errors() {
        let bus = InMemoryEventBus::new();
        bus.set_mode(BusMode::Unavailable);
        assert!(bus.publish(vec![event()]).await.is_err());
        assert!(bus.is_empty());
    }
}
