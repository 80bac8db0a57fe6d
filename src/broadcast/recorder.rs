use super::{Audience, Transport};
use crate::models::ConnectionId;
use serde_json::Value;
use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Connection(ConnectionId),
    Audience(Audience),
}

#[derive(Debug)]
pub struct Sent {
    pub target: Target,
    pub event: String,
    pub payload: Value,
}

/// In-memory transport that keeps every send for assertions.
#[derive(Debug, Default)]
pub struct Recorder {
    sent: RefCell<Vec<Sent>>,
}

impl Recorder {
    pub fn clear(&self) {
        self.sent.borrow_mut().clear();
    }

    pub fn events_to(&self, audience: Audience) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .filter(|s| s.target == Target::Audience(audience))
            .map(|s| s.event.clone())
            .collect()
    }

    pub fn replies_to(&self, connection: ConnectionId) -> Vec<(String, Value)> {
        self.sent
            .borrow()
            .iter()
            .filter(|s| s.target == Target::Connection(connection))
            .map(|s| (s.event.clone(), s.payload.clone()))
            .collect()
    }

    /// Payload of the most recent `event` sent to `audience`.
    pub fn last(&self, audience: Audience, event: &str) -> Option<Value> {
        self.sent
            .borrow()
            .iter()
            .rev()
            .find(|s| s.target == Target::Audience(audience) && s.event == event)
            .map(|s| s.payload.clone())
    }

    pub fn count(&self, event: &str) -> usize {
        self.sent.borrow().iter().filter(|s| s.event == event).count()
    }
}

impl Transport for Recorder {
    fn send_to(&self, connection: ConnectionId, event: &str, payload: Value) {
        self.sent.borrow_mut().push(Sent {
            target: Target::Connection(connection),
            event: event.to_string(),
            payload,
        });
    }

    fn send_to_audience(&self, audience: Audience, event: &str, payload: Value) {
        self.sent.borrow_mut().push(Sent {
            target: Target::Audience(audience),
            event: event.to_string(),
            payload,
        });
    }
}
