use super::{Audience, Transport};
use crate::models::{ConnectionId, Role};
use log::{debug, warn};
use serde_json::{Value, json};
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

struct Member {
    role: Role,
    outbox: UnboundedSender<String>,
}

/// Audience membership table for live connections.
///
/// Owned by the engine task, so membership changes and sends are serialized
/// with session transitions. Each member's outbox is drained by its own
/// socket writer; a slow socket only grows its own queue.
#[derive(Default)]
pub struct Hub {
    members: HashMap<ConnectionId, Member>,
}

impl Hub {
    pub fn attach(&mut self, id: ConnectionId, role: Role, outbox: UnboundedSender<String>) {
        self.members.insert(id, Member { role, outbox });
    }

    pub fn detach(&mut self, id: ConnectionId) -> Option<Role> {
        self.members.remove(&id).map(|m| m.role)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

fn frame(event: &str, payload: Value) -> String {
    json!({ "event": event, "data": payload }).to_string()
}

impl Transport for Hub {
    fn send_to(&self, connection: ConnectionId, event: &str, payload: Value) {
        match self.members.get(&connection) {
            Some(member) => {
                if member.outbox.send(frame(event, payload)).is_err() {
                    warn!("Dropped '{}' for closed connection {}", event, connection);
                }
            }
            None => debug!("No connection {} for '{}'", connection, event),
        }
    }

    fn send_to_audience(&self, audience: Audience, event: &str, payload: Value) {
        let text = frame(event, payload);
        for (id, member) in &self.members {
            if !Audience::memberships(member.role).contains(&audience) {
                continue;
            }
            if member.outbox.send(text.clone()).is_err() {
                warn!("Dropped '{}' for closed connection {}", event, id);
            }
        }
    }
}
