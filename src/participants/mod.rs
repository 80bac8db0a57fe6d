use crate::models::ConnectionId;

#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ConnectionId,
    pub name: String,
    pub score: u32,
}

/// Connected participants in join order.
///
/// Join order matters: rankings sort stably over it, so equal scores keep
/// the order in which the players arrived.
#[derive(Debug)]
pub struct Registry {
    members: Vec<Participant>,
    // Never reset, so anonymous names stay unique for the life of the process
    next_anonymous: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            next_anonymous: 1,
        }
    }

    /// Registers `id` under a trimmed, non-empty display name. Joining again
    /// renames the participant in place and starts the score over.
    pub fn join_named(&mut self, id: ConnectionId, raw_name: &str) -> Option<&Participant> {
        let name = raw_name.trim();
        if name.is_empty() {
            return None;
        }

        match self.members.iter().position(|p| p.id == id) {
            Some(pos) => {
                let member = &mut self.members[pos];
                member.name = name.to_string();
                member.score = 0;
                Some(&*member)
            }
            None => {
                self.members.push(Participant {
                    id,
                    name: name.to_string(),
                    score: 0,
                });
                self.members.last()
            }
        }
    }

    /// Registers `id` as "Participant #N". Returns the existing entry when
    /// the connection already joined.
    pub fn join_anonymous(&mut self, id: ConnectionId) -> &Participant {
        if let Some(pos) = self.members.iter().position(|p| p.id == id) {
            return &self.members[pos];
        }

        let name = format!("Participant #{}", self.next_anonymous);
        self.next_anonymous += 1;
        self.members.push(Participant { id, name, score: 0 });
        &self.members[self.members.len() - 1]
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Participant> {
        self.members.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Participant> {
        self.members.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.get(id).is_some()
    }

    /// Returns true when the connection was registered.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|p| p.id != id);
        self.members.len() != before
    }

    pub fn reset_scores(&mut self) {
        for p in &mut self.members {
            p.score = 0;
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Participant> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn named_join_trims_and_rejects_blank() {
        let mut registry = Registry::new();
        let id = Uuid::new_v4();
        assert!(registry.join_named(id, "   ").is_none());
        assert_eq!(registry.join_named(id, "  Ada ").unwrap().name, "Ada");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejoin_keeps_position_and_resets_score() {
        let mut registry = Registry::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        registry.join_named(a, "A");
        registry.join_named(b, "B");
        registry.get_mut(a).unwrap().score = 4;
        registry.join_named(a, "Alice");

        let names: Vec<_> = registry.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "B"]);
        assert_eq!(registry.get(a).unwrap().score, 0);
    }

    #[test]
    fn anonymous_counter_survives_removal() {
        let mut registry = Registry::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(registry.join_anonymous(a).name, "Participant #1");
        assert_eq!(registry.join_anonymous(a).name, "Participant #1");
        assert!(registry.remove(a));
        assert!(!registry.remove(a));
        assert_eq!(registry.join_anonymous(b).name, "Participant #2");
    }
}
