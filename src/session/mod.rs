pub mod poll;
pub mod quiz;

use crate::models::ConnectionId;
use std::collections::HashSet;

/// Externally visible lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    QuestionActive(usize),
    Ended,
}

/// Which question is active. Only moves forward until the next start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    current: Option<usize>,
    running: bool,
    ended: bool,
}

impl Cursor {
    pub fn start(&mut self) {
        self.current = None;
        self.running = true;
        self.ended = false;
    }

    /// Steps to the next question. Returns `None`, and ends the session, once
    /// the last question has been passed.
    pub fn advance(&mut self, len: usize) -> Option<usize> {
        let next = self.current.map_or(0, |i| i + 1);
        if next >= len {
            self.running = false;
            self.ended = true;
            self.current = None;
            return None;
        }
        self.current = Some(next);
        Some(next)
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    // -1 when no question is active
    pub fn wire_index(&self) -> i64 {
        self.current.map_or(-1, |i| i as i64)
    }

    /// The active question index when a submission tagged `question_index` is current.
    pub fn accepts(&self, question_index: i64) -> Option<usize> {
        if !self.running {
            return None;
        }
        usize::try_from(question_index)
            .ok()
            .filter(|i| self.current == Some(*i))
    }

    pub fn phase(&self) -> Phase {
        match (self.running, self.current) {
            (true, Some(i)) => Phase::QuestionActive(i),
            (true, None) => Phase::Running,
            (false, _) if self.ended => Phase::Ended,
            (false, _) => Phase::Idle,
        }
    }
}

/// Per-question record of which connections already had an answer accepted.
#[derive(Debug, Default)]
pub struct Ledger {
    answered: Vec<HashSet<ConnectionId>>,
}

impl Ledger {
    pub fn reset(&mut self, len: usize) {
        self.answered = vec![HashSet::new(); len];
    }

    // Called when a question becomes active
    pub fn open(&mut self, index: usize) {
        if let Some(set) = self.answered.get_mut(index) {
            set.clear();
        }
    }

    pub fn has_answered(&self, index: usize, id: ConnectionId) -> bool {
        self.answered.get(index).is_some_and(|set| set.contains(&id))
    }

    pub fn record(&mut self, index: usize, id: ConnectionId) -> bool {
        self.answered
            .get_mut(index)
            .is_some_and(|set| set.insert(id))
    }

    pub fn count(&self, index: usize) -> usize {
        self.answered.get(index).map_or(0, HashSet::len)
    }
}
