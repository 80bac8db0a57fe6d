use crate::commands::Command;
use log::{debug, info};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Countdown for the active quiz question.
///
/// Expiry is not acted on directly: the countdown task posts
/// `Command::QuizTimerExpired` back onto the engine queue, tagged with the
/// generation it was armed under. Cancelling or re-arming bumps the
/// generation, so an expiry that was already queued is ignored by `fire`.
pub struct QuestionTimer {
    commands: UnboundedSender<Command>,
    pending: Option<JoinHandle<()>>,
    generation: u64,
}

impl QuestionTimer {
    pub fn new(commands: UnboundedSender<Command>) -> Self {
        Self {
            commands,
            pending: None,
            generation: 0,
        }
    }

    pub fn arm(&mut self, question_index: usize, limit: Duration) {
        self.cancel();
        let generation = self.generation;
        let commands = self.commands.clone();

        info!("Question {} closes in {}s", question_index, limit.as_secs());
        self.pending = Some(tokio::spawn(async move {
            sleep(limit).await;
            if commands
                .send(Command::QuizTimerExpired {
                    question_index,
                    generation,
                })
                .is_err()
            {
                debug!("Engine gone before question {} expired", question_index);
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    /// Consumes an expiry. True only for the countdown that is currently
    /// armed, and only the first time.
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.pending.is_none() || generation != self.generation {
            return false;
        }
        self.pending = None;
        self.generation += 1;
        true
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for QuestionTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
