use crate::broadcast::hub::Hub;
use crate::broadcast::{Reply, reply};
use crate::commands::Command;
use crate::models::{Activity, validate_poll_bank, validate_quiz_bank};
use crate::session::poll::PollSession;
use crate::session::quiz::QuizSession;
use crate::tasks::question_timer::QuestionTimer;
use log::{info, warn};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Single writer for all session state.
///
/// Every connection and every countdown feeds one queue; commands are
/// applied one at a time, so a ledger check and the fold that follows it can
/// never interleave with another submission.
pub struct Engine {
    quiz: QuizSession,
    poll: PollSession,
    hub: Hub,
}

impl Engine {
    /// `commands` is the sending half of the engine's own queue; the quiz
    /// countdown posts its expiries there.
    pub fn new(commands: UnboundedSender<Command>) -> Self {
        Self {
            quiz: QuizSession::new(QuestionTimer::new(commands)),
            poll: PollSession::new(),
            hub: Hub::default(),
        }
    }

    pub async fn run(mut self, mut inbox: UnboundedReceiver<Command>) {
        info!("Session engine running");
        while let Some(command) = inbox.recv().await {
            self.handle(command);
        }
        info!("Session engine stopped");
    }

    pub fn handle(&mut self, command: Command) {
        match command {
            Command::Connect { id, role, outbox } => {
                self.hub.attach(id, role, outbox);
                info!("{} connected as {:?} ({} open)", id, role, self.hub.len());
                match role.activity() {
                    Activity::Quiz => self.quiz.greet(id, role, &self.hub),
                    Activity::Poll => self.poll.greet(id, role, &self.hub),
                }
            }
            Command::Disconnect { id } => {
                let Some(role) = self.hub.detach(id) else {
                    return;
                };
                info!("{} disconnected ({} open)", id, self.hub.len());
                match role.activity() {
                    Activity::Quiz => self.quiz.disconnect(id, &self.hub),
                    Activity::Poll => self.poll.disconnect(id, &self.hub),
                }
            }

            Command::LoadQuiz { id, questions } => match validate_quiz_bank(&questions) {
                Ok(()) => self.quiz.load(questions, &self.hub),
                Err(e) => {
                    warn!("Rejected quiz upload from {}: {}", id, e);
                    reply(&self.hub, id, &Reply::LoadFailed {
                        message: e.to_string(),
                    });
                }
            },
            Command::StartQuiz => self.quiz.start(&self.hub),
            Command::NextQuestion => self.quiz.advance(&self.hub),
            Command::JoinQuiz { id, name } => self.quiz.join(id, &name, &self.hub),
            Command::Answer {
                id,
                question_index,
                answer,
            } => self.quiz.submit(id, question_index, &answer, &self.hub),
            Command::QuizTimerExpired {
                question_index,
                generation,
            } => self.quiz.on_timer(question_index, generation, &self.hub),

            Command::LoadPoll { id, questions } => match validate_poll_bank(&questions) {
                Ok(()) => self.poll.load(questions, &self.hub),
                Err(e) => {
                    warn!("Rejected poll upload from {}: {}", id, e);
                    reply(&self.hub, id, &Reply::LoadFailed {
                        message: e.to_string(),
                    });
                }
            },
            Command::StartPoll => self.poll.start(&self.hub),
            Command::NextPoll => self.poll.advance(&self.hub),
            Command::JoinPoll { id } => self.poll.join(id, &self.hub),
            Command::PollAnswer {
                id,
                question_index,
                answer,
            } => self.poll.submit(id, question_index, &answer, &self.hub),
        }
    }
}
