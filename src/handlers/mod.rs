pub mod ws;

use crate::commands::Command;
use crate::models::{Activity, ConnectionId, PollQuestion, QuizQuestion, Role};
use crate::session::poll::PollAnswer;
use log::debug;
use serde::Deserialize;
use serde_json::Value;

/// Frames a quiz client may send, tagged by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuizMessage {
    Join {
        #[serde(default)]
        name: String,
    },
    Answer {
        #[serde(rename = "questionIndex")]
        question_index: i64,
        #[serde(default)]
        answer: Value,
    },
    LoadQuestions {
        questions: Vec<QuizQuestion>,
    },
    StartQuiz,
    NextQuestion,
}

/// Frames a poll client may send, tagged by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PollMessage {
    PollJoin,
    PollAnswer {
        #[serde(rename = "questionIndex")]
        question_index: i64,
        #[serde(flatten)]
        answer: PollAnswer,
    },
    LoadQuestions {
        questions: Vec<PollQuestion>,
    },
    PollStart,
    PollNext,
}

impl QuizMessage {
    // Players answer, admins steer; anything else is dropped
    fn into_command(self, id: ConnectionId, role: Role) -> Option<Command> {
        match (self, role) {
            (QuizMessage::Join { name }, Role::Player) => Some(Command::JoinQuiz { id, name }),
            (
                QuizMessage::Answer {
                    question_index,
                    answer,
                },
                Role::Player,
            ) => Some(Command::Answer {
                id,
                question_index,
                answer,
            }),
            (QuizMessage::LoadQuestions { questions }, Role::QuizAdmin) => {
                Some(Command::LoadQuiz { id, questions })
            }
            (QuizMessage::StartQuiz, Role::QuizAdmin) => Some(Command::StartQuiz),
            (QuizMessage::NextQuestion, Role::QuizAdmin) => Some(Command::NextQuestion),
            _ => None,
        }
    }
}

impl PollMessage {
    fn into_command(self, id: ConnectionId, role: Role) -> Option<Command> {
        match (self, role) {
            (PollMessage::PollJoin, Role::PollParticipant) => Some(Command::JoinPoll { id }),
            (
                PollMessage::PollAnswer {
                    question_index,
                    answer,
                },
                Role::PollParticipant,
            ) => Some(Command::PollAnswer {
                id,
                question_index,
                answer,
            }),
            (PollMessage::LoadQuestions { questions }, Role::PollAdmin) => {
                Some(Command::LoadPoll { id, questions })
            }
            (PollMessage::PollStart, Role::PollAdmin) => Some(Command::StartPoll),
            (PollMessage::PollNext, Role::PollAdmin) => Some(Command::NextPoll),
            _ => None,
        }
    }
}

/// Turns one inbound text frame into an engine command. Undecodable frames
/// and frames the role may not send yield `None`.
pub fn decode(id: ConnectionId, role: Role, text: &str) -> Option<Command> {
    let command = match role.activity() {
        Activity::Quiz => serde_json::from_str::<QuizMessage>(text)
            .ok()
            .and_then(|m| m.into_command(id, role)),
        Activity::Poll => serde_json::from_str::<PollMessage>(text)
            .ok()
            .and_then(|m| m.into_command(id, role)),
    };

    if command.is_none() {
        debug!("Ignored frame from {} ({:?}): {}", id, role, text);
    }
    command
}
