use crate::models::{ConnectionId, PollQuestion, QuizQuestion, Role};
use crate::session::poll::PollAnswer;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

/// Everything that can change session state, consumed in order by the engine.
///
/// Admin-only variants are only produced for connections the transport has
/// already authorised.
#[derive(Debug)]
pub enum Command {
    Connect {
        id: ConnectionId,
        role: Role,
        outbox: UnboundedSender<String>,
    },
    Disconnect {
        id: ConnectionId,
    },

    // Quiz
    LoadQuiz {
        id: ConnectionId,
        questions: Vec<QuizQuestion>,
    },
    StartQuiz,
    NextQuestion,
    JoinQuiz {
        id: ConnectionId,
        name: String,
    },
    Answer {
        id: ConnectionId,
        question_index: i64,
        answer: Value,
    },
    QuizTimerExpired {
        question_index: usize,
        generation: u64,
    },

    // Poll
    LoadPoll {
        id: ConnectionId,
        questions: Vec<PollQuestion>,
    },
    StartPoll,
    NextPoll,
    JoinPoll {
        id: ConnectionId,
    },
    PollAnswer {
        id: ConnectionId,
        question_index: i64,
        answer: PollAnswer,
    },
}
