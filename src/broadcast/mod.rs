pub mod hub;
pub mod payload;
#[cfg(test)]
pub mod recorder;

use crate::aggregation::Summary;
use crate::aggregation::quiz::RankEntry;
use crate::models::{ConnectionId, Role};
use payload::*;
use serde_json::{Value, json};

/// Named broadcast group. A connection belongs to the group of its role and
/// to the "everyone" group of its activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Audience {
    QuizAdmins,
    QuizScoreboards,
    QuizPlayers,
    QuizEveryone,
    PollAdmins,
    PollDisplays,
    PollParticipants,
    PollEveryone,
}

impl Audience {
    pub fn memberships(role: Role) -> [Audience; 2] {
        match role {
            Role::QuizAdmin => [Audience::QuizAdmins, Audience::QuizEveryone],
            Role::Scoreboard => [Audience::QuizScoreboards, Audience::QuizEveryone],
            Role::Player => [Audience::QuizPlayers, Audience::QuizEveryone],
            Role::PollAdmin => [Audience::PollAdmins, Audience::PollEveryone],
            Role::PollDisplay => [Audience::PollDisplays, Audience::PollEveryone],
            Role::PollParticipant => [Audience::PollParticipants, Audience::PollEveryone],
        }
    }
}

/// Delivery primitives supplied by the transport. Sends are fire-and-forget.
pub trait Transport {
    fn send_to(&self, connection: ConnectionId, event: &str, payload: Value);
    fn send_to_audience(&self, audience: Audience, event: &str, payload: Value);
}

/// Session state changes fanned out to audiences.
#[derive(Debug, Clone)]
pub enum Event {
    QuizLoaded { total_questions: usize },
    QuizStarted,
    QuizQuestion(QuizQuestionPayload),
    Scores(Vec<RankEntry>),
    QuestionTimeout { index: usize },
    QuizEnded(QuizResults),
    Players(Vec<PlayerEntry>),
    PollLoaded { total_questions: usize },
    PollStarted,
    PollQuestion(PollQuestionPayload),
    PollAggregate(Summary),
    PollEnded(PollResults),
    PollParticipants(Vec<ParticipantEntry>),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::QuizLoaded { .. } => "quiz-loaded",
            Event::QuizStarted => "quiz-started",
            Event::QuizQuestion(_) => "question",
            Event::Scores(_) => "scores",
            Event::QuestionTimeout { .. } => "question-timeout",
            Event::QuizEnded(_) => "quiz-ended",
            Event::Players(_) => "players",
            Event::PollLoaded { .. } => "poll-loaded",
            Event::PollStarted => "poll-started",
            Event::PollQuestion(_) => "poll-question",
            Event::PollAggregate(_) => "poll-aggregate",
            Event::PollEnded(_) => "poll-ended",
            Event::PollParticipants(_) => "poll-participants",
        }
    }

    // Routing table
    pub fn audiences(&self) -> &'static [Audience] {
        use Audience::*;
        match self {
            Event::QuizLoaded { .. } | Event::Players(_) => &[QuizAdmins],
            Event::QuizStarted | Event::QuizEnded(_) => &[QuizEveryone],
            Event::QuizQuestion(_) => &[QuizPlayers, QuizScoreboards, QuizAdmins],
            Event::Scores(_) => &[QuizAdmins, QuizScoreboards],
            Event::QuestionTimeout { .. } => &[QuizPlayers],
            Event::PollLoaded { .. } | Event::PollParticipants(_) => &[PollAdmins],
            Event::PollStarted | Event::PollEnded(_) => &[PollEveryone],
            Event::PollQuestion(_) => &[PollParticipants, PollDisplays, PollAdmins],
            Event::PollAggregate(_) => &[PollAdmins, PollDisplays],
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            Event::QuizLoaded { total_questions } | Event::PollLoaded { total_questions } => {
                json!({ "totalQuestions": total_questions })
            }
            Event::QuizStarted | Event::PollStarted => Value::Null,
            Event::QuizQuestion(p) => serde_json::to_value(p).unwrap_or_default(),
            Event::Scores(r) => serde_json::to_value(r).unwrap_or_default(),
            Event::QuestionTimeout { index } => json!({ "index": index }),
            Event::QuizEnded(r) => serde_json::to_value(r).unwrap_or_default(),
            Event::Players(p) => serde_json::to_value(p).unwrap_or_default(),
            Event::PollQuestion(p) => serde_json::to_value(p).unwrap_or_default(),
            Event::PollAggregate(s) => serde_json::to_value(s).unwrap_or_default(),
            Event::PollEnded(r) => serde_json::to_value(r).unwrap_or_default(),
            Event::PollParticipants(p) => serde_json::to_value(p).unwrap_or_default(),
        }
    }
}

/// Answers addressed to a single connection.
#[derive(Debug, Clone)]
pub enum Reply {
    Joined { name: String },
    AnswerResult { correct: bool, correct_answer: String },
    AnswerRejected { reason: String },
    QuizStatus(QuizStatus),
    PollJoined { name: String },
    PollAnswerAccepted { question_index: usize },
    PollAnswerRejected { reason: String },
    PollStatus(PollStatus),
    LoadFailed { message: String },
    AdminAuthFailed,
}

impl Reply {
    pub fn name(&self) -> &'static str {
        match self {
            Reply::Joined { .. } => "joined",
            Reply::AnswerResult { .. } => "answer-result",
            Reply::AnswerRejected { .. } => "answer-rejected",
            Reply::QuizStatus(_) => "quiz-status",
            Reply::PollJoined { .. } => "poll-joined",
            Reply::PollAnswerAccepted { .. } => "poll-answer-accepted",
            Reply::PollAnswerRejected { .. } => "poll-answer-rejected",
            Reply::PollStatus(_) => "poll-status",
            Reply::LoadFailed { .. } => "load-failed",
            Reply::AdminAuthFailed => "admin-auth-failed",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            Reply::Joined { name } | Reply::PollJoined { name } => json!({ "name": name }),
            Reply::AnswerResult {
                correct,
                correct_answer,
            } => json!({ "correct": correct, "correctAnswer": correct_answer }),
            Reply::AnswerRejected { reason } | Reply::PollAnswerRejected { reason } => {
                json!({ "reason": reason })
            }
            Reply::QuizStatus(s) => serde_json::to_value(s).unwrap_or_default(),
            Reply::PollAnswerAccepted { question_index } => {
                json!({ "questionIndex": question_index })
            }
            Reply::PollStatus(s) => serde_json::to_value(s).unwrap_or_default(),
            Reply::LoadFailed { message } => json!({ "message": message }),
            Reply::AdminAuthFailed => Value::Null,
        }
    }
}

pub fn publish(out: &dyn Transport, event: &Event) {
    let payload = event.payload();
    for audience in event.audiences() {
        out.send_to_audience(*audience, event.name(), payload.clone());
    }
}

/// Sends an audience event to one connection only, e.g. to bring a new client up to date.
pub fn deliver(out: &dyn Transport, connection: ConnectionId, event: &Event) {
    out.send_to(connection, event.name(), event.payload());
}

pub fn reply(out: &dyn Transport, connection: ConnectionId, reply: &Reply) {
    out.send_to(connection, reply.name(), reply.payload());
}

#[cfg(test)]
mod tests {
    use super::recorder::Recorder;
    use super::*;

    #[test]
    fn question_reaches_every_quiz_role_but_not_everyone_group() {
        let out = Recorder::default();
        publish(&out, &Event::QuestionTimeout { index: 2 });
        publish(&out, &Event::Scores(Vec::new()));

        assert_eq!(out.events_to(Audience::QuizPlayers), vec!["question-timeout"]);
        assert_eq!(out.events_to(Audience::QuizScoreboards), vec!["scores"]);
        assert_eq!(out.events_to(Audience::QuizAdmins), vec!["scores"]);
        assert!(out.events_to(Audience::QuizEveryone).is_empty());
    }

    #[test]
    fn poll_aggregate_goes_to_admins_and_displays_only() {
        let event = Event::PollAggregate(crate::aggregation::Summary::WordCloud(
            crate::aggregation::word_cloud::WordCloudSummary {
                question_index: 0,
                total_submissions: 0,
                entries: Vec::new(),
            },
        ));
        assert_eq!(
            event.audiences(),
            &[Audience::PollAdmins, Audience::PollDisplays]
        );
        assert_eq!(event.payload()["type"], "word-cloud");
    }

    #[test]
    fn memberships_stay_within_activity() {
        assert_eq!(
            Audience::memberships(Role::PollDisplay),
            [Audience::PollDisplays, Audience::PollEveryone]
        );
        assert_eq!(
            Audience::memberships(Role::Player),
            [Audience::QuizPlayers, Audience::QuizEveryone]
        );
    }

    #[test]
    fn answer_result_payload_uses_camel_case() {
        let reply = Reply::AnswerResult {
            correct: false,
            correct_answer: "4".into(),
        };
        assert_eq!(reply.name(), "answer-result");
        assert_eq!(reply.payload(), json!({"correct": false, "correctAnswer": "4"}));
    }
}
