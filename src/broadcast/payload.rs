use crate::aggregation::Summary;
use crate::aggregation::quiz::{QuestionDifficulty, RankEntry};
use crate::models::PollKind;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestionPayload {
    pub index: usize,
    pub total: usize,
    pub question: String,
    // Shuffled once per activation; every client sees the same order
    pub answers: Vec<String>,
    pub time_limit: u32,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollQuestionPayload {
    pub index: usize,
    pub total: usize,
    #[serde(rename = "type")]
    pub kind: PollKind,
    pub question: String,
    pub options: Vec<String>,
    pub max_words_per_user: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerEntry {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantEntry {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResults {
    pub ranking: Vec<RankEntry>,
    pub question_ranking: Vec<QuestionDifficulty>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollQuestionResult {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: PollKind,
    pub summary: Summary,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollResults {
    pub results: Vec<PollQuestionResult>,
}

/// Snapshot sent to a quiz connection as soon as it opens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStatus {
    pub quiz_loaded: bool,
    pub total_questions: usize,
    pub quiz_in_progress: bool,
    pub current_question_index: i64,
    pub current_question: Option<QuizQuestionPayload>,
}

/// Snapshot sent to a poll connection as soon as it opens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStatus {
    pub poll_loaded: bool,
    pub poll_in_progress: bool,
    pub total_questions: usize,
    pub current_question_index: i64,
    pub current_question: Option<PollQuestionPayload>,
    pub current_aggregate: Option<Summary>,
}
