use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BankError;

// Identity of one transport connection. Answer ledgers and registries are keyed by it.
pub type ConnectionId = Uuid;

// Word-cloud submissions fall back to this when the upload gave no usable limit
pub const DEFAULT_MAX_WORDS: usize = 3;
pub const MAX_DISTRACTORS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    Quiz,
    Poll,
}

/// Role tag assigned by the transport when a connection is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    QuizAdmin,
    Scoreboard,
    Player,
    PollAdmin,
    PollDisplay,
    PollParticipant,
}

impl Role {
    /// Maps the `role` query value of a connection. Unknown or missing values
    /// fall back to the participant role of the activity.
    pub fn from_query(activity: Activity, raw: Option<&str>) -> Self {
        match (activity, raw.unwrap_or_default()) {
            (Activity::Quiz, "admin") => Role::QuizAdmin,
            (Activity::Quiz, "scoreboard") => Role::Scoreboard,
            (Activity::Quiz, _) => Role::Player,
            (Activity::Poll, "poll-admin") => Role::PollAdmin,
            (Activity::Poll, "poll-display") => Role::PollDisplay,
            (Activity::Poll, _) => Role::PollParticipant,
        }
    }

    pub fn activity(&self) -> Activity {
        match self {
            Role::QuizAdmin | Role::Scoreboard | Role::Player => Activity::Quiz,
            Role::PollAdmin | Role::PollDisplay | Role::PollParticipant => Activity::Poll,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::QuizAdmin | Role::PollAdmin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub correct: String,
    #[serde(default)]
    pub wrong: Vec<String>,
    // Seconds
    pub time: u32,
}

impl QuizQuestion {
    pub fn new(question: &str, correct: &str, wrong: &[&str], time: u32) -> Self {
        Self {
            question: question.to_string(),
            correct: correct.to_string(),
            wrong: wrong.iter().map(|w| w.to_string()).collect(),
            time,
        }
    }

    /// The correct answer followed by every non-empty distractor, unshuffled.
    pub fn choices(&self) -> Vec<String> {
        std::iter::once(self.correct.clone())
            .chain(self.wrong.iter().filter(|w| !w.is_empty()).cloned())
            .collect()
    }

    pub fn is_choice(&self, answer: &str) -> bool {
        answer == self.correct || self.wrong.iter().any(|w| !w.is_empty() && w == answer)
    }

    fn validate(&self, index: usize) -> Result<(), BankError> {
        if self.question.trim().is_empty() {
            return Err(BankError::EmptyPrompt(index));
        }
        if self.correct.trim().is_empty() {
            return Err(BankError::MissingCorrectAnswer(index));
        }
        let distractors = self.wrong.iter().filter(|w| !w.is_empty()).count();
        if distractors == 0 || self.wrong.len() > MAX_DISTRACTORS {
            return Err(BankError::DistractorCount(index));
        }
        if self.time == 0 {
            return Err(BankError::ZeroTimeLimit(index));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PollKind {
    WordCloud,
    SingleChoice,
    RankedImportance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollQuestion {
    #[serde(rename = "type")]
    pub kind: PollKind,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub max_words_per_user: Option<i64>,
}

impl PollQuestion {
    pub fn word_cloud(question: &str, max_words_per_user: Option<i64>) -> Self {
        Self {
            kind: PollKind::WordCloud,
            question: question.to_string(),
            options: Vec::new(),
            max_words_per_user,
        }
    }

    pub fn with_options(kind: PollKind, question: &str, options: &[&str]) -> Self {
        Self {
            kind,
            question: question.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            max_words_per_user: None,
        }
    }

    /// Number of words a single word-cloud submission may contribute.
    pub fn word_limit(&self) -> usize {
        match self.max_words_per_user {
            Some(n) if n > 0 => n as usize,
            _ => DEFAULT_MAX_WORDS,
        }
    }

    fn validate(&self, index: usize) -> Result<(), BankError> {
        if self.question.trim().is_empty() {
            return Err(BankError::EmptyPrompt(index));
        }
        if self.kind != PollKind::WordCloud && self.options.len() < 2 {
            return Err(BankError::TooFewOptions(index));
        }
        Ok(())
    }
}

/// Ordered question records. Replaced as a whole on upload, never edited in place.
#[derive(Debug, Clone)]
pub struct QuestionBank<Q> {
    questions: Vec<Q>,
}

impl<Q> Default for QuestionBank<Q> {
    fn default() -> Self {
        Self { questions: Vec::new() }
    }
}

impl<Q> QuestionBank<Q> {
    pub fn new(questions: Vec<Q>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Q> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Q> {
        self.questions.iter()
    }
}

pub fn validate_quiz_bank(questions: &[QuizQuestion]) -> Result<(), BankError> {
    if questions.is_empty() {
        return Err(BankError::Empty);
    }
    questions
        .iter()
        .enumerate()
        .try_for_each(|(i, q)| q.validate(i))
}

pub fn validate_poll_bank(questions: &[PollQuestion]) -> Result<(), BankError> {
    if questions.is_empty() {
        return Err(BankError::Empty);
    }
    questions
        .iter()
        .enumerate()
        .try_for_each(|(i, q)| q.validate(i))
}
