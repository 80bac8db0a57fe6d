pub mod importance;
pub mod quiz;
pub mod single_choice;
pub mod word_cloud;

use crate::error::Rejection;
use crate::models::{PollKind, PollQuestion, QuestionBank};
use serde::Serialize;
use serde_json::Value;

use importance::{ImportanceSummary, ImportanceTally};
use single_choice::{ChoiceSummary, ChoiceTally};
use word_cloud::{WordCloudSummary, WordCloudTally};

// Running tally for one poll question. Always built from that question, so the
// variant matches the question kind.
#[derive(Debug, Clone)]
pub enum Aggregate {
    WordCloud(WordCloudTally),
    SingleChoice(ChoiceTally),
    RankedImportance(ImportanceTally),
}

impl Aggregate {
    pub fn new(question: &PollQuestion) -> Self {
        match question.kind {
            PollKind::WordCloud => Aggregate::WordCloud(WordCloudTally::default()),
            PollKind::SingleChoice => Aggregate::SingleChoice(ChoiceTally::new(question)),
            PollKind::RankedImportance => Aggregate::RankedImportance(ImportanceTally::new(question)),
        }
    }
}

/// Client-facing projection of an aggregate.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Summary {
    #[serde(rename = "word-cloud")]
    WordCloud(WordCloudSummary),
    #[serde(rename = "single-choice")]
    SingleChoice(ChoiceSummary),
    #[serde(rename = "ranked-importance")]
    RankedImportance(ImportanceSummary),
}

impl Summary {
    #[cfg(test)]
    pub fn total_submissions(&self) -> u32 {
        match self {
            Summary::WordCloud(s) => s.total_submissions,
            Summary::SingleChoice(s) => s.total_submissions,
            Summary::RankedImportance(s) => s.total_submissions,
        }
    }
}

/// One fresh aggregate per question, in bank order.
pub fn allocate(bank: &QuestionBank<PollQuestion>) -> Vec<Aggregate> {
    bank.iter().map(Aggregate::new).collect()
}

/// Validates `raw` and merges it into `aggregate`. Nothing is mutated when the answer is rejected.
pub fn fold(question: &PollQuestion, aggregate: &mut Aggregate, raw: &Value) -> Result<(), Rejection> {
    match aggregate {
        Aggregate::WordCloud(t) => word_cloud::fold(question, t, raw),
        Aggregate::SingleChoice(t) => single_choice::fold(question, t, raw),
        Aggregate::RankedImportance(t) => importance::fold(question, t, raw),
    }
}

pub fn present(question_index: usize, question: &PollQuestion, aggregate: &Aggregate) -> Summary {
    match aggregate {
        Aggregate::WordCloud(t) => Summary::WordCloud(word_cloud::present(question_index, t)),
        Aggregate::SingleChoice(t) => {
            Summary::SingleChoice(single_choice::present(question_index, question, t))
        }
        Aggregate::RankedImportance(t) => {
            Summary::RankedImportance(importance::present(question_index, question, t))
        }
    }
}
