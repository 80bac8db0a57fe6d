use crate::error::Rejection;
use crate::models::PollQuestion;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ChoiceTally {
    pub submissions: u32,
    pub counts: HashMap<String, u32>,
}

impl ChoiceTally {
    pub fn new(question: &PollQuestion) -> Self {
        Self {
            submissions: 0,
            counts: question.options.iter().map(|o| (o.clone(), 0)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionCount {
    pub text: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceSummary {
    pub question_index: usize,
    pub total_submissions: u32,
    pub options: Vec<OptionCount>,
}

pub fn fold(question: &PollQuestion, tally: &mut ChoiceTally, raw: &Value) -> Result<(), Rejection> {
    let choice = raw.as_str().ok_or(Rejection::NotText)?.trim();
    if !question.options.iter().any(|o| o == choice) {
        return Err(Rejection::UnknownOption(choice.to_string()));
    }

    *tally.counts.entry(choice.to_string()).or_insert(0) += 1;
    tally.submissions += 1;
    Ok(())
}

/// Counts in the question's own option order.
pub fn present(question_index: usize, question: &PollQuestion, tally: &ChoiceTally) -> ChoiceSummary {
    ChoiceSummary {
        question_index,
        total_submissions: tally.submissions,
        options: question
            .options
            .iter()
            .map(|text| OptionCount {
                text: text.clone(),
                count: tally.counts.get(text).copied().unwrap_or(0),
            })
            .collect(),
    }
}
