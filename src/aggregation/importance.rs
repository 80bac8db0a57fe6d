use crate::error::Rejection;
use crate::models::PollQuestion;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct ImportanceTally {
    pub submissions: u32,
    pub scores: HashMap<String, u64>,
    // option -> how often it was placed at each position
    pub positions: HashMap<String, Vec<u32>>,
}

impl ImportanceTally {
    pub fn new(question: &PollQuestion) -> Self {
        let n = question.options.len();
        Self {
            submissions: 0,
            scores: question.options.iter().map(|o| (o.clone(), 0)).collect(),
            positions: question.options.iter().map(|o| (o.clone(), vec![0; n])).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportanceRow {
    pub text: String,
    pub score: u64,
    pub avg_rank: f64,
    pub position_counts: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportanceSummary {
    pub question_index: usize,
    pub total_submissions: u32,
    pub options: Vec<ImportanceRow>,
}

/// Folds a complete ranking. With N options the entry at position `i` earns `N - i` points.
pub fn fold(question: &PollQuestion, tally: &mut ImportanceTally, raw: &Value) -> Result<(), Rejection> {
    let entries = raw.as_array().ok_or(Rejection::NotAList)?;
    let ranking: Vec<&str> = entries
        .iter()
        .map(|e| e.as_str().map(str::trim).unwrap_or_default())
        .collect();

    let n = question.options.len();
    if ranking.len() != n {
        return Err(Rejection::IncompleteRanking { expected: n });
    }
    let distinct: HashSet<&str> = ranking.iter().copied().collect();
    if distinct.len() != n {
        return Err(Rejection::RepeatedOption);
    }
    if let Some(unknown) = ranking.iter().find(|r| !question.options.iter().any(|o| o == *r)) {
        return Err(Rejection::UnknownOption(unknown.to_string()));
    }

    for (pos, option) in ranking.into_iter().enumerate() {
        *tally.scores.entry(option.to_string()).or_insert(0) += (n - pos) as u64;
        tally
            .positions
            .entry(option.to_string())
            .or_insert_with(|| vec![0; n])[pos] += 1;
    }

    tally.submissions += 1;
    Ok(())
}

pub fn present(question_index: usize, question: &PollQuestion, tally: &ImportanceTally) -> ImportanceSummary {
    let mut options: Vec<ImportanceRow> = question
        .options
        .iter()
        .map(|text| {
            let position_counts = tally.positions.get(text).cloned().unwrap_or_default();
            let rank_sum: u64 = position_counts
                .iter()
                .enumerate()
                .map(|(pos, count)| *count as u64 * (pos as u64 + 1))
                .sum();
            let avg_rank = if tally.submissions > 0 {
                rank_sum as f64 / tally.submissions as f64
            } else {
                0.0
            };

            ImportanceRow {
                text: text.clone(),
                score: tally.scores.get(text).copied().unwrap_or(0),
                avg_rank,
                position_counts,
            }
        })
        .collect();

    options.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.avg_rank.total_cmp(&b.avg_rank))
    });

    ImportanceSummary {
        question_index,
        total_submissions: tally.submissions,
        options,
    }
}
