use crate::error::Rejection;
use crate::models::{QuestionBank, QuizQuestion};
use crate::participants::Registry;
use serde::Serialize;
use serde_json::Value;

/// Correct and total accepted answers for one quiz question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuestionTally {
    pub correct: u32,
    pub total: u32,
}

impl QuestionTally {
    pub fn accuracy(&self) -> f64 {
        if self.total > 0 {
            self.correct as f64 / self.total as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub rank: usize,
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionDifficulty {
    pub index: usize,
    pub question: String,
    pub correct: u32,
    pub total: u32,
    pub accuracy: f64,
}

/// Folds one answer into the question's tally. Returns whether it was correct.
pub fn fold(question: &QuizQuestion, tally: &mut QuestionTally, raw: &Value) -> Result<bool, Rejection> {
    let answer = raw.as_str().ok_or(Rejection::NotText)?;
    if !question.is_choice(answer) {
        return Err(Rejection::NotAChoice);
    }

    let correct = answer == question.correct;
    tally.total += 1;
    if correct {
        tally.correct += 1;
    }
    Ok(correct)
}

/// Players by score, highest first. Ties keep join order and still get
/// their own sequential rank.
pub fn ranking(registry: &Registry) -> Vec<RankEntry> {
    let mut players: Vec<_> = registry.iter().collect();
    players.sort_by(|a, b| b.score.cmp(&a.score));

    players
        .into_iter()
        .enumerate()
        .map(|(i, p)| RankEntry {
            rank: i + 1,
            name: p.name.clone(),
            score: p.score,
        })
        .collect()
}

/// Hardest questions first: accuracy ascending, then most attempted, then bank order.
pub fn difficulty_ranking(
    bank: &QuestionBank<QuizQuestion>,
    tallies: &[QuestionTally],
) -> Vec<QuestionDifficulty> {
    let mut rows: Vec<QuestionDifficulty> = bank
        .iter()
        .enumerate()
        .map(|(index, q)| {
            let tally = tallies.get(index).copied().unwrap_or_default();
            QuestionDifficulty {
                index,
                question: q.question.clone(),
                correct: tally.correct,
                total: tally.total,
                accuracy: tally.accuracy(),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        a.accuracy
            .total_cmp(&b.accuracy)
            .then_with(|| b.total.cmp(&a.total))
            .then_with(|| a.index.cmp(&b.index))
    });
    rows
}
