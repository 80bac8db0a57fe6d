use crate::error::Rejection;
use crate::models::PollQuestion;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

// Longer entries are dropped rather than truncated
pub const MAX_WORD_CHARS: usize = 40;

#[derive(Debug, Clone)]
pub struct WordEntry {
    pub display: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct WordCloudTally {
    pub submissions: u32,
    // Keyed by the lowercased word
    pub counts: HashMap<String, WordEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCloudSummary {
    pub question_index: usize,
    pub total_submissions: u32,
    pub entries: Vec<WordCount>,
}

pub fn fold(question: &PollQuestion, tally: &mut WordCloudTally, raw: &Value) -> Result<(), Rejection> {
    let words = raw.as_array().ok_or(Rejection::NotAList)?;

    // Only the first `word_limit` entries are considered, even if some of them are dropped below
    let cleaned: Vec<&str> = words
        .iter()
        .take(question.word_limit())
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|w| !w.is_empty() && w.chars().count() <= MAX_WORD_CHARS)
        .collect();

    if cleaned.is_empty() {
        return Err(Rejection::NoUsableWords);
    }

    for word in cleaned {
        let entry = tally
            .counts
            .entry(word.to_lowercase())
            .or_insert_with(|| WordEntry {
                display: word.to_string(),
                count: 0,
            });
        entry.count += 1;
    }

    tally.submissions += 1;
    Ok(())
}

pub fn present(question_index: usize, tally: &WordCloudTally) -> WordCloudSummary {
    let mut entries: Vec<&WordEntry> = tally.counts.values().collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.display.cmp(&b.display)));

    WordCloudSummary {
        question_index,
        total_submissions: tally.submissions,
        entries: entries
            .into_iter()
            .map(|e| WordCount {
                word: e.display.clone(),
                count: e.count,
            })
            .collect(),
    }
}
