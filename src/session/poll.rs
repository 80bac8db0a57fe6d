use super::{Cursor, Ledger, Phase};
use crate::aggregation::{self, Aggregate, Summary};
use crate::broadcast::payload::{
    ParticipantEntry, PollQuestionPayload, PollQuestionResult, PollResults, PollStatus,
};
use crate::broadcast::{Event, Reply, Transport, deliver, publish, reply};
use crate::models::{ConnectionId, PollKind, PollQuestion, QuestionBank, Role};
use crate::participants::Registry;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

/// Raw answer fields of a poll submission. Only the field matching the
/// question type is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollAnswer {
    #[serde(default)]
    pub words: Value,
    #[serde(default)]
    pub choice: Value,
    #[serde(default)]
    pub ranking: Value,
}

impl PollAnswer {
    pub fn for_kind(&self, kind: PollKind) -> &Value {
        match kind {
            PollKind::WordCloud => &self.words,
            PollKind::SingleChoice => &self.choice,
            PollKind::RankedImportance => &self.ranking,
        }
    }
}

/// The admin-paced audience poll. Questions advance only on admin command.
pub struct PollSession {
    bank: QuestionBank<PollQuestion>,
    cursor: Cursor,
    ledger: Ledger,
    aggregates: Vec<Aggregate>,
    participants: Registry,
}

impl Default for PollSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PollSession {
    pub fn new() -> Self {
        Self {
            bank: QuestionBank::default(),
            cursor: Cursor::default(),
            ledger: Ledger::default(),
            aggregates: Vec::new(),
            participants: Registry::new(),
        }
    }

    /// Replaces the bank and discards the running session with it.
    pub fn load(&mut self, mut questions: Vec<PollQuestion>, out: &dyn Transport) {
        // Word clouds take free text only
        for question in questions.iter_mut().filter(|q| q.kind == PollKind::WordCloud) {
            question.options.clear();
        }
        self.bank = QuestionBank::new(questions);
        self.cursor = Cursor::default();
        self.aggregates = aggregation::allocate(&self.bank);
        self.ledger.reset(self.bank.len());

        info!("Poll bank loaded with {} questions", self.bank.len());
        publish(out, &Event::PollLoaded {
            total_questions: self.bank.len(),
        });
    }

    pub fn start(&mut self, out: &dyn Transport) {
        if self.cursor.is_running() || self.bank.is_empty() {
            debug!("Poll start ignored in {:?}", self.phase());
            return;
        }

        self.aggregates = aggregation::allocate(&self.bank);
        self.ledger.reset(self.bank.len());
        self.cursor.start();

        info!("Poll started with {} participants", self.participants.len());
        publish(out, &Event::PollStarted);
        self.advance(out);
    }

    pub fn advance(&mut self, out: &dyn Transport) {
        if !self.cursor.is_running() {
            debug!("Poll advance ignored in {:?}", self.phase());
            return;
        }

        match self.cursor.advance(self.bank.len()) {
            Some(index) => {
                self.ledger.open(index);
                if let Some(payload) = self.question_payload(index) {
                    info!("Poll question {}/{} active", index + 1, self.bank.len());
                    publish(out, &Event::PollQuestion(payload));
                }
                self.broadcast_aggregate(index, out);
            }
            None => self.finish(out),
        }
    }

    fn finish(&mut self, out: &dyn Transport) {
        let results = self
            .bank
            .iter()
            .zip(&self.aggregates)
            .enumerate()
            .map(|(index, (question, aggregate))| PollQuestionResult {
                question: question.question.clone(),
                kind: question.kind,
                summary: aggregation::present(index, question, aggregate),
            })
            .collect();

        info!("Poll ended");
        publish(out, &Event::PollEnded(PollResults { results }));
    }

    /// Registers the connection under an automatic name, or repeats the
    /// name it already has.
    pub fn join(&mut self, id: ConnectionId, out: &dyn Transport) {
        let known = self.participants.contains(id);
        let name = self.participants.join_anonymous(id).name.clone();

        reply(out, id, &Reply::PollJoined { name });
        if !known {
            publish(out, &Event::PollParticipants(self.participant_list()));
        }
    }

    pub fn submit(&mut self, id: ConnectionId, question_index: i64, answer: &PollAnswer, out: &dyn Transport) {
        let Some(index) = self.cursor.accepts(question_index) else {
            debug!("Poll answer for question {} from {} is not current", question_index, id);
            return;
        };
        if !self.participants.contains(id) || self.ledger.has_answered(index, id) {
            debug!("Poll answer from {} for question {} dropped", id, index);
            return;
        }
        let (Some(question), Some(aggregate)) =
            (self.bank.get(index), self.aggregates.get_mut(index))
        else {
            return;
        };

        match aggregation::fold(question, aggregate, answer.for_kind(question.kind)) {
            Ok(()) => {
                self.ledger.record(index, id);
                debug!("{} answers in for poll question {}", self.ledger.count(index), index);
                reply(out, id, &Reply::PollAnswerAccepted {
                    question_index: index,
                });
                self.broadcast_aggregate(index, out);
            }
            Err(rejection) => reply(out, id, &Reply::PollAnswerRejected {
                reason: rejection.to_string(),
            }),
        }
    }

    pub fn disconnect(&mut self, id: ConnectionId, out: &dyn Transport) {
        if self.participants.remove(id) {
            publish(out, &Event::PollParticipants(self.participant_list()));
        }
    }

    pub fn greet(&self, id: ConnectionId, role: Role, out: &dyn Transport) {
        reply(out, id, &Reply::PollStatus(self.status()));
        if role == Role::PollAdmin {
            deliver(out, id, &Event::PollParticipants(self.participant_list()));
        }
    }

    pub fn status(&self) -> PollStatus {
        let active = self.cursor.current().filter(|_| self.cursor.is_running());
        PollStatus {
            poll_loaded: !self.bank.is_empty(),
            poll_in_progress: self.cursor.is_running(),
            total_questions: self.bank.len(),
            current_question_index: self.cursor.wire_index(),
            current_question: active.and_then(|i| self.question_payload(i)),
            current_aggregate: active.and_then(|i| self.summary(i)),
        }
    }

    pub fn summary(&self, index: usize) -> Option<Summary> {
        let question = self.bank.get(index)?;
        let aggregate = self.aggregates.get(index)?;
        Some(aggregation::present(index, question, aggregate))
    }

    pub fn phase(&self) -> Phase {
        self.cursor.phase()
    }

    fn broadcast_aggregate(&self, index: usize, out: &dyn Transport) {
        if let Some(summary) = self.summary(index) {
            publish(out, &Event::PollAggregate(summary));
        }
    }

    fn question_payload(&self, index: usize) -> Option<PollQuestionPayload> {
        let question = self.bank.get(index)?;
        Some(PollQuestionPayload {
            index,
            total: self.bank.len(),
            kind: question.kind,
            question: question.question.clone(),
            options: question.options.clone(),
            max_words_per_user: (question.kind == PollKind::WordCloud)
                .then(|| question.word_limit()),
        })
    }

    fn participant_list(&self) -> Vec<ParticipantEntry> {
        self.participants
            .iter()
            .map(|p| ParticipantEntry {
                name: p.name.clone(),
            })
            .collect()
    }
}
