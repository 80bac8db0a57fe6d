use super::{Cursor, Ledger, Phase};
use crate::aggregation::quiz::{self as tally, QuestionTally, RankEntry};
use crate::broadcast::payload::{PlayerEntry, QuizQuestionPayload, QuizResults, QuizStatus};
use crate::broadcast::{Event, Reply, Transport, deliver, publish, reply};
use crate::models::{ConnectionId, QuestionBank, QuizQuestion, Role};
use crate::participants::Registry;
use crate::tasks::question_timer::QuestionTimer;
use chrono::Utc;
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::Value;
use std::time::Duration;

/// The timed multiple-choice quiz.
///
/// Questions advance on countdown expiry or on an admin command. Every
/// accepted answer scores the player and rebroadcasts the live ranking.
pub struct QuizSession {
    bank: QuestionBank<QuizQuestion>,
    cursor: Cursor,
    ledger: Ledger,
    tallies: Vec<QuestionTally>,
    players: Registry,
    // Payload of the active question, answers already shuffled
    active: Option<QuizQuestionPayload>,
    timer: QuestionTimer,
    rng: StdRng,
}

impl QuizSession {
    pub fn new(timer: QuestionTimer) -> Self {
        Self::with_rng(timer, StdRng::from_os_rng())
    }

    pub fn with_rng(timer: QuestionTimer, rng: StdRng) -> Self {
        Self {
            bank: QuestionBank::default(),
            cursor: Cursor::default(),
            ledger: Ledger::default(),
            tallies: Vec::new(),
            players: Registry::new(),
            active: None,
            timer,
            rng,
        }
    }

    /// Replaces the bank and discards the running session with it.
    pub fn load(&mut self, questions: Vec<QuizQuestion>, out: &dyn Transport) {
        self.timer.cancel();
        self.bank = QuestionBank::new(questions);
        self.cursor = Cursor::default();
        self.ledger.reset(self.bank.len());
        self.tallies = vec![QuestionTally::default(); self.bank.len()];
        self.active = None;

        info!("Quiz bank loaded with {} questions", self.bank.len());
        publish(out, &Event::QuizLoaded {
            total_questions: self.bank.len(),
        });
    }

    pub fn start(&mut self, out: &dyn Transport) {
        if self.cursor.is_running() || self.bank.is_empty() {
            debug!("Quiz start ignored in {:?}", self.phase());
            return;
        }

        self.players.reset_scores();
        self.tallies = vec![QuestionTally::default(); self.bank.len()];
        self.ledger.reset(self.bank.len());
        self.cursor.start();

        info!("Quiz started with {} players", self.players.len());
        publish(out, &Event::QuizStarted);
        self.advance(out);
    }

    pub fn advance(&mut self, out: &dyn Transport) {
        if !self.cursor.is_running() {
            debug!("Quiz advance ignored in {:?}", self.phase());
            return;
        }

        self.timer.cancel();
        match self.cursor.advance(self.bank.len()) {
            Some(index) => self.activate(index, out),
            None => self.finish(out),
        }
    }

    fn activate(&mut self, index: usize, out: &dyn Transport) {
        let Some(question) = self.bank.get(index) else {
            return;
        };
        self.ledger.open(index);

        let mut answers = question.choices();
        answers.shuffle(&mut self.rng);

        let payload = QuizQuestionPayload {
            index,
            total: self.bank.len(),
            question: question.question.clone(),
            answers,
            time_limit: question.time,
            ends_at: Utc::now() + chrono::Duration::seconds(i64::from(question.time)),
        };
        self.timer
            .arm(index, Duration::from_secs(u64::from(question.time)));

        info!("Quiz question {}/{} active", index + 1, self.bank.len());
        publish(out, &Event::QuizQuestion(payload.clone()));
        self.active = Some(payload);
        publish(out, &Event::Scores(self.ranking()));
    }

    fn finish(&mut self, out: &dyn Transport) {
        self.active = None;
        let results = QuizResults {
            ranking: self.ranking(),
            question_ranking: tally::difficulty_ranking(&self.bank, &self.tallies),
        };

        info!("Quiz ended with {} ranked players", results.ranking.len());
        publish(out, &Event::QuizEnded(results));
    }

    /// Handles a countdown expiry posted by the timer task.
    pub fn on_timer(&mut self, question_index: usize, generation: u64, out: &dyn Transport) {
        if !self.timer.fire(generation) {
            debug!("Stale expiry for question {} ignored", question_index);
            return;
        }

        publish(out, &Event::QuestionTimeout {
            index: question_index,
        });
        self.advance(out);
    }

    pub fn join(&mut self, id: ConnectionId, name: &str, out: &dyn Transport) {
        let Some(player) = self.players.join_named(id, name) else {
            debug!("Blank quiz name from {} ignored", id);
            return;
        };
        let name = player.name.clone();

        reply(out, id, &Reply::Joined { name });
        publish(out, &Event::Players(self.player_list()));
    }

    pub fn submit(&mut self, id: ConnectionId, question_index: i64, raw: &Value, out: &dyn Transport) {
        let Some(index) = self.cursor.accepts(question_index) else {
            debug!("Answer for question {} from {} is not current", question_index, id);
            return;
        };
        if !self.players.contains(id) || self.ledger.has_answered(index, id) {
            debug!("Answer from {} for question {} dropped", id, index);
            return;
        }
        let (Some(question), Some(question_tally)) =
            (self.bank.get(index), self.tallies.get_mut(index))
        else {
            return;
        };

        match tally::fold(question, question_tally, raw) {
            Ok(correct) => {
                self.ledger.record(index, id);
                debug!("{} answers in for question {}", self.ledger.count(index), index);
                if correct {
                    if let Some(player) = self.players.get_mut(id) {
                        player.score += 1;
                    }
                }
                reply(out, id, &Reply::AnswerResult {
                    correct,
                    correct_answer: question.correct.clone(),
                });
                publish(out, &Event::Scores(self.ranking()));
            }
            Err(rejection) => reply(out, id, &Reply::AnswerRejected {
                reason: rejection.to_string(),
            }),
        }
    }

    /// Forgets a closed connection. Answers it already gave stay counted.
    pub fn disconnect(&mut self, id: ConnectionId, out: &dyn Transport) {
        if self.players.remove(id) {
            publish(out, &Event::Players(self.player_list()));
        }
    }

    /// Brings a newly opened connection up to date.
    pub fn greet(&self, id: ConnectionId, role: Role, out: &dyn Transport) {
        reply(out, id, &Reply::QuizStatus(self.status()));
        match role {
            Role::QuizAdmin => {
                deliver(out, id, &Event::Players(self.player_list()));
                self.deliver_ranking(id, out);
            }
            Role::Scoreboard => self.deliver_ranking(id, out),
            _ => {}
        }
    }

    fn deliver_ranking(&self, id: ConnectionId, out: &dyn Transport) {
        let ranking = self.ranking();
        if !ranking.is_empty() {
            deliver(out, id, &Event::Scores(ranking));
        }
    }

    pub fn status(&self) -> QuizStatus {
        QuizStatus {
            quiz_loaded: !self.bank.is_empty(),
            total_questions: self.bank.len(),
            quiz_in_progress: self.cursor.is_running(),
            current_question_index: self.cursor.wire_index(),
            current_question: self.active.clone(),
        }
    }

    pub fn ranking(&self) -> Vec<RankEntry> {
        tally::ranking(&self.players)
    }

    pub fn phase(&self) -> Phase {
        self.cursor.phase()
    }

    #[cfg(test)]
    pub fn tally(&self, index: usize) -> Option<QuestionTally> {
        self.tallies.get(index).copied()
    }

    fn player_list(&self) -> Vec<PlayerEntry> {
        self.players
            .iter()
            .map(|p| PlayerEntry {
                name: p.name.clone(),
                score: p.score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::Audience;
    use crate::broadcast::recorder::Recorder;
    use crate::commands::Command;
    use serde_json::json;
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use uuid::Uuid;

    fn session() -> (QuizSession, UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let quiz = QuizSession::with_rng(QuestionTimer::new(tx), StdRng::seed_from_u64(7));
        (quiz, rx)
    }

    fn arithmetic() -> Vec<QuizQuestion> {
        vec![QuizQuestion::new("2+2?", "4", &["3", "5"], 20)]
    }

    #[tokio::test]
    async fn scripted_round_ranks_players_and_questions() {
        let out = Recorder::default();
        let (mut quiz, _rx) = session();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        quiz.load(arithmetic(), &out);
        quiz.start(&out);
        quiz.join(a, "A", &out);
        quiz.join(b, "B", &out);
        quiz.submit(a, 0, &json!("4"), &out);
        quiz.submit(b, 0, &json!("3"), &out);
        quiz.advance(&out);

        assert_eq!(quiz.phase(), Phase::Ended);
        let ended = out.last(Audience::QuizEveryone, "quiz-ended").unwrap();
        assert_eq!(
            ended["ranking"],
            json!([
                {"rank": 1, "name": "A", "score": 1},
                {"rank": 2, "name": "B", "score": 0},
            ])
        );
        assert_eq!(ended["questionRanking"][0]["accuracy"], json!(0.5));
        assert_eq!(ended["questionRanking"][0]["total"], json!(2));
    }

    #[tokio::test]
    async fn answer_result_goes_only_to_submitter() {
        let out = Recorder::default();
        let (mut quiz, _rx) = session();
        let a = Uuid::new_v4();
        quiz.load(arithmetic(), &out);
        quiz.join(a, "A", &out);
        quiz.start(&out);
        out.clear();

        quiz.submit(a, 0, &json!("5"), &out);
        assert_eq!(
            out.replies_to(a),
            vec![(
                "answer-result".to_string(),
                json!({"correct": false, "correctAnswer": "4"})
            )]
        );
        assert_eq!(out.events_to(Audience::QuizScoreboards), vec!["scores"]);
    }

    #[tokio::test]
    async fn duplicate_and_stale_answers_are_dropped() {
        let out = Recorder::default();
        let (mut quiz, _rx) = session();
        let a = Uuid::new_v4();
        quiz.load(
            vec![
                QuizQuestion::new("1?", "a", &["b"], 10),
                QuizQuestion::new("2?", "c", &["d"], 10),
            ],
            &out,
        );
        quiz.join(a, "A", &out);
        quiz.start(&out);

        quiz.submit(a, 0, &json!("a"), &out);
        quiz.submit(a, 0, &json!("a"), &out);
        quiz.submit(a, 1, &json!("c"), &out);
        assert_eq!(quiz.tally(0), Some(QuestionTally { correct: 1, total: 1 }));
        assert_eq!(quiz.tally(1), Some(QuestionTally::default()));
        assert_eq!(quiz.ranking()[0].score, 1);
        assert_eq!(out.count("answer-result"), 1);
    }

    #[tokio::test]
    async fn unknown_answer_is_rejected_and_may_be_retried() {
        let out = Recorder::default();
        let (mut quiz, _rx) = session();
        let a = Uuid::new_v4();
        quiz.load(arithmetic(), &out);
        quiz.join(a, "A", &out);
        quiz.start(&out);

        quiz.submit(a, 0, &json!("22"), &out);
        assert_eq!(out.count("answer-rejected"), 1);
        assert_eq!(quiz.tally(0), Some(QuestionTally::default()));

        quiz.submit(a, 0, &json!("4"), &out);
        assert_eq!(quiz.tally(0), Some(QuestionTally { correct: 1, total: 1 }));
    }

    #[tokio::test]
    async fn unregistered_connections_cannot_answer() {
        let out = Recorder::default();
        let (mut quiz, _rx) = session();
        quiz.load(arithmetic(), &out);
        quiz.start(&out);

        quiz.submit(Uuid::new_v4(), 0, &json!("4"), &out);
        assert_eq!(quiz.tally(0), Some(QuestionTally::default()));
    }

    #[tokio::test]
    async fn question_payload_offers_every_choice_once() {
        let out = Recorder::default();
        let (mut quiz, _rx) = session();
        quiz.load(vec![QuizQuestion::new("Capital?", "Bern", &["Zurich", "", "Geneva"], 15)], &out);
        quiz.start(&out);

        let question = out.last(Audience::QuizPlayers, "question").unwrap();
        let mut answers: Vec<String> = serde_json::from_value(question["answers"].clone()).unwrap();
        answers.sort();
        assert_eq!(answers, vec!["Bern", "Geneva", "Zurich"]);
        assert_eq!(question["timeLimit"], json!(15));
        assert_eq!(question["total"], json!(1));
        assert_eq!(out.last(Audience::QuizAdmins, "question"), Some(question.clone()));
        assert_eq!(quiz.status().current_question.unwrap().index, 0);
    }

    #[tokio::test]
    async fn start_resets_scores_and_needs_a_bank() {
        let out = Recorder::default();
        let (mut quiz, _rx) = session();
        let a = Uuid::new_v4();

        quiz.start(&out);
        assert_eq!(quiz.phase(), Phase::Idle);
        assert_eq!(out.count("quiz-started"), 0);

        quiz.load(arithmetic(), &out);
        quiz.join(a, "A", &out);
        quiz.start(&out);
        quiz.submit(a, 0, &json!("4"), &out);
        quiz.advance(&out);
        assert_eq!(quiz.ranking()[0].score, 1);

        quiz.start(&out);
        assert_eq!(quiz.ranking()[0].score, 0);
        assert_eq!(quiz.phase(), Phase::QuestionActive(0));
        // already running
        quiz.start(&out);
        assert_eq!(out.count("quiz-started"), 2);
    }

    #[tokio::test]
    async fn ending_happens_exactly_once() {
        let out = Recorder::default();
        let (mut quiz, _rx) = session();
        quiz.load(arithmetic(), &out);
        quiz.start(&out);
        quiz.advance(&out);
        quiz.advance(&out);

        assert_eq!(out.count("quiz-ended"), 1);
        assert_eq!(quiz.status().current_question_index, -1);
        assert!(quiz.status().current_question.is_none());
    }

    #[tokio::test]
    async fn reload_discards_running_session() {
        let out = Recorder::default();
        let (mut quiz, _rx) = session();
        quiz.load(arithmetic(), &out);
        quiz.start(&out);
        quiz.load(arithmetic(), &out);

        let status = quiz.status();
        assert!(status.quiz_loaded);
        assert!(!status.quiz_in_progress);
        assert_eq!(quiz.phase(), Phase::Idle);
        assert_eq!(out.events_to(Audience::QuizAdmins).iter().filter(|e| *e == "quiz-loaded").count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_times_out_and_advances() {
        let out = Recorder::default();
        let (mut quiz, mut rx) = session();
        quiz.load(
            vec![
                QuizQuestion::new("1?", "a", &["b"], 5),
                QuizQuestion::new("2?", "c", &["d"], 5),
            ],
            &out,
        );
        quiz.start(&out);

        let Some(Command::QuizTimerExpired {
            question_index,
            generation,
        }) = rx.recv().await
        else {
            panic!("expected an expiry");
        };
        assert_eq!(question_index, 0);
        quiz.on_timer(question_index, generation, &out);
        // a second delivery of the same expiry is a no-op
        quiz.on_timer(question_index, generation, &out);

        assert_eq!(out.last(Audience::QuizPlayers, "question-timeout"), Some(json!({"index": 0})));
        assert_eq!(out.count("question-timeout"), 1);
        assert_eq!(quiz.phase(), Phase::QuestionActive(1));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_advance_cancels_pending_expiry() {
        let out = Recorder::default();
        let (mut quiz, mut rx) = session();
        quiz.load(
            vec![
                QuizQuestion::new("1?", "a", &["b"], 5),
                QuizQuestion::new("2?", "c", &["d"], 30),
            ],
            &out,
        );
        quiz.start(&out);
        quiz.advance(&out);

        let Some(Command::QuizTimerExpired { question_index, .. }) = rx.recv().await else {
            panic!("expected an expiry");
        };
        assert_eq!(question_index, 1);
    }

    #[tokio::test]
    async fn greeting_depends_on_role() {
        let out = Recorder::default();
        let (mut quiz, _rx) = session();
        let (admin, board, player) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        quiz.load(arithmetic(), &out);

        quiz.greet(board, Role::Scoreboard, &out);
        assert_eq!(out.replies_to(board).len(), 1);

        quiz.join(player, "P", &out);
        quiz.greet(admin, Role::QuizAdmin, &out);
        quiz.greet(board, Role::Scoreboard, &out);

        let admin_events: Vec<_> = out.replies_to(admin).into_iter().map(|(e, _)| e).collect();
        assert_eq!(admin_events, vec!["quiz-status", "players", "scores"]);
        let board_events: Vec<_> = out.replies_to(board).into_iter().map(|(e, _)| e).collect();
        assert_eq!(board_events, vec!["quiz-status", "quiz-status", "scores"]);
    }

    #[tokio::test]
    async fn disconnect_keeps_tally_but_leaves_ranking() {
        let out = Recorder::default();
        let (mut quiz, _rx) = session();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        quiz.load(arithmetic(), &out);
        quiz.join(a, "A", &out);
        quiz.join(b, "B", &out);
        quiz.start(&out);
        quiz.submit(a, 0, &json!("4"), &out);
        quiz.disconnect(a, &out);

        assert_eq!(quiz.tally(0), Some(QuestionTally { correct: 1, total: 1 }));
        assert_eq!(quiz.ranking().len(), 1);
        assert_eq!(out.last(Audience::QuizAdmins, "players"), Some(json!([{"name": "B", "score": 0}])));
    }

    #[tokio::test]
    async fn admin_joining_mid_quiz_sees_live_ranking() {
        let out = Recorder::default();
        let (mut quiz, _rx) = session();
        let (a, b, admin) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        quiz.load(arithmetic(), &out);
        quiz.join(a, "A", &out);
        quiz.join(b, "B", &out);
        quiz.start(&out);
        quiz.submit(b, 0, &json!("4"), &out);

        quiz.greet(admin, Role::QuizAdmin, &out);

        let replies = out.replies_to(admin);
        let events: Vec<_> = replies.iter().map(|(e, _)| e.as_str()).collect();
        assert_eq!(events, vec!["quiz-status", "players", "scores"]);
        assert_eq!(
            replies[2].1,
            json!([
                {"rank": 1, "name": "B", "score": 1},
                {"rank": 2, "name": "A", "score": 0},
            ])
        );
    }

    #[tokio::test]
    async fn rejoin_renames_and_resets_score() {
        let out = Recorder::default();
        let (mut quiz, _rx) = session();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        quiz.load(arithmetic(), &out);
        quiz.join(a, "A", &out);
        quiz.join(b, "B", &out);
        quiz.start(&out);
        quiz.submit(a, 0, &json!("4"), &out);

        quiz.join(a, "Alice", &out);

        let ranking = quiz.ranking();
        assert_eq!(ranking[0].name, "Alice");
        assert_eq!(ranking[0].score, 0);
        assert_eq!(ranking[1].name, "B");
        assert_eq!(out.replies_to(a).last().unwrap().1, json!({"name": "Alice"}));
    }
}
