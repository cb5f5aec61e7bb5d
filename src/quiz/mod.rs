//! Quiz engine
//!
//! An exam samples up to five rules of a topic as questions, the learner marks
//! each one correct or incorrect, and the final score decides pass or fail.
//!
//! ```text
//! NotStarted --start--> InProgress --answer x N--> Finished
//!      ^                                              |
//!      +-------------- start (overwrites) ------------+
//! ```
//!
//! Scoring is fixed: 20 points per correct answer, pass at 80. A topic with
//! fewer than four rules therefore can never pass; `Exam::max_score` exposes
//! the reachable maximum so callers can warn about it.

pub mod session;

pub use session::{spawn_cleanup_task, ExamSessions, ExamSessionStats};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::fmt;

use crate::store::Taxonomy;
use crate::types::{LyceumError, Result};

/// Maximum number of questions drawn for one exam
pub const QUESTIONS_PER_EXAM: usize = 5;

/// Points awarded per correct answer
pub const POINTS_PER_CORRECT: u32 = 20;

/// Minimum score that passes
pub const PASS_THRESHOLD: u32 = 80;

/// Lifecycle of an exam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExamState {
    NotStarted,
    InProgress,
    Finished,
}

/// Pass/fail outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn from_score(score: u32) -> Self {
        if score >= PASS_THRESHOLD {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "Pass"),
            Verdict::Fail => write!(f, "Fail"),
        }
    }
}

/// Final score of a finished exam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExamResult {
    pub score: u32,
    pub verdict: Verdict,
}

/// One learner's exam
#[derive(Debug, Clone, Default)]
pub struct Exam {
    topic: Option<String>,
    questions: Vec<String>,
    index: usize,
    score: u32,
}

impl Exam {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) an exam on `topic` using the thread RNG
    pub fn start(&mut self, taxonomy: &Taxonomy, topic: &str) -> Result<()> {
        self.start_with_rng(taxonomy, topic, &mut rand::thread_rng())
    }

    /// Start (or restart) an exam on `topic`.
    ///
    /// Draws `min(5, available)` distinct rules in random order. Fails with
    /// `UnknownTopic` when the rules table has no entry for `topic`; the
    /// current exam is left untouched in that case.
    pub fn start_with_rng<R: Rng + ?Sized>(
        &mut self,
        taxonomy: &Taxonomy,
        topic: &str,
        rng: &mut R,
    ) -> Result<()> {
        if !taxonomy.has_rules(topic) {
            return Err(LyceumError::UnknownTopic(topic.to_string()));
        }

        let mut questions = taxonomy.rules_for(topic).to_vec();
        questions.shuffle(rng);
        questions.truncate(QUESTIONS_PER_EXAM);

        *self = Self {
            topic: Some(topic.to_string()),
            questions,
            index: 0,
            score: 0,
        };
        Ok(())
    }

    pub fn state(&self) -> ExamState {
        match self.topic {
            None => ExamState::NotStarted,
            Some(_) if self.index < self.questions.len() => ExamState::InProgress,
            Some(_) => ExamState::Finished,
        }
    }

    /// Record the answer to the current question and advance
    pub fn answer(&mut self, is_correct: bool) -> Result<ExamState> {
        if self.state() != ExamState::InProgress {
            return Err(LyceumError::ExamNotInProgress);
        }

        if is_correct {
            self.score += POINTS_PER_CORRECT;
        }
        self.index += 1;
        Ok(self.state())
    }

    /// Score and verdict, available once every question is answered
    pub fn result(&self) -> Result<ExamResult> {
        if self.state() != ExamState::Finished {
            return Err(LyceumError::ExamNotFinished);
        }
        Ok(ExamResult {
            score: self.score,
            verdict: Verdict::from_score(self.score),
        })
    }

    /// Question awaiting an answer
    pub fn current_question(&self) -> Option<&str> {
        self.questions.get(self.index).map(String::as_str)
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    /// Zero-based position of the current question
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Best score reachable with this question count
    pub fn max_score(&self) -> u32 {
        self.questions.len() as u32 * POINTS_PER_CORRECT
    }

    /// Whether a perfect run would pass
    pub fn pass_reachable(&self) -> bool {
        Verdict::from_score(self.max_score()) == Verdict::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KnowledgeArea;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};

    fn started(topic: &str) -> Exam {
        let mut exam = Exam::new();
        exam.start(&Taxonomy::builtin(), topic).unwrap();
        exam
    }

    fn run(exam: &mut Exam, answers: &[bool]) -> ExamResult {
        for &a in answers {
            exam.answer(a).unwrap();
        }
        exam.result().unwrap()
    }

    #[test]
    fn test_five_questions_drawn_without_replacement() {
        let exam = started("algebra");
        assert_eq!(exam.questions().len(), 5);
        assert_eq!(exam.state(), ExamState::InProgress);

        let unique: HashSet<_> = exam.questions().iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_at_most_five_questions() {
        // calculus has six rules
        let exam = started("calculus");
        assert_eq!(exam.questions().len(), QUESTIONS_PER_EXAM);
    }

    #[test]
    fn test_all_correct_passes() {
        let mut exam = started("algebra");
        let result = run(&mut exam, &[true; 5]);
        assert_eq!(result.score, 100);
        assert_eq!(result.verdict, Verdict::Pass);
    }

    #[test]
    fn test_all_wrong_fails() {
        let mut exam = started("algebra");
        let result = run(&mut exam, &[false; 5]);
        assert_eq!(result.score, 0);
        assert_eq!(result.verdict, Verdict::Fail);
    }

    #[test]
    fn test_eighty_is_pass() {
        let mut exam = started("algebra");
        let result = run(&mut exam, &[true, true, false, true, true]);
        assert_eq!(result.score, 80);
        assert_eq!(result.verdict, Verdict::Pass);
    }

    #[test]
    fn test_three_rules_can_never_pass() {
        let mut exam = started("geometry");
        assert_eq!(exam.questions().len(), 3);
        assert_eq!(exam.max_score(), 60);
        assert!(!exam.pass_reachable());

        let result = run(&mut exam, &[true; 3]);
        assert_eq!(result.score, 60);
        assert_eq!(result.verdict, Verdict::Fail);
    }

    #[test]
    fn test_unknown_topic_leaves_exam_untouched() {
        let mut exam = started("algebra");
        exam.answer(true).unwrap();

        let err = exam.start(&Taxonomy::builtin(), "ghost").unwrap_err();
        assert!(matches!(err, LyceumError::UnknownTopic(_)));
        assert_eq!(exam.topic(), Some("algebra"));
        assert_eq!(exam.score(), 20);
    }

    #[test]
    fn test_restart_overwrites() {
        let mut exam = started("algebra");
        run(&mut exam, &[true; 5]);

        exam.start(&Taxonomy::builtin(), "physics").unwrap();
        assert_eq!(exam.state(), ExamState::InProgress);
        assert_eq!(exam.index(), 0);
        assert_eq!(exam.score(), 0);
        assert_eq!(exam.topic(), Some("physics"));
    }

    #[test]
    fn test_state_errors() {
        let mut exam = Exam::new();
        assert_eq!(exam.state(), ExamState::NotStarted);
        assert!(matches!(exam.answer(true), Err(LyceumError::ExamNotInProgress)));
        assert!(matches!(exam.result(), Err(LyceumError::ExamNotFinished)));

        let mut exam = started("algebra");
        exam.answer(true).unwrap();
        assert!(matches!(exam.result(), Err(LyceumError::ExamNotFinished)));

        run(&mut exam, &[true; 4]);
        assert!(matches!(exam.answer(true), Err(LyceumError::ExamNotInProgress)));
    }

    #[test]
    fn test_empty_rule_set_finishes_immediately() {
        let mut rules = HashMap::new();
        rules.insert("empty".to_string(), Vec::new());
        let taxonomy = Taxonomy::new(
            vec![KnowledgeArea {
                name: "empty".to_string(),
                branches: Vec::new(),
            }],
            rules,
        );

        let mut exam = Exam::new();
        exam.start(&taxonomy, "empty").unwrap();
        assert_eq!(exam.state(), ExamState::Finished);
        assert_eq!(exam.result().unwrap().score, 0);
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let taxonomy = Taxonomy::builtin();
        let mut a = Exam::new();
        let mut b = Exam::new();
        a.start_with_rng(&taxonomy, "calculus", &mut StdRng::seed_from_u64(7))
            .unwrap();
        b.start_with_rng(&taxonomy, "calculus", &mut StdRng::seed_from_u64(7))
            .unwrap();
        assert_eq!(a.questions(), b.questions());
    }
}
