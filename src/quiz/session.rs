//! Exam session store
//!
//! Keeps one `Exam` per browser session, keyed by the session cookie value.
//! Sessions expire after a period of inactivity and are swept by a background
//! task.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{Exam, ExamResult, ExamState};
use crate::store::Taxonomy;
use crate::types::{LyceumError, Result};

struct SessionEntry {
    exam: Exam,
    expires_at: Instant,
}

impl SessionEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory exam sessions with idle expiry
pub struct ExamSessions {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
}

impl ExamSessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Fresh random session identifier
    pub fn new_session_id() -> String {
        format!("sess_{}", uuid::Uuid::new_v4())
    }

    /// Start or restart the exam for a session
    pub fn start(&self, session_id: &str, taxonomy: &Taxonomy, topic: &str) -> Result<Exam> {
        let mut exam = Exam::new();
        exam.start(taxonomy, topic)?;

        self.sessions.insert(
            session_id.to_string(),
            SessionEntry {
                exam: exam.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        info!(
            session = %session_id,
            topic = %topic,
            questions = exam.questions().len(),
            "Exam started"
        );
        Ok(exam)
    }

    /// Answer the current question of a session's exam
    pub fn answer(&self, session_id: &str, is_correct: bool) -> Result<Exam> {
        self.with_exam(session_id, |exam| {
            let state = exam.answer(is_correct)?;
            debug!(
                session = %session_id,
                correct = is_correct,
                score = exam.score(),
                ?state,
                "Exam answer recorded"
            );
            Ok(exam.clone())
        })
    }

    /// Result of a finished exam
    pub fn result(&self, session_id: &str) -> Result<ExamResult> {
        self.with_exam(session_id, |exam| exam.result())
    }

    /// Snapshot of the session's exam
    pub fn get(&self, session_id: &str) -> Option<Exam> {
        self.with_exam(session_id, |exam| Ok(exam.clone())).ok()
    }

    /// Run `f` against a live session, refreshing its expiry
    fn with_exam<T>(&self, session_id: &str, f: impl FnOnce(&mut Exam) -> Result<T>) -> Result<T> {
        let now = Instant::now();
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or(LyceumError::NoExamSession)?;

        if entry.is_expired(now) {
            drop(entry);
            self.sessions.remove(session_id);
            debug!(session = %session_id, "Exam session expired");
            return Err(LyceumError::NoExamSession);
        }

        entry.expires_at = now + self.ttl;
        f(&mut entry.exam)
    }

    pub fn remove(&self, session_id: &str) {
        if self.sessions.remove(session_id).is_some() {
            debug!(session = %session_id, "Exam session removed");
        }
    }

    /// Drop expired sessions, returning how many were removed
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.sessions.len())
    }

    pub fn stats(&self) -> ExamSessionStats {
        let now = Instant::now();
        let mut stats = ExamSessionStats::default();
        for entry in self.sessions.iter() {
            stats.total_sessions += 1;
            if entry.is_expired(now) {
                stats.expired_sessions += 1;
            } else if entry.exam.state() == ExamState::InProgress {
                stats.in_progress += 1;
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for ExamSessions {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

/// Exam session statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExamSessionStats {
    pub total_sessions: usize,
    pub expired_sessions: usize,
    pub in_progress: usize,
}

/// Spawn a background task that periodically drops expired sessions
pub fn spawn_cleanup_task(sessions: Arc<ExamSessions>, interval: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let removed = sessions.cleanup();
            if removed > 0 {
                debug!("Exam session cleanup: removed {} expired sessions", removed);
            }
        }
    });
    info!("Exam session cleanup task started");
}
