//! Exam pages
//!
//! The exam lives in `ExamSessions` under the id carried by the
//! `lyceum_session` cookie. The cookie is issued when an exam starts.
//!
//! - GET|POST /exam_system (topic)      pick a topic and start
//! - GET|POST /take_exam   (action)     show / answer the current question
//! - GET      /exam_result              score and verdict

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::header::{HeaderValue, SET_COOKIE};
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use super::form::{cookie, read_form};
use super::render::{escape, html, html_with_status, page, redirect, topic_select};
use crate::quiz::{ExamSessions, ExamState};
use crate::server::AppState;
use crate::types::{LyceumError, Result};

#[derive(Debug, Deserialize)]
pub struct ExamStartForm {
    pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerForm {
    /// `correct` or `incorrect`
    pub action: String,
}

/// Cookie carrying the exam session id
pub const SESSION_COOKIE: &str = "lyceum_session";

fn exam_form(state: &AppState) -> String {
    format!(
        "<form method=\"post\"><label for=\"topic\">Choose a topic:</label>{}\
         <button>Start Exam</button></form>",
        topic_select(state.content.areas())
    )
}

/// GET /exam_system
pub fn exam_system_index(state: &AppState) -> Response<Full<Bytes>> {
    html(page("Exam System", &exam_form(state)))
}

/// POST /exam_system
pub async fn exam_system_submit<B>(
    state: Arc<AppState>,
    req: Request<B>,
) -> Result<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let existing = cookie(req.headers(), SESSION_COOKIE);
    let ExamStartForm { topic } = read_form(req).await?;

    let session_id = existing
        .clone()
        .unwrap_or_else(ExamSessions::new_session_id);

    let exam = match state
        .exams
        .start(&session_id, &state.store.taxonomy, &topic)
    {
        Ok(exam) => exam,
        Err(LyceumError::UnknownTopic(_)) => {
            let body = format!(
                "<p>Unknown topic {}</p>{}",
                escape(&topic),
                exam_form(&state)
            );
            return Ok(html_with_status(
                StatusCode::NOT_FOUND,
                page("Exam System", &body),
            ));
        }
        Err(e) => return Err(e),
    };

    if !exam.pass_reachable() {
        warn!(
            topic = %topic,
            questions = exam.questions().len(),
            "Exam topic has too few rules to pass"
        );
    }

    let mut response = redirect("/take_exam");
    if existing.is_none() {
        let value = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, session_id);
        if let Ok(value) = HeaderValue::from_str(&value) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    Ok(response)
}

fn session_id<B>(req: &Request<B>) -> Result<String> {
    cookie(req.headers(), SESSION_COOKIE).ok_or(LyceumError::NoExamSession)
}

fn question_page(question: &str, number: usize, total: usize) -> Response<Full<Bytes>> {
    let body = format!(
        "<p>Question {} of {}: {}</p>\n<form method=\"post\">\
         <button name=\"action\" value=\"correct\">Correct</button>\
         <button name=\"action\" value=\"incorrect\">Incorrect</button></form>",
        number,
        total,
        escape(question)
    );
    html(page("Exam System", &body))
}

/// GET /take_exam
pub fn take_exam_show<B>(state: &AppState, req: &Request<B>) -> Result<Response<Full<Bytes>>> {
    let id = session_id(req)?;
    let exam = state.exams.get(&id).ok_or(LyceumError::NoExamSession)?;

    match (exam.state(), exam.current_question()) {
        (ExamState::InProgress, Some(question)) => Ok(question_page(
            question,
            exam.index() + 1,
            exam.questions().len(),
        )),
        (ExamState::Finished, _) => Ok(redirect("/exam_result")),
        _ => Ok(redirect("/exam_system")),
    }
}

/// POST /take_exam
pub async fn take_exam_answer<B>(
    state: Arc<AppState>,
    req: Request<B>,
) -> Result<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let id = session_id(&req)?;
    let AnswerForm { action } = read_form(req).await?;
    let is_correct = action == "correct";

    let exam = state.exams.answer(&id, is_correct)?;
    match exam.current_question() {
        Some(question) if exam.state() == ExamState::InProgress => Ok(question_page(
            question,
            exam.index() + 1,
            exam.questions().len(),
        )),
        _ => Ok(redirect("/exam_result")),
    }
}

/// GET /exam_result
pub fn exam_result<B>(state: &AppState, req: &Request<B>) -> Result<Response<Full<Bytes>>> {
    let id = session_id(req)?;
    let result = state.exams.result(&id)?;

    let body = format!(
        "<p>Your score: {}</p>\n<p>Result: {}</p>\n<a href=\"/exam_system\">Back to Exam System</a>",
        result.score, result.verdict
    );
    Ok(html(page("Exam Result", &body)))
}
