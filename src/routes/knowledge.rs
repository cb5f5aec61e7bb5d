//! Knowledge base, research and learn pages
//!
//! - GET  /                               section list
//! - GET  /knowledge_base                 topic picker
//! - POST /knowledge_base  (function)     branches + rules of a topic
//! - POST /branch          (branch)       rules of a branch
//! - POST /post_research   (branch)       note composer
//! - POST /publish_research (branch, research_content)
//! - GET  /explore_system                 topic/branch tree
//! - GET  /view_research/{area}, /view_branch_research/{branch}
//! - GET|POST /learn_system (topic)       one random rule

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::form::read_form;
use super::render::{
    button_form, escape, hidden, html, html_with_status, list, page, title_case, topic_select,
};
use crate::server::AppState;
use crate::types::{LyceumError, Result};

#[derive(Debug, Deserialize)]
pub struct KnowledgeBaseForm {
    pub function: String,
}

/// Used by both /branch and /post_research
#[derive(Debug, Deserialize)]
pub struct BranchForm {
    pub branch: String,
}

#[derive(Debug, Deserialize)]
pub struct PublishResearchForm {
    pub branch: String,
    pub research_content: String,
}

#[derive(Debug, Deserialize)]
pub struct LearnForm {
    pub topic: String,
    /// `master` or `forget`, logged only
    pub action: Option<String>,
}

/// Sections linked from the home page
pub const SECTIONS: [&str; 6] = [
    "knowledge_base",
    "explore_system",
    "learn_system",
    "exam_system",
    "function1",
    "function2",
];

/// GET /
pub fn home() -> Response<Full<Bytes>> {
    let links: String = SECTIONS
        .iter()
        .map(|s| format!("<a href=\"/{}\">{}</a><br>\n", s, escape(&title_case(s))))
        .collect();
    html(page("Welcome", &links))
}

/// GET /knowledge_base
pub fn knowledge_base_index(state: &AppState) -> Response<Full<Bytes>> {
    let buttons: String = state
        .content
        .functions()
        .iter()
        .map(|f| {
            format!(
                "<button name=\"function\" value=\"{0}\">{0}</button>",
                escape(f)
            )
        })
        .collect();
    html(page(
        "Knowledge Base",
        &format!("<form method=\"post\">{}</form>", buttons),
    ))
}

/// POST /knowledge_base
pub async fn knowledge_base_submit<B>(
    state: Arc<AppState>,
    req: Request<B>,
) -> Result<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let KnowledgeBaseForm { function: topic } = read_form(req).await?;
    let view = state.content.topic(&topic);

    let branches: String = view
        .branches
        .iter()
        .map(|b| button_form("/branch", "branch", b))
        .collect();
    let body = format!(
        "{}\n{}\n{}",
        branches,
        list(&view.rules),
        post_research_button(&topic)
    );
    Ok(html(page(&topic, &body)))
}

/// POST /branch
pub async fn branch<B>(state: Arc<AppState>, req: Request<B>) -> Result<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let BranchForm { branch } = read_form(req).await?;
    let rules = state.content.rules_for(&branch);

    let body = format!("{}\n{}", list(&rules), post_research_button(&branch));
    Ok(html(page(&branch, &body)))
}

fn post_research_button(branch: &str) -> String {
    format!(
        "<form method=\"post\" action=\"/post_research\">{}<button>Post Research</button></form>",
        hidden("branch", branch)
    )
}

/// POST /post_research
pub async fn post_research<B>(req: Request<B>) -> Result<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let BranchForm { branch } = read_form(req).await?;

    let body = format!(
        "<form method=\"post\" action=\"/publish_research\">{}\
         <textarea name=\"research_content\" rows=\"10\" cols=\"50\" \
         placeholder=\"Write your research here...\"></textarea><br>\
         <button>Publish</button></form>",
        hidden("branch", &branch)
    );
    Ok(html(page(&format!("Post Research in {}", branch), &body)))
}

/// POST /publish_research
pub async fn publish_research<B>(
    state: Arc<AppState>,
    req: Request<B>,
) -> Result<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let PublishResearchForm {
        branch,
        research_content: content,
    } = read_form(req).await?;

    state.content.publish(&branch, &content);

    let body = format!(
        "<p>{}</p>\n<a href=\"/explore_system\">Explore System</a>",
        escape(&content)
    );
    Ok(html(page(&format!("Research Published in {}", branch), &body)))
}

/// GET /explore_system
pub fn explore_system(state: &AppState) -> Response<Full<Bytes>> {
    let mut body = String::from("<ul>");
    for area in state.content.areas() {
        body.push_str(&format!(
            "<li><a href=\"/view_research/{}\">{}</a><ul>",
            urlencoding::encode(&area.name),
            escape(&area.name)
        ));
        for branch in &area.branches {
            body.push_str(&format!(
                "<li><a href=\"/view_branch_research/{}\">{}</a></li>",
                urlencoding::encode(branch),
                escape(branch)
            ));
        }
        body.push_str("</ul></li>");
    }
    body.push_str("</ul>");
    html(page("Explore System", &body))
}

/// GET /view_research/{area} and /view_branch_research/{branch}
pub fn view_research(state: &AppState, topic: &str) -> Response<Full<Bytes>> {
    let notes = state.content.notes_for(topic);
    let body = format!(
        "{}\n<a href=\"/explore_system\">Back to Explore System</a>",
        list(&notes)
    );
    html(page(&format!("Research in {}", topic), &body))
}

/// GET /learn_system
pub fn learn_system_index(state: &AppState) -> Response<Full<Bytes>> {
    html(page("Learn System", &learn_form(state)))
}

fn learn_form(state: &AppState) -> String {
    format!(
        "<form method=\"post\"><label for=\"topic\">Choose a topic:</label>{}\
         <button>Start Learning</button></form>",
        topic_select(state.content.areas())
    )
}

/// POST /learn_system
pub async fn learn_system_submit<B>(
    state: Arc<AppState>,
    req: Request<B>,
) -> Result<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let LearnForm { topic, action } = read_form(req).await?;

    if let Some(action) = action {
        info!(topic = %topic, action = %action, "Learn feedback");
    }

    let rule = match state.content.random_rule(&topic) {
        Ok(rule) => rule,
        Err(LyceumError::UnknownTopic(_)) => {
            let body = format!(
                "<p>No rules for topic {}</p>{}",
                escape(&topic),
                learn_form(&state)
            );
            return Ok(html_with_status(
                StatusCode::NOT_FOUND,
                page("Learn System", &body),
            ));
        }
        Err(e) => return Err(e),
    };

    let body = format!(
        "<p>Topic: {}</p>\n<p>Rule: {}</p>\n\
         <form method=\"post\" action=\"/learn_system\">{}\
         <button name=\"action\" value=\"master\">Master</button>\
         <button name=\"action\" value=\"forget\">Forget</button></form>",
        escape(&topic),
        escape(&rule),
        hidden("topic", &topic)
    );
    Ok(html(page("Learn System", &body)))
}
