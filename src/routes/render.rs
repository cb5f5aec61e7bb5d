//! HTML page helpers
//!
//! Pages are plain strings. Every piece of user-supplied text goes through
//! `escape` before it lands in markup.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

use crate::types::LyceumError;

/// Escape text for HTML element and attribute content
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// `snake_case` section name to a title, e.g. `knowledge_base` -> `Knowledge Base`
pub fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wrap a body fragment in a page with a home link
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n<a href=\"/\">Home</a>\n<h1>{title}</h1>\n{body}\n</body></html>\n",
        title = escape(title),
        body = body
    )
}

/// `<ul>` of escaped items
pub fn list(items: &[String]) -> String {
    let mut out = String::from("<ul>");
    for item in items {
        out.push_str("<li>");
        out.push_str(&escape(item));
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

/// Single-button POST form carrying one named value
pub fn button_form(action: &str, name: &str, value: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{action}\"><button name=\"{name}\" value=\"{value}\">{label}</button></form>",
        action = escape(action),
        name = escape(name),
        value = escape(value),
        label = escape(value),
    )
}

/// Hidden input
pub fn hidden(name: &str, value: &str) -> String {
    format!(
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
        escape(name),
        escape(value)
    )
}

/// Topic `<select>` listing each area followed by its branches
pub fn topic_select(areas: &[crate::store::KnowledgeArea]) -> String {
    let mut out = String::from("<select id=\"topic\" name=\"topic\">");
    for area in areas {
        out.push_str(&format!(
            "<option value=\"{0}\">{0}</option>",
            escape(&area.name)
        ));
        for branch in &area.branches {
            out.push_str(&format!(
                "<option value=\"{0}\">-- {0}</option>",
                escape(branch)
            ));
        }
    }
    out.push_str("</select>");
    out
}

/// 200 HTML response
pub fn html(body: String) -> Response<Full<Bytes>> {
    html_with_status(StatusCode::OK, body)
}

pub fn html_with_status(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// 303 redirect
pub fn redirect(location: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header("Location", location)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Error page with the status mapped from the error
pub fn error_response(err: &LyceumError) -> Response<Full<Bytes>> {
    if matches!(err, LyceumError::NoExamSession) {
        return redirect("/exam_system");
    }
    let status = err.status_code();
    let title = status.canonical_reason().unwrap_or("Error");
    html_with_status(
        status,
        page(title, &format!("<p>{}</p>", escape(&err.to_string()))),
    )
}

pub fn not_found(path: &str) -> Response<Full<Bytes>> {
    html_with_status(
        StatusCode::NOT_FOUND,
        page(
            "Not Found",
            &format!("<p>No page at {}</p>", escape(path)),
        ),
    )
}

pub fn method_not_allowed(path: &str) -> Response<Full<Bytes>> {
    html_with_status(
        StatusCode::METHOD_NOT_ALLOWED,
        page(
            "Method Not Allowed",
            &format!("<p>{} does not accept this method</p>", escape(path)),
        ),
    )
}
