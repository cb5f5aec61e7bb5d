//! Chat and payment pages
//!
//! - GET  /function1                  uid prompt
//! - POST /function1 (uid)            chat view for room `uid`
//! - POST /function1 (uid, amount)    pay `amount` to `uid`, then chat view
//! - GET  /function2                  placeholder
//!
//! The chat view talks to `/socket` with the JSON events described in
//! `relay::protocol`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response};
use serde::Deserialize;
use std::sync::Arc;

use super::form::read_form;
use super::render::{escape, hidden, html, list, page};
use crate::relay::Payment;
use crate::server::AppState;
use crate::types::Result;

/// Chat form; `amount` present means a payment
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub uid: String,
    pub amount: Option<String>,
}

/// GET /function1
pub fn social_index() -> Response<Full<Bytes>> {
    let body = "<form method=\"post\"><label for=\"uid\">Enter UID:</label>\
                <input type=\"text\" id=\"uid\" name=\"uid\" required>\
                <button>Start</button></form>";
    html(page("Social System", body))
}

/// POST /function1
pub async fn social_submit<B>(state: Arc<AppState>, req: Request<B>) -> Result<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let PaymentForm { uid, amount } = read_form(req).await?;

    let payment = match amount {
        Some(raw) => Some(state.relay.pay(&uid, &raw)?),
        None => None,
    };

    Ok(html(chat_page(&state, &uid, payment.as_ref())))
}

fn chat_page(state: &AppState, uid: &str, payment: Option<&Payment>) -> String {
    let history = state.relay.history(uid);
    let notice = payment
        .map(|p| {
            format!(
                "<p>Payment Successful: You have sent {} to {}.</p>",
                escape(&p.entry),
                escape(&p.uid)
            )
        })
        .unwrap_or_default();
    let uid_json = serde_json::to_string(uid).unwrap_or_else(|_| "\"\"".to_string());

    let body = format!(
        r#"<div id="chat">{history}</div>
<label for="message">Message:</label>
<input id="message" autocomplete="off"><button onclick="sendMessage()">Send</button>
<form method="post">{uid_input}
<label for="amount">Amount:</label>
<input type="number" step="any" id="amount" name="amount" required>
<button>Pay</button></form>
{notice}
<script>
  var uid = {uid_json};
  var scheme = location.protocol === "https:" ? "wss://" : "ws://";
  var socket = new WebSocket(scheme + location.host + "/socket");
  socket.onopen = function () {{
    socket.send(JSON.stringify({{event: "join", room: uid}}));
  }};
  socket.onmessage = function (e) {{
    var data = JSON.parse(e.data);
    if (data.event !== "message") return;
    var li = document.createElement("li");
    li.appendChild(document.createTextNode(data.msg));
    document.getElementById("messages").appendChild(li);
  }};
  function sendMessage() {{
    var input = document.getElementById("message");
    socket.send(JSON.stringify({{event: "message", uid: uid, msg: input.value}}));
    input.value = "";
  }}
</script>"#,
        history = list(&history).replacen("<ul>", "<ul id=\"messages\">", 1),
        uid_input = hidden("uid", uid),
        notice = notice,
        uid_json = uid_json.replace("</", "<\\/"),
    );

    page(&format!("Chat with {}", uid), &body)
}

/// GET /function2
pub fn placeholder() -> Response<Full<Bytes>> {
    html(page(
        "Empty Function",
        "<p>This function is currently empty.</p>",
    ))
}
