//! Request body and header extraction
//!
//! Route handlers decode `application/x-www-form-urlencoded` bodies straight
//! into their own `#[derive(Deserialize)]` form structs. A missing field is
//! reported by name as `LyceumError::MissingField`.

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{HeaderMap, COOKIE};
use hyper::Request;
use serde::de::DeserializeOwned;

use crate::types::{LyceumError, Result};

/// Largest form body accepted
pub const MAX_FORM_BYTES: usize = 64 * 1024;

/// Decode a urlencoded body into `T`
pub fn parse_form<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_urlencoded::from_bytes(body).map_err(|e| form_error(e.to_string()))
}

// serde reports absent struct fields as "missing field `name`"
fn form_error(message: String) -> LyceumError {
    match message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.strip_suffix('`'))
    {
        Some(field) => LyceumError::MissingField(field.to_string()),
        None => LyceumError::InvalidForm(message),
    }
}

/// Collect and decode the body of a form POST
pub async fn read_form<T, B>(req: Request<B>) -> Result<T>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = collect_body(req).await?;
    parse_form(&body)
}

async fn collect_body<B>(req: Request<B>) -> Result<Bytes>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = Limited::new(req.into_body(), MAX_FORM_BYTES);
    match body.collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(LyceumError::InvalidForm("body too large".to_string()))
        }
        Err(e) => Err(LyceumError::InvalidForm(format!(
            "failed to read body: {}",
            e
        ))),
    }
}

/// Value of a cookie from the request headers
pub fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Percent-decode one path segment
pub fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}
