//! Form submission handler
//!
//! `POST /process` takes a JSON object and answers with a fixed confirmation
//! message plus the caller's `name` and `email` values, copied verbatim.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::AppState;
use crate::http;
use crate::logger;

pub const PROCESS_PATH: &str = "/process";
pub const CONFIRMATION_MESSAGE: &str = "Data received successfully";

/// Body of a successful `/process` response
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ProcessResponse {
    pub message: &'static str,
    pub name: Value,
    pub email: Value,
}

/// Reasons a submission is turned away before it reaches `echo_fields`
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("request body must be JSON, got content type {}", .0.as_deref().unwrap_or("(none)"))]
    UnsupportedMediaType(Option<String>),

    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("failed to read request body: {0}")]
    Read(String),

    #[error("request body is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("request body must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

impl PayloadError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Read(_) | Self::Malformed(_) | Self::NotAnObject(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Copy `name` and `email` out of the payload; a missing key becomes `null`
pub fn echo_fields(payload: &Map<String, Value>) -> ProcessResponse {
    let field = |key: &str| payload.get(key).cloned().unwrap_or(Value::Null);

    ProcessResponse {
        message: CONFIRMATION_MESSAGE,
        name: field("name"),
        email: field("email"),
    }
}

/// `application/json` or any `application/*+json` type, parameters ignored
pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    let Some(value) = content_type else {
        return false;
    };
    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// Check the media type, then decode the body as a JSON object
pub fn parse_payload(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Map<String, Value>, PayloadError> {
    if !is_json_content_type(content_type) {
        return Err(PayloadError::UnsupportedMediaType(
            content_type.map(ToString::to_string),
        ));
    }

    match serde_json::from_slice::<Value>(body)? {
        Value::Object(map) => Ok(map),
        other => Err(PayloadError::NotAnObject(json_kind(&other))),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Handle `POST /process`
pub async fn handle_process<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match read_payload(req, state.config.http.max_body_size).await {
        Ok(payload) => {
            let response = echo_fields(&payload);
            logger::debug(&format!(
                "Processed submission: name={}, email={}",
                response.name, response.email
            ));
            http::json_response(StatusCode::OK, &response)
        }
        Err(e) => {
            logger::warn(&format!("Rejected {PROCESS_PATH} request: {e}"));
            http::build_error_response(e.status(), &e.to_string())
        }
    }
}

/// Read the whole body (bounded by `max_body_size`) and parse it
async fn read_payload<B>(
    req: Request<B>,
    max_body_size: u64,
) -> Result<Map<String, Value>, PayloadError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let too_large = PayloadError::TooLarge {
        limit: max_body_size,
    };

    // Reject on the declared length before reading anything
    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|size| size > max_body_size) {
        return Err(too_large);
    }

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => return Err(too_large),
        Err(e) => return Err(PayloadError::Read(e.to_string())),
    };

    parse_payload(content_type.as_deref(), &body)
}
