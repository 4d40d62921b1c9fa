//! HTTP response building module
//!
//! Provides builders for the status codes this service answers with, decoupled from request handling.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE, SERVER};
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::logger;

/// Build JSON response from any serializable body
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            logger::error(&format!("Failed to serialize response: {e}"));
            return build_error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build JSON error response: `{"error": "...", "status": 400}`
pub fn build_error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": message,
        "status": status.as_u16(),
    });

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from(message.to_string())))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_error_response(StatusCode::NOT_FOUND, "Not Found")
}

/// Build 405 Method Not Allowed response listing the accepted methods
pub fn build_405_response(allow: &'static str) -> Response<Full<Bytes>> {
    let mut response = build_error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}

/// Build health check response
pub fn build_health_response(status: StatusCode, state: &str) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "status": state }))
}

/// Stamp the `Server` header on an outgoing response
pub fn set_server_header(response: &mut Response<Full<Bytes>>, server_name: &str) {
    match HeaderValue::from_str(server_name) {
        Ok(value) => {
            response.headers_mut().insert(SERVER, value);
        }
        Err(e) => log_build_error("Server header", &e),
    }
}

/// Log response build error
fn log_build_error(what: &str, error: &impl std::fmt::Display) {
    logger::error(&format!("Failed to build {what} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_response_body() {
        let response = build_error_response(StatusCode::BAD_REQUEST, "bad input");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({"error": "bad input", "status": 400}));
    }

    #[test]
    fn test_405_has_allow_header() {
        let response = build_405_response("POST");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "POST");
    }

    #[tokio::test]
    async fn test_health_response() {
        let response = build_health_response(StatusCode::SERVICE_UNAVAILABLE, "draining");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["status"], "draining");
    }

    #[test]
    fn test_server_header() {
        let mut response = build_404_response();
        set_server_header(&mut response, "formecho");
        assert_eq!(response.headers()[SERVER], "formecho");

        // Invalid header values are skipped rather than panicking
        let mut response = build_404_response();
        set_server_header(&mut response, "bad\nname");
        assert!(response.headers().get(SERVER).is_none());
    }
}
