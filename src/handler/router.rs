//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: route matching, method checks, access logging.

use crate::config::{AppState, HealthConfig};
use crate::handler::process::{self, PROCESS_PATH};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let access_entry = state
        .config
        .logging
        .access_log
        .then(|| AccessLogEntry::from_request(&req, peer_addr));

    let mut response = route_request(req, &state).await;
    http::set_server_header(&mut response, &state.config.http.server_name);

    if let Some(mut entry) = access_entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on path and method
async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    // 1. Form submission endpoint
    if path == PROCESS_PATH {
        if method == Method::POST {
            return process::handle_process(req, state).await;
        }
        logger::warn(&format!("Method not allowed: {method} {path}"));
        return http::build_405_response("POST");
    }

    // 2. Health check endpoints
    let health = &state.config.routes.health;
    if let Some(probe) = match_health_probe(health, &path) {
        if !matches!(method, Method::GET | Method::HEAD) {
            logger::warn(&format!("Method not allowed: {method} {path}"));
            return http::build_405_response("GET, HEAD");
        }
        return match probe {
            Probe::Readiness if state.is_shutting_down() => {
                http::build_health_response(StatusCode::SERVICE_UNAVAILABLE, "draining")
            }
            _ => http::build_health_response(StatusCode::OK, "ok"),
        };
    }

    logger::debug(&format!("No route for {method} {path}"));
    http::build_404_response()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    Liveness,
    Readiness,
}

fn match_health_probe(health: &HealthConfig, path: &str) -> Option<Probe> {
    if !health.enabled {
        return None;
    }
    if path == health.liveness_path {
        Some(Probe::Liveness)
    } else if path == health.readiness_path {
        Some(Probe::Readiness)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use hyper::header::{ALLOW, CONTENT_TYPE, SERVER};
    use serde_json::{json, Value};

    fn test_state(toml: &str) -> Arc<AppState> {
        let mut cfg = Config::load_from_toml(toml).unwrap();
        cfg.logging.access_log = false;
        Arc::new(AppState::new(&cfg))
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    fn request(method: &str, uri: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn send(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> (StatusCode, Response<Full<Bytes>>) {
        let response = handle_request(req, Arc::clone(state), peer()).await.unwrap();
        (response.status(), response)
    }

    async fn body_json(response: Response<Full<Bytes>>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_process_echoes_fields() {
        let state = test_state("");
        let (status, response) = send(
            &state,
            request("POST", "/process", r#"{"name": "Ana", "email": "ana@x.com"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.headers()[SERVER], "formecho");
        assert_eq!(
            body_json(response).await,
            json!({"message": "Data received successfully", "name": "Ana", "email": "ana@x.com"})
        );
    }

    #[tokio::test]
    async fn test_process_empty_object() {
        let state = test_state("");
        let (status, response) = send(&state, request("POST", "/process", "{}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Data received successfully", "name": null, "email": null})
        );
    }

    #[tokio::test]
    async fn test_process_query_string_ignored() {
        let state = test_state("");
        let (status, response) =
            send(&state, request("POST", "/process?x=1", r#"{"name": "Bo"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json(response).await["name"], "Bo");
    }

    #[tokio::test]
    async fn test_process_rejects_get() {
        let state = test_state("");
        let (status, response) = send(&state, request("GET", "/process", "")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "POST");
    }

    #[tokio::test]
    async fn test_process_malformed_json() {
        let state = test_state("");
        let (status, _) = send(&state, request("POST", "/process", "name=Ana")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let state = test_state("");
        let (status, response) = send(&state, request("POST", "/submit", "{}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["status"], 404);
    }

    #[tokio::test]
    async fn test_health_probes() {
        let state = test_state("");
        let (status, response) = send(&state, request("GET", "/healthz", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));

        let (status, _) = send(&state, request("GET", "/readyz", "")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, response) = send(&state, request("POST", "/healthz", "")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, HEAD");
    }

    #[tokio::test]
    async fn test_readiness_during_shutdown() {
        let state = test_state("");
        state.begin_shutdown();

        let (status, response) = send(&state, request("GET", "/readyz", "")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["status"], "draining");

        // Liveness is unaffected
        let (status, _) = send(&state, request("GET", "/healthz", "")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_disabled_and_custom_paths() {
        let state = test_state("[routes.health]\nenabled = false\n");
        let (status, _) = send(&state, request("GET", "/healthz", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let state = test_state("[routes.health]\nliveness_path = \"/live\"\n");
        let (status, _) = send(&state, request("GET", "/live", "")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&state, request("GET", "/healthz", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_match_health_probe() {
        let health = HealthConfig::default();
        assert_eq!(match_health_probe(&health, "/healthz"), Some(Probe::Liveness));
        assert_eq!(match_health_probe(&health, "/readyz"), Some(Probe::Readiness));
        assert_eq!(match_health_probe(&health, "/process"), None);
    }
}
