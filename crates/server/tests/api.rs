use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::ai::{CodeGenerator, GeneratedCode, GenerationError, GenerationFuture};
use server::config::ServerConfig;
use server::{app, AppState};
use shared::GenerateRequest;
use tower::ServiceExt;

/// Replies with a fenced script and counts calls.
struct ScriptedGenerator {
    calls: AtomicUsize,
    fail: bool,
}

impl ScriptedGenerator {
    fn ok() -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0), fail: false })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0), fail: true })
    }
}

impl CodeGenerator for ScriptedGenerator {
    fn generate<'a>(&'a self, request: &'a GenerateRequest) -> GenerationFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GenerationError::Upstream("quota exhausted".to_string()));
            }
            Ok(GeneratedCode::from_raw(format!(
                "```rhai\n// {}\nfn main() {{ cube(10) }}\n```",
                request.prompt
            )))
        })
    }
}

fn config(log_dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        rate_limit_max: 2,
        rate_limit_window: Duration::from_secs(60),
        log_dir: log_dir.to_path_buf(),
        ..ServerConfig::default()
    }
}

async fn send(router: axum::Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .header("x-forwarded-for", "10.0.0.7")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    router.oneshot(request).await.unwrap()
}

/// POST `body` to `/api/generate` as if it arrived from `peer` carrying `forwarded_for`.
async fn generate_from(router: axum::Router, peer: SocketAddr, forwarded_for: &str, body: &Value) -> Response {
    let mut request = Request::builder()
        .method(Method::POST)
        .uri("/api/generate")
        .header("content-type", "application/json")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::from(body.to_string()))
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    router.oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn root_and_health() {
    let tmp = tempfile::tempdir().unwrap();
    let router = app(AppState::new(config(tmp.path()), ScriptedGenerator::ok()));

    let response = send(router.clone(), Method::GET, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "running");

    let response = send(router, Method::GET, "/health", None).await;
    assert_eq!(json_body(response).await, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn generate_strips_fences() {
    let tmp = tempfile::tempdir().unwrap();
    let router = app(AppState::new(config(tmp.path()), ScriptedGenerator::ok()));

    let response = send(
        router,
        Method::POST,
        "/api/generate",
        Some(json!({ "prompt": "a box", "imageBase64": "aGVsbG8=" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["openSCADCode"], "// a box\nfn main() { cube(10) }");
    assert!(body["rawResponse"].as_str().unwrap().starts_with("```rhai"));
}

#[tokio::test]
async fn generate_rate_limited_per_client() {
    let tmp = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::ok();
    let router = app(AppState::new(config(tmp.path()), generator.clone()));
    let body = json!({ "prompt": "a box" });

    for _ in 0..2 {
        let response = send(router.clone(), Method::POST, "/api/generate", Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = send(router, Method::POST, "/api/generate", Some(body)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(json_body(response).await["detail"].is_string());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn generate_limit_ignores_forwarded_for_from_untrusted_peer() {
    let tmp = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::ok();
    let router = app(AppState::new(config(tmp.path()), generator.clone()));
    let peer: SocketAddr = "192.0.2.10:40000".parse().unwrap();
    let body = json!({ "prompt": "a box" });

    let mut statuses = Vec::new();
    for i in 0..5 {
        let forwarded = format!("203.0.113.{i}");
        statuses.push(generate_from(router.clone(), peer, &forwarded, &body).await.status());
    }
    assert_eq!(&statuses[..2], &[StatusCode::OK, StatusCode::OK]);
    assert!(statuses[2..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);

    // A different peer still has its own budget
    let other: SocketAddr = "192.0.2.11:40000".parse().unwrap();
    let response = generate_from(router, other, "203.0.113.0", &body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn generate_limit_uses_forwarded_for_behind_trusted_proxy() {
    let tmp = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        trust_forwarded_for: true,
        ..config(tmp.path())
    };
    let router = app(AppState::new(config, ScriptedGenerator::ok()));
    let proxy: SocketAddr = "10.1.0.1:3128".parse().unwrap();
    let body = json!({ "prompt": "a box" });

    for i in 0..5 {
        let forwarded = format!("203.0.113.{i}, 10.1.0.1");
        let response = generate_from(router.clone(), proxy, &forwarded, &body).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn generate_rejects_malformed_image_before_generator() {
    let tmp = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::ok();
    let router = app(AppState::new(config(tmp.path()), generator.clone()));
    let body = json!({ "prompt": "a box", "imageBase64": "data:image/png;base64,@@not-base64@@" });

    let response = send(router, Method::POST, "/api/generate", Some(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["detail"].is_string());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn generate_malformed_image_without_key_is_400() {
    let tmp = tempfile::tempdir().unwrap();
    let router = app(AppState::with_gemini(config(tmp.path())));
    let body = json!({ "prompt": "x", "imageBase64": "@@not-base64@@" });

    let response = send(router, Method::POST, "/api/generate", Some(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_upstream_failure_is_500() {
    let tmp = tempfile::tempdir().unwrap();
    let router = app(AppState::new(config(tmp.path()), ScriptedGenerator::failing()));

    let response = send(router, Method::POST, "/api/generate", Some(json!({ "prompt": "x" }))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["detail"], "Gemini API error: quota exhausted");
}

#[tokio::test]
async fn generate_without_key_is_500() {
    let tmp = tempfile::tempdir().unwrap();
    let router = app(AppState::with_gemini(config(tmp.path())));

    let response = send(router, Method::POST, "/api/generate", Some(json!({ "prompt": "x" }))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["detail"], "GEMINI_API_KEY not configured");
}

#[tokio::test]
async fn log_error_writes_file() {
    let tmp = tempfile::tempdir().unwrap();
    let router = app(AppState::new(config(tmp.path()), ScriptedGenerator::ok()));

    let response = send(
        router,
        Method::POST,
        "/api/log/error",
        Some(json!({
            "source": "viewer",
            "error": "execution failed: undefined variable",
            "code": "fn main() { nope }",
            "timestamp": "2026-03-01T10:00:00Z"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "logged");
    let text = std::fs::read_to_string(body["file"].as_str().unwrap()).unwrap();
    assert!(text.contains("SOURCE: viewer"));
    assert!(text.contains("fn main() { nope }"));
}

#[tokio::test]
async fn check_returns_report() {
    let tmp = tempfile::tempdir().unwrap();
    let router = app(AppState::new(config(tmp.path()), ScriptedGenerator::ok()));

    let response = send(
        router,
        Method::POST,
        "/api/check",
        Some(json!({ "code": "fn main() { rotate([70, 0, 0], cube(10)) }" })),
    )
    .await;

    let body = json_body(response).await;
    assert_eq!(body["overhangAngle"]["max"], 70.0);
    assert_eq!(body["overhangAngle"]["ok"], false);
    assert_eq!(body["centerOfGravity"]["stable"], true);
}
