use super::*;
use crate::error::Result;
use crate::extractor::{Extractor, JobExit, JobHandle, JobSignal, RunMode};
use crate::types::RetrievalRequest;
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;


/// Extractor that replays canned output and writes a canned artifact
#[derive(Clone)]
struct Canned {
    lines: Vec<&'static str>,
    exit_code: i32,
    artifact: Option<&'static [u8]>,
    urls: Vec<String>,
    starts: Arc<AtomicUsize>,
}

impl Canned {
    fn success(artifact: &'static [u8]) -> Self {
        Self {
            lines: vec![
                "[download]  25.0% of 4.00KiB at 1.00KiB/s ETA 00:03",
                "[download] 100.0% of 4.00KiB at 1.00KiB/s ETA 00:00",
                "[Merger] Merging formats into \"out.mp4\"",
            ],
            exit_code: 0,
            artifact: Some(artifact),
            urls: Vec::new(),
            starts: Arc::default(),
        }
    }

    fn failure(urls: &[&str]) -> Self {
        Self {
            lines: Vec::new(),
            exit_code: 1,
            artifact: None,
            urls: urls.iter().map(|u| u.to_string()).collect(),
            starts: Arc::default(),
        }
    }
}

#[async_trait]
impl Extractor for Canned {
    async fn start(
        &self,
        request: &RetrievalRequest,
        output_template: &Path,
        _mode: RunMode,
        _timeout: Duration,
    ) -> Result<JobHandle> {
        self.starts.fetch_add(1, Ordering::SeqCst);

        let final_path = output_template
            .to_string_lossy()
            .replace("%(ext)s", request.kind().extension());
        let (tx, rx) = mpsc::unbounded_channel();
        let script = self.clone();

        tokio::spawn(async move {
            for line in &script.lines {
                let _ = tx.send(JobSignal::Output(line.to_string()));
            }
            if script.exit_code != 0 {
                let _ = tx.send(JobSignal::ErrorOutput("ERROR: Video unavailable".into()));
            }
            if let Some(bytes) = script.artifact {
                tokio::fs::write(&final_path, bytes).await.unwrap();
            }
            let _ = tx.send(JobSignal::Exit(JobExit::Exited(Some(script.exit_code))));
        });

        Ok(JobHandle::from_parts(rx, CancellationToken::new()))
    }

    async fn resolve_urls(
        &self,
        _request: &RetrievalRequest,
        _timeout: Duration,
    ) -> Result<Vec<String>> {
        if self.urls.is_empty() {
            Err(crate::Error::ExtractionFailed {
                code: Some(1),
                detail: "no URLs returned".into(),
            })
        } else {
            Ok(self.urls.clone())
        }
    }

    fn name(&self) -> &'static str {
        "canned"
    }

    fn binary(&self) -> Option<&Path> {
        None
    }
}

/// Build a router around a canned extractor, rooted in a fresh temp dir
fn create_test_app(extractor: Canned) -> (Router, Arc<RetrievalOrchestrator>, TempDir) {
    create_test_app_with(extractor, |_| {})
}

fn create_test_app_with(
    extractor: Canned,
    configure: impl FnOnce(&mut Config),
) -> (Router, Arc<RetrievalOrchestrator>, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.temp_dir = temp_dir.path().to_path_buf();
    config.server.api.swagger_ui = false;
    configure(&mut config);

    let orchestrator = Arc::new(
        RetrievalOrchestrator::with_extractor(config.clone(), Arc::new(extractor)).unwrap(),
    );
    let app = create_router(orchestrator.clone(), Arc::new(config));
    (app, orchestrator, temp_dir)
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn header<'a>(response: &'a axum::response::Response, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn test_api_server_spawns() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.temp_dir = temp_dir.path().to_path_buf();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);
    let orchestrator = Arc::new(
        RetrievalOrchestrator::with_extractor((*config).clone(), Arc::new(Canned::success(b"x")))
            .unwrap(),
    );

    let api_handle = tokio::spawn({
        let orchestrator = orchestrator.clone();
        let config = config.clone();
        async move { start_api_server(orchestrator, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!api_handle.is_finished(), "server should still be running");
    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let (app, _orchestrator, _temp_dir) = create_test_app_with(Canned::success(b"x"), |config| {
        config.server.api.cors_enabled = true;
        config.server.api.cors_origins = vec!["*".to_string()];
    });

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "access-control-allow-origin"), "*");
}

#[tokio::test]
async fn test_cors_restricted_origins() {
    let (app, _orchestrator, _temp_dir) = create_test_app_with(Canned::success(b"x"), |config| {
        config.server.api.cors_enabled = true;
        config.server.api.cors_origins = vec!["http://allowed.example".to_string()];
    });

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://allowed.example")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        header(&response, "access-control-allow-origin"),
        "http://allowed.example"
    );

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://other.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_cors_disabled() {
    let (app, _orchestrator, _temp_dir) = create_test_app_with(Canned::success(b"x"), |config| {
        config.server.api.cors_enabled = false;
    });

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_swagger_ui_enabled() {
    let (app, _orchestrator, _temp_dir) = create_test_app_with(Canned::success(b"x"), |config| {
        config.server.api.swagger_ui = true;
    });

    let response = get(app, "/swagger-ui/").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_swagger_ui_disabled() {
    let (app, _orchestrator, _temp_dir) = create_test_app(Canned::success(b"x"));

    let response = get(app, "/swagger-ui/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
