//! Common test utilities: an in-process server with a fake downloader
//! binary and an in-memory library store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use pullcast_core::config::{Config, DownloaderConfig};
use pullcast_core::{Downloader, JobRegistry, LibraryStore, SqliteLibrary};
use pullcast_server::api::create_router;
use pullcast_server::state::AppState;

/// Fake downloader script: announces a title, reports progress, drops
/// the artifact files and exits cleanly.
const SUCCESS_SCRIPT: &str = r#"#!/bin/sh
out=""
prev=""
for a in "$@"; do
  if [ "$prev" = "--output" ]; then out="$a"; fi
  prev="$a"
done
prefix=$(printf '%s' "$out" | sed 's/\.%(ext)s$//')
echo "Found: Example Song"
echo "[download] 100.0% of 1.00MiB"
printf 'x' > "$prefix.mp3"
printf '%s' '{"title":"Example Song","uploader":"Example Artist","duration":180}' > "$prefix.info.json"
exit 0
"#;

/// In-process server fixture.
pub struct TestFixture {
    pub router: Router,
    pub registry: JobRegistry,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let script = temp_dir.path().join("fake-dl");
        std::fs::write(&script, SUCCESS_SCRIPT).expect("Failed to write fake downloader");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&script).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&script, perms).unwrap();
        }

        let config = Config {
            downloader: DownloaderConfig {
                binary_path: Some(script),
                download_dir: temp_dir.path().join("downloads"),
                timeout_secs: 30,
                grace_secs: 1,
                ..DownloaderConfig::default()
            },
            ..Config::default()
        };

        let library: Arc<dyn LibraryStore> = Arc::new(
            SqliteLibrary::in_memory().expect("Failed to create in-memory library"),
        );
        let registry = JobRegistry::new();
        let downloader = Downloader::new(
            config.downloader.clone(),
            &config.library,
            registry.clone(),
            Arc::clone(&library),
        );

        let state = Arc::new(AppState::new(config, downloader, library));
        let router = create_router(state);

        Self {
            router,
            registry,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
