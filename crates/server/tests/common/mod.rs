//! Common test utilities for E2E testing.
//!
//! Builds an in-process server with real stores on temp directories,
//! driving the router directly with `tower::ServiceExt::oneshot` — no
//! sockets, no external infrastructure.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use scrub_core::{
    create_audit_system, load_config_from_str, AuditStore, JobScheduler, OutputStore,
    ScratchDir, SchedulerConfig, SqliteAuditStore, SqliteTicketStore, TicketStore, WktBackend,
};
use scrub_server::api::create_router;
use scrub_server::state::AppState;

/// In-process server fixture.
pub struct TestFixture {
    pub router: Router,
    pub output_root: PathBuf,
    pub temp_dir: TempDir,
}

/// Response from a test request.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).to_string()
    }
}

/// One part of a multipart submission.
pub enum Part {
    Text(&'static str, String),
    File {
        name: &'static str,
        filename: &'static str,
        content: Vec<u8>,
    },
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_scheduler_config(SchedulerConfig::default()).await
    }

    pub async fn with_scheduler_config(scheduler_config: SchedulerConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output_root = temp_dir.path().join("output");
        let scratch_root = temp_dir.path().join("scratch");
        let db_path = temp_dir.path().join("test.db");

        let config = load_config_from_str(&format!(
            r#"
[storage]
output_dir = "{}"
scratch_dir = "{}"

[database]
path = "{}"
"#,
            output_root.display(),
            scratch_root.display(),
            db_path.display(),
        ))
        .expect("Failed to build test config");

        let ticket_store: Arc<dyn TicketStore> = Arc::new(
            SqliteTicketStore::new(&db_path).expect("Failed to create ticket store"),
        );
        let audit_store: Arc<dyn AuditStore> = Arc::new(
            SqliteAuditStore::new(&db_path).expect("Failed to create audit store"),
        );

        let (audit_handle, audit_writer) = create_audit_system(audit_store, 100);
        tokio::spawn(audit_writer.run());

        let output_store = Arc::new(OutputStore::new(&output_root));
        let scratch = ScratchDir::new(&scratch_root);

        let scheduler = Arc::new(
            JobScheduler::new(
                scheduler_config,
                Arc::clone(&ticket_store),
                Arc::clone(&output_store),
                Arc::new(WktBackend),
            )
            .with_audit(audit_handle.clone()),
        );

        let state = Arc::new(AppState::new(
            config,
            ticket_store,
            scheduler,
            output_store,
            scratch,
            audit_handle,
        ));

        Self {
            router: create_router(state),
            output_root,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a multipart POST to the test server.
    pub async fn post_multipart(&self, path: &str, parts: Vec<Part>) -> TestResponse {
        let boundary = "scrubtestboundary";
        let body = multipart_body(boundary, parts);

        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            bytes,
        }
    }

    /// Polls a ticket's status until it reports completion.
    pub async fn wait_for_completion(&self, ticket: &str) -> Value {
        for _ in 0..200 {
            let response = self.get(&format!("/status/{ticket}")).await;
            assert_eq!(response.status, StatusCode::OK, "{}", response.text());
            let body = response.json();
            if body["completed"] == Value::Bool(true) {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("ticket {ticket} never completed");
    }
}

fn multipart_body(boundary: &str, parts: Vec<Part>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&content);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
