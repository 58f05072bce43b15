//! Shared scenario-test scaffolding: a minimal loopback HTTP stub server
//! and flow-building helpers. No mocking crate is pulled in for this —
//! the stub is a plain `tokio::net::TcpListener` accept loop, handling one
//! request per connection.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use uuid::Uuid;

use flow_engine::domain::{Edge, Flow, Step};

pub struct StubResponse {
    pub status: u16,
    pub body: String,
}

impl StubResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

/// Parsed view of a request the stub handler gets to inspect.
pub struct StubRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Starts a loopback HTTP/1.1 stub server and returns its base URL. `handler`
/// is invoked once per accepted connection; each connection is closed after
/// one response, matching how every step issues exactly one HTTP call.
pub async fn spawn_stub<F>(handler: F) -> String
where
    F: Fn(&StubRequest) -> StubResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback listener");
    let addr = listener.local_addr().expect("local addr");
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let handler = handler.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    return;
                }
                let raw = String::from_utf8_lossy(&buf[..n]);
                let request = parse_request(&raw);

                let response = handler(&request);
                let payload = format!(
                    "HTTP/1.1 {} OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response.status,
                    response.body.len(),
                    response.body
                );
                let _ = socket.write_all(payload.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

fn parse_request(raw: &str) -> StubRequest {
    let mut parts = raw.splitn(2, "\r\n\r\n");
    let head = parts.next().unwrap_or_default();
    let body = parts.next().unwrap_or_default().to_string();

    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut request_parts = request_line.split_whitespace();
    let method = request_parts.next().unwrap_or("GET").to_string();
    let path = request_parts.next().unwrap_or("/").to_string();

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }

    StubRequest { method, path, headers, body }
}

pub fn new_flow() -> Flow {
    let now = Utc::now();
    Flow {
        id: Uuid::new_v4(),
        name: "scenario".into(),
        created_at: now,
        updated_at: now,
    }
}

pub struct StepBuilder {
    step: Step,
}

impl StepBuilder {
    pub fn new(flow_id: Uuid, sort_order: i32, method: &str, url: &str) -> Self {
        Self {
            step: Step {
                id: Uuid::new_v4(),
                flow_id,
                name: format!("step-{sort_order}"),
                method: method.into(),
                url: url.into(),
                headers: "{}".into(),
                body: None,
                capture: String::new(),
                assert: String::new(),
                sort_order,
                editor_x: 0.0,
                editor_y: 0.0,
            },
        }
    }

    pub fn headers(mut self, headers: &str) -> Self {
        self.step.headers = headers.into();
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.step.body = Some(body.into());
        self
    }

    pub fn capture(mut self, capture: &str) -> Self {
        self.step.capture = capture.into();
        self
    }

    pub fn assert(mut self, assert: &str) -> Self {
        self.step.assert = assert.into();
        self
    }

    pub fn build(self) -> Step {
        self.step
    }
}

pub fn edge(flow_id: Uuid, source: Uuid, target: Uuid) -> Edge {
    Edge {
        id: Uuid::new_v4(),
        flow_id,
        source_step_id: source,
        target_step_id: target,
    }
}
