//! HTTP requester: issues the single HTTP call a step describes. No
//! recovery policies, query-param assembly, or global headers — one step
//! is one request, full stop.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::{Client, Method};
use serde_json::{json, Value};

use crate::domain::Step;
use crate::errors::{ErrorCode, ErrorContext, StructuredError};
use crate::interpolate::{interpolate_str, VariableStore};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, serde::Serialize)]
pub struct RequestSnapshot {
    pub method: String,
    pub url: String,
    pub headers: Value,
    pub body: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: Value,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct HttpOutcome {
    pub request: RequestSnapshot,
    pub response: Option<ResponseSnapshot>,
    pub duration_ms: u64,
    pub transport_error: Option<String>,
}

/// Sends one step's HTTP request. `base_url` is prepended whenever a step's
/// URL doesn't already start with a scheme.
pub struct HttpRequester {
    client: Client,
    base_url: String,
}

impl HttpRequester {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    #[tracing::instrument(
        name = "http_request",
        skip(self, step, store),
        fields(
            step.id = %step.id,
            http.method = %step.method,
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            http.duration_ms = tracing::field::Empty,
            otel.kind = "client",
        )
    )]
    pub async fn execute(&self, step: &Step, store: &VariableStore) -> HttpOutcome {
        let span = tracing::Span::current();
        let start = Instant::now();

        let interpolated_url = interpolate_str(store, &step.url);
        let url = if interpolated_url.starts_with("http://") || interpolated_url.starts_with("https://") {
            interpolated_url
        } else {
            format!("{}{}", self.base_url, interpolated_url)
        };
        span.record("http.url", url.as_str());

        let method = Method::from_bytes(step.method.to_uppercase().as_bytes()).unwrap_or(Method::GET);

        let headers: HashMap<String, String> = serde_json::from_str(&step.headers).unwrap_or_default();
        let mut has_content_type = false;
        let mut builder = self.client.request(method, &url).timeout(DEFAULT_TIMEOUT);
        for (name, value) in &headers {
            if name.eq_ignore_ascii_case("content-type") {
                has_content_type = true;
            }
            builder = builder.header(name, interpolate_str(store, value));
        }

        let body = step.body.as_ref().map(|b| interpolate_str(store, b));
        if let Some(body) = &body {
            if !has_content_type {
                builder = builder.header("content-type", DEFAULT_CONTENT_TYPE);
            }
            builder = builder.body(body.clone());
        }

        let request = RequestSnapshot {
            method: step.method.clone(),
            url: url.clone(),
            headers: json!(headers),
            body: body.clone(),
        };

        match builder.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let response_headers: HashMap<String, String> = response
                    .headers()
                    .iter()
                    .filter_map(|(name, value)| {
                        value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
                    })
                    .collect();
                let raw = response.text().await.unwrap_or_default();
                let body = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                let duration_ms = start.elapsed().as_millis() as u64;

                span.record("http.status_code", status as i64);
                span.record("http.duration_ms", duration_ms as i64);
                tracing::info!(status, duration_ms, "step request completed");

                HttpOutcome {
                    request,
                    response: Some(ResponseSnapshot {
                        status,
                        headers: json!(response_headers),
                        body,
                    }),
                    duration_ms,
                    transport_error: None,
                }
            }
            Err(err) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                let code = if err.is_timeout() {
                    ErrorCode::HTTP_TIMEOUT
                } else {
                    ErrorCode::HTTP_CONNECTION_ERROR
                };
                let structured = StructuredError::new(code, format!("request failed: {err}"))
                    .with_context(ErrorContext::default().with_step_id(step.id));
                tracing::error!(code = %code, error = %err, "step request failed");
                HttpOutcome {
                    request,
                    response: None,
                    duration_ms,
                    transport_error: Some(structured.user_message()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepends_base_url_verbatim_with_no_path_normalization() {
        let requester = HttpRequester::new("http://example.test/");
        assert_eq!(
            format!("{}{}", requester.base_url, "/users"),
            "http://example.test//users"
        );
    }
}
