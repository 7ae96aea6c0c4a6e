use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use super::method::HttpMethod;
use super::request::{RequestInput, build_url};
use super::response::{CallResult, collect_headers, parse_body};
use crate::config::{HarnessConfig, RetryPolicy};
use crate::error::{HarnessError, Result, TransportKind, error_chain};

/// One reusable connection context bound to a base URL.
///
/// Cloning is cheap and clones share the same connection pool, so a single
/// session can serve concurrent cases.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    base_url: Url,
    timeout_ms: u64,
    retry: RetryPolicy,
}

impl Session {
    pub fn new(config: &HarnessConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.parsed_base_url()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(config.user_agent.clone())
            .default_headers(default_headers);

        if config.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.timeout_ms));
        }

        let client = builder
            .build()
            .map_err(|err| {
                HarnessError::InvalidConfig(format!("failed to build HTTP client: {err}"))
            })?;

        Ok(Self {
            client,
            base_url,
            timeout_ms: config.timeout_ms,
            retry: config.retry,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url_for(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        build_url(&self.base_url, path, query)
    }

    pub async fn send(&self, request: &RequestInput) -> Result<CallResult> {
        self.call(request.method, &request.path, request.body.as_ref(), &request.query)
            .await
    }

    /// Issue one call. Retries follow the session's [`RetryPolicy`] and only
    /// apply to transport failures of idempotent methods.
    pub async fn call(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        query: &[(String, String)],
    ) -> Result<CallResult> {
        let url = self.url_for(path, query)?;
        let max_retries = if method.is_idempotent() { self.retry.attempts } else { 0 };

        let mut attempt = 0;
        loop {
            match self.call_once(method, &url, body).await {
                Err(err @ HarnessError::Transport { .. }) if attempt < max_retries => {
                    attempt += 1;
                    warn!(%method, %url, attempt, error = %err, "retrying after transport failure");
                    tokio::time::sleep(Duration::from_millis(self.retry.delay_ms)).await;
                }
                other => return other,
            }
        }
    }

    async fn call_once(
        &self,
        method: HttpMethod,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<CallResult> {
        let mut request = self.client.request(method.into(), url.clone());
        if method.sends_body() {
            if let Some(body) = body {
                request = request.json(body);
            }
        }

        let started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|err| self.map_error(method, url, &err))?;

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());

        let bytes = response
            .bytes()
            .await
            .map_err(|err| self.map_error(method, url, &err))?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let raw_body = String::from_utf8_lossy(&bytes).into_owned();
        let (body, json) = parse_body(&raw_body);

        debug!(%method, %url, status, elapsed_ms, "call completed");

        Ok(CallResult {
            status,
            headers,
            body,
            raw_body,
            json,
            elapsed_ms,
        })
    }

    fn map_error(&self, method: HttpMethod, url: &Url, err: &reqwest::Error) -> HarnessError {
        if err.is_timeout() {
            return HarnessError::Timeout {
                method,
                url: url.to_string(),
                timeout_ms: self.timeout_ms,
            };
        }
        HarnessError::Transport {
            method,
            url: url.to_string(),
            kind: TransportKind::classify(err),
            message: error_chain(err),
        }
    }

    pub async fn get(&self, path: &str) -> Result<CallResult> {
        self.call(HttpMethod::Get, path, None, &[]).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<CallResult> {
        self.call(HttpMethod::Post, path, Some(body), &[]).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<CallResult> {
        self.call(HttpMethod::Put, path, Some(body), &[]).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<CallResult> {
        self.call(HttpMethod::Patch, path, Some(body), &[]).await
    }

    pub async fn delete(&self, path: &str) -> Result<CallResult> {
        self.call(HttpMethod::Delete, path, None, &[]).await
    }
}
