use super::LogBackend;
use crate::error::BackendError;
use crate::model::{AnalysisResult, ClientConfig, IngestRequest, LogEntry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

const LOGS_PATH: &str = "api/logs";
const INGEST_PATH: &str = "api/logs/ingest";
const ANALYSIS_PATH: &str = "api/analysis";

#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let base_url = parse_base_url(&cfg.base_url)?;
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout)
            .build()
            .context("build http client")?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Url {
        // base_url always ends in '/', so join appends instead of replacing the last segment.
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = self.endpoint(path);
        tracing::debug!(%url, "GET");
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        let body = success_body(&url, resp).await?;
        serde_json::from_str(&body).map_err(|source| BackendError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// Parse the configured base URL, normalising it to end with a slash.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("invalid base url '{raw}'"))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("base url '{raw}' cannot carry api paths");
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn transport(url: &Url, source: reqwest::Error) -> BackendError {
    BackendError::Transport {
        url: url.to_string(),
        source,
    }
}

/// Read the body, turning any non-2xx status into [`BackendError::Status`].
async fn success_body(url: &Url, resp: Response) -> Result<String, BackendError> {
    let status = resp.status();
    let body = resp.text().await.map_err(|source| transport(url, source))?;
    if !status.is_success() {
        return Err(BackendError::status(url.as_str(), status, &body));
    }
    Ok(body)
}

/// Number of stored entries reported by an ingest acknowledgment, when it is a JSON array.
fn ack_entry_count(body: &str) -> Option<usize> {
    match serde_json::from_str::<serde_json::Value>(body).ok()? {
        serde_json::Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

#[async_trait]
impl LogBackend for HttpBackend {
    async fn list_logs(&self) -> Result<Vec<LogEntry>, BackendError> {
        self.get_json(LOGS_PATH).await
    }

    async fn ingest_logs(&self, request: &IngestRequest) -> Result<(), BackendError> {
        let url = self.endpoint(INGEST_PATH);
        tracing::debug!(%url, lines = request.lines.len(), "POST");
        let resp = self
            .http
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        let body = success_body(&url, resp).await?;
        match ack_entry_count(&body) {
            Some(n) => tracing::debug!(stored = n, "ingest acknowledged"),
            None => tracing::debug!(bytes = body.len(), "ingest acknowledged"),
        }
        Ok(())
    }

    async fn analyze_logs(&self) -> Result<AnalysisResult, BackendError> {
        self.get_json(ANALYSIS_PATH).await
    }
}
