use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::Mutex;
use tracing::info;
use url::Url;

use scene_stack::LoadError;
use shared::{
    domain::{ContainerId, ViewId},
    protocol::RemoteContent,
};
use view_core::{ViewEngine, ViewSpec};

pub const DEFAULT_REMOTE_BODY_LIMIT: usize = 512 * 1024;

const FALLBACK_MIME: &str = "text/html";

/// Fetches raw content for remote view targets.
#[async_trait]
pub trait ViewDataSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<RemoteContent>;
}

pub struct HttpViewDataSource {
    http: reqwest::Client,
    body_limit: usize,
}

impl HttpViewDataSource {
    pub fn new() -> Self {
        Self::with_body_limit(DEFAULT_REMOTE_BODY_LIMIT)
    }

    pub fn with_body_limit(body_limit: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            body_limit,
        }
    }
}

impl Default for HttpViewDataSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ViewDataSource for HttpViewDataSource {
    async fn fetch(&self, url: &Url) -> Result<RemoteContent> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request to '{url}' failed"))?
            .error_for_status()
            .with_context(|| format!("'{url}' answered with an error status"))?;
        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .unwrap_or(FALLBACK_MIME)
            .trim()
            .to_string();
        let body = response
            .text()
            .await
            .with_context(|| format!("reading body of '{url}' failed"))?;
        if body.len() > self.body_limit {
            return Err(anyhow!(
                "remote view body of {} bytes exceeds the {} byte limit",
                body.len(),
                self.body_limit
            ));
        }
        Ok(RemoteContent {
            url: url.to_string(),
            mime,
            body,
            fetched_at: Utc::now(),
        })
    }
}

/// Content registered directly in memory, for tests and offline
/// embeddings.
#[derive(Default)]
pub struct StaticViewDataSource {
    entries: HashMap<String, (String, String)>,
}

impl StaticViewDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        url: impl Into<String>,
        mime: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        self.entries.insert(url.into(), (mime.into(), body.into()));
        self
    }
}

#[async_trait]
impl ViewDataSource for StaticViewDataSource {
    async fn fetch(&self, url: &Url) -> Result<RemoteContent> {
        let (mime, body) = self
            .entries
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("no content registered for '{url}'"))?;
        Ok(RemoteContent {
            url: url.to_string(),
            mime,
            body,
            fetched_at: Utc::now(),
        })
    }
}

/// Turns fetched content into a view. `claims_url` makes the pre-fetch
/// routing decision (remote view vs. external navigation); `claims`
/// validates the served content type afterwards.
#[async_trait]
pub trait ContentHandler: Send + Sync {
    fn claims_url(&self, url: &Url) -> bool;

    fn claims(&self, mime: &str) -> bool;

    async fn materialize(
        &self,
        content: &RemoteContent,
        engine: &ViewEngine,
        container: &ContainerId,
    ) -> Result<ViewId>;
}

/// Materializes HTML fragments as content-bearing views.
pub struct HtmlContentHandler;

#[async_trait]
impl ContentHandler for HtmlContentHandler {
    fn claims_url(&self, url: &Url) -> bool {
        let path = url.path();
        path.ends_with(".html") || path.ends_with(".htm")
    }

    fn claims(&self, mime: &str) -> bool {
        matches!(mime, "text/html" | "application/xhtml+xml")
    }

    async fn materialize(
        &self,
        content: &RemoteContent,
        engine: &ViewEngine,
        container: &ContainerId,
    ) -> Result<ViewId> {
        let id = ViewId::minted("remote");
        engine
            .define_view(ViewSpec::new(id.clone(), container.clone()).content(content.body.as_str()))
            .await
            .map_err(anyhow::Error::from)?;
        Ok(id)
    }
}

/// Runs the remote-view pipeline: data source → content handler →
/// materialized view, memoized by URL so repeat requests skip the fetch.
pub struct RemoteViewLoader {
    data_source: Arc<dyn ViewDataSource>,
    handlers: Vec<Arc<dyn ContentHandler>>,
    container: ContainerId,
    cache: Mutex<HashMap<String, ViewId>>,
}

impl RemoteViewLoader {
    pub fn new(data_source: Arc<dyn ViewDataSource>, container: impl Into<ContainerId>) -> Self {
        Self {
            data_source,
            handlers: vec![Arc::new(HtmlContentHandler)],
            container: container.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_handler(mut self, handler: Arc<dyn ContentHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Whether any registered handler wants this URL as view content.
    pub fn handles_url(&self, url: &Url) -> bool {
        self.handlers.iter().any(|handler| handler.claims_url(url))
    }

    pub async fn resolve(
        &self,
        url: &Url,
        engine: &ViewEngine,
    ) -> Result<ViewId, LoadError> {
        if let Some(cached) = self.cache.lock().await.get(url.as_str()).cloned() {
            return Ok(cached);
        }

        let content = self
            .data_source
            .fetch(url)
            .await
            .map_err(|source| LoadError::RemoteView {
                url: url.to_string(),
                source,
            })?;
        let handler = self
            .handlers
            .iter()
            .find(|handler| handler.claims(&content.mime))
            .ok_or_else(|| LoadError::UnsupportedContent {
                url: url.to_string(),
                mime: content.mime.clone(),
            })?;
        let view = handler
            .materialize(&content, engine, &self.container)
            .await
            .map_err(|source| LoadError::RemoteView {
                url: url.to_string(),
                source,
            })?;
        info!(url = %url, view = %view, mime = %content.mime, "remote view materialized");
        self.cache.lock().await.insert(url.to_string(), view.clone());
        Ok(view)
    }
}
