use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use shared::domain::SceneName;

use crate::assistant::AssistantFactory;

/// Where scene markup templates come from.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<String>;
}

/// Fetches templates over HTTP, relative to a base URL.
pub struct HttpTemplateSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTemplateSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl TemplateSource for HttpTemplateSource {
    async fn fetch(&self, path: &str) -> Result<String> {
        let url = self.url_for(path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to '{url}' failed"))?
            .error_for_status()
            .with_context(|| format!("'{url}' answered with an error status"))?;
        response
            .text()
            .await
            .with_context(|| format!("reading body of '{url}' failed"))
    }
}

/// Templates registered directly in memory.
#[derive(Default)]
pub struct StaticTemplateSource {
    templates: HashMap<String, String>,
}

impl StaticTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, path: impl Into<String>, body: impl Into<String>) -> Self {
        self.templates.insert(path.into(), body.into());
        self
    }
}

#[async_trait]
impl TemplateSource for StaticTemplateSource {
    async fn fetch(&self, path: &str) -> Result<String> {
        self.templates
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no template at '{path}'"))
    }
}

/// Process-lifetime template cache, keyed by scene name. Append-only:
/// the first write for a key wins and later writes are ignored, which is
/// safe because template content is idempotent for a given name.
#[derive(Default)]
pub struct TemplateCache {
    inner: Mutex<HashMap<SceneName, Arc<str>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, scene: &SceneName) -> Option<Arc<str>> {
        self.inner.lock().await.get(scene).cloned()
    }

    pub async fn insert(&self, scene: SceneName, body: String) -> Arc<str> {
        let mut inner = self.inner.lock().await;
        inner
            .entry(scene)
            .or_insert_with(|| Arc::from(body.as_str()))
            .clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

/// Assistant factory cache with the same append-only contract.
#[derive(Default)]
pub struct AssistantCache {
    inner: Mutex<HashMap<SceneName, Arc<dyn AssistantFactory>>>,
}

impl AssistantCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, scene: &SceneName) -> Option<Arc<dyn AssistantFactory>> {
        self.inner.lock().await.get(scene).cloned()
    }

    pub async fn insert(
        &self,
        scene: SceneName,
        factory: Arc<dyn AssistantFactory>,
    ) -> Arc<dyn AssistantFactory> {
        let mut inner = self.inner.lock().await;
        inner.entry(scene).or_insert(factory).clone()
    }
}
