use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::controller::SceneController;

/// Application-supplied scene controller logic.
///
/// `setup` runs exactly once, when the scene first reaches `Ready`.
/// `activate`/`deactivate` bracket the scene's time at the top of the
/// stack; `destroy` is called exactly once, strictly after the scene's
/// exit transition has completed.
#[async_trait]
pub trait SceneAssistant: Send + Sync {
    async fn setup(&self) -> Result<()>;

    async fn activate(&self, params: Option<Value>);

    async fn deactivate(&self);

    async fn destroy(&self);

    /// Cross-wiring hook: the controller hands the assistant a handle to
    /// itself once the scene is ready.
    fn attach(&self, controller: Weak<SceneController>) {
        let _ = controller;
    }
}

/// Builds a fresh assistant for each scene instantiation.
pub trait AssistantFactory: Send + Sync {
    fn create(&self) -> Arc<dyn SceneAssistant>;
}

impl<F> AssistantFactory for F
where
    F: Fn() -> Arc<dyn SceneAssistant> + Send + Sync,
{
    fn create(&self) -> Arc<dyn SceneAssistant> {
        (self)()
    }
}

/// Resolves an assistant factory from its derived path. Real embeddings
/// load code here; tests and static applications register factories up
/// front.
#[async_trait]
pub trait AssistantResolver: Send + Sync {
    async fn resolve(&self, path: &str) -> Result<Arc<dyn AssistantFactory>>;
}

pub struct MissingAssistantResolver;

#[async_trait]
impl AssistantResolver for MissingAssistantResolver {
    async fn resolve(&self, path: &str) -> Result<Arc<dyn AssistantFactory>> {
        Err(anyhow!("no assistant resolver configured (wanted '{path}')"))
    }
}

/// Fixed table of factories keyed by assistant path.
#[derive(Default)]
pub struct StaticAssistantResolver {
    factories: HashMap<String, Arc<dyn AssistantFactory>>,
}

impl StaticAssistantResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        path: impl Into<String>,
        factory: Arc<dyn AssistantFactory>,
    ) -> Self {
        self.factories.insert(path.into(), factory);
        self
    }
}

#[async_trait]
impl AssistantResolver for StaticAssistantResolver {
    async fn resolve(&self, path: &str) -> Result<Arc<dyn AssistantFactory>> {
        self.factories
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("unknown assistant '{path}'"))
    }
}
