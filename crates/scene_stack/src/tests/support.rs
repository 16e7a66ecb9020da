use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, Weak,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use shared::domain::{EffectName, ViewId};
use view_core::AnimationDriver;

use crate::{
    assistant::{AssistantFactory, SceneAssistant},
    controller::SceneController,
    loader::{StaticTemplateSource, TemplateSource},
};

#[derive(Default)]
pub struct RecordingAssistant {
    setup_calls: AtomicUsize,
    activate_calls: AtomicUsize,
    deactivate_calls: AtomicUsize,
    destroy_calls: AtomicUsize,
    pub last_params: Mutex<Option<Value>>,
    pub attached: Mutex<Option<Weak<SceneController>>>,
    fail_setup: bool,
}

impl RecordingAssistant {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_setup() -> Arc<Self> {
        Arc::new(Self {
            fail_setup: true,
            ..Default::default()
        })
    }

    pub fn setups(&self) -> usize {
        self.setup_calls.load(Ordering::SeqCst)
    }

    pub fn activations(&self) -> usize {
        self.activate_calls.load(Ordering::SeqCst)
    }

    pub fn deactivations(&self) -> usize {
        self.deactivate_calls.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroy_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SceneAssistant for RecordingAssistant {
    async fn setup(&self) -> Result<()> {
        self.setup_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_setup {
            return Err(anyhow!("setup refused"));
        }
        Ok(())
    }

    async fn activate(&self, params: Option<Value>) {
        self.activate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock().expect("params") = params;
    }

    async fn deactivate(&self) {
        self.deactivate_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn destroy(&self) {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn attach(&self, controller: Weak<SceneController>) {
        *self.attached.lock().expect("attached") = Some(controller);
    }
}

pub fn factory_for(assistant: Arc<RecordingAssistant>) -> Arc<dyn AssistantFactory> {
    Arc::new(move || assistant.clone() as Arc<dyn SceneAssistant>)
}

/// Template source that counts how often the underlying source is hit.
pub struct CountingTemplateSource {
    inner: StaticTemplateSource,
    fetches: AtomicUsize,
}

impl CountingTemplateSource {
    pub fn new(inner: StaticTemplateSource) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TemplateSource for CountingTemplateSource {
    async fn fetch(&self, path: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(path).await
    }
}

/// Driver that parks every completion signal until the test releases a
/// token.
pub struct GateAllDriver {
    tokens: tokio::sync::Mutex<tokio::sync::mpsc::UnboundedReceiver<()>>,
}

impl GateAllDriver {
    pub fn new() -> (Arc<Self>, tokio::sync::mpsc::UnboundedSender<()>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (
            Arc::new(Self {
                tokens: tokio::sync::Mutex::new(rx),
            }),
            tx,
        )
    }
}

#[async_trait]
impl AnimationDriver for GateAllDriver {
    fn sync_decorations(&self, _view: &ViewId, _decorations: &[String]) {}

    fn request_resize(&self, _view: &ViewId) {}

    async fn settle(&self) {}

    async fn wait_completion(&self, _view: &ViewId, _effect: &EffectName) {
        self.tokens.lock().await.recv().await;
    }
}
