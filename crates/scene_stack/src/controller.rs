use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use shared::domain::{LoadState, SceneName, ViewId};

use crate::{
    assistant::{AssistantResolver, SceneAssistant},
    error::LoadError,
    loader::{AssistantCache, TemplateCache, TemplateSource},
    naming::SceneNaming,
};

/// Everything scene materialization needs, injected once and shared by
/// every controller of a stage. The caches live here so their lifetime
/// is the application's, not a single scene's.
#[derive(Clone)]
pub struct SceneResources {
    pub naming: SceneNaming,
    pub templates: Arc<TemplateCache>,
    pub template_source: Arc<dyn TemplateSource>,
    pub assistants: Arc<AssistantCache>,
    pub assistant_resolver: Arc<dyn AssistantResolver>,
}

impl SceneResources {
    pub fn new(
        template_source: Arc<dyn TemplateSource>,
        assistant_resolver: Arc<dyn AssistantResolver>,
    ) -> Self {
        Self {
            naming: SceneNaming::default(),
            templates: Arc::new(TemplateCache::new()),
            template_source,
            assistants: Arc::new(AssistantCache::new()),
            assistant_resolver,
        }
    }

    pub fn with_naming(mut self, naming: SceneNaming) -> Self {
        self.naming = naming;
        self
    }
}

struct SceneState {
    load_state: LoadState,
    template: Option<Arc<str>>,
    assistant: Option<Arc<dyn SceneAssistant>>,
}

/// One scene on the stage: a view plus its asynchronously materialized
/// template and assistant.
///
/// The load state advances `Uninitialized → LoadingTemplate →
/// LoadingAssistant → Ready` and never regresses; a failed `init` leaves
/// it short of `Ready` and the error on the caller.
pub struct SceneController {
    scene_name: SceneName,
    view: ViewId,
    state: Mutex<SceneState>,
}

impl SceneController {
    pub fn new(scene_name: SceneName, view: ViewId) -> Arc<Self> {
        Arc::new(Self {
            scene_name,
            view,
            state: Mutex::new(SceneState {
                load_state: LoadState::Uninitialized,
                template: None,
                assistant: None,
            }),
        })
    }

    pub fn scene_name(&self) -> &SceneName {
        &self.scene_name
    }

    pub fn view(&self) -> &ViewId {
        &self.view
    }

    pub async fn load_state(&self) -> LoadState {
        self.state.lock().await.load_state
    }

    pub async fn template(&self) -> Option<Arc<str>> {
        self.state.lock().await.template.clone()
    }

    pub async fn assistant(&self) -> Option<Arc<dyn SceneAssistant>> {
        self.state.lock().await.assistant.clone()
    }

    /// Materialize the scene: template, assistant factory, one `setup`
    /// run, then cross-wiring. Resolves once; calling again after `Ready`
    /// is a no-op.
    pub async fn init(self: &Arc<Self>, resources: &SceneResources) -> Result<(), LoadError> {
        {
            let state = self.state.lock().await;
            if state.load_state == LoadState::Ready {
                debug!(scene = %self.scene_name, "scene already materialized");
                return Ok(());
            }
        }

        self.set_load_state(LoadState::LoadingTemplate).await;
        let template = match resources.templates.get(&self.scene_name).await {
            Some(cached) => cached,
            None => {
                let path = resources.naming.template_path(&self.scene_name);
                let body = resources
                    .template_source
                    .fetch(&path)
                    .await
                    .map_err(|source| LoadError::Template {
                        scene: self.scene_name.clone(),
                        source,
                    })?;
                resources.templates.insert(self.scene_name.clone(), body).await
            }
        };
        {
            let mut state = self.state.lock().await;
            state.template = Some(template);
            state.load_state = LoadState::LoadingAssistant;
        }

        let factory = match resources.assistants.get(&self.scene_name).await {
            Some(cached) => cached,
            None => {
                let path = resources.naming.assistant_path(&self.scene_name);
                let factory = resources
                    .assistant_resolver
                    .resolve(&path)
                    .await
                    .map_err(|source| LoadError::Assistant {
                        scene: self.scene_name.clone(),
                        source,
                    })?;
                resources
                    .assistants
                    .insert(self.scene_name.clone(), factory)
                    .await
            }
        };

        let assistant = factory.create();
        assistant
            .setup()
            .await
            .map_err(|source| LoadError::Setup {
                scene: self.scene_name.clone(),
                source,
            })?;
        assistant.attach(Arc::downgrade(self));

        {
            let mut state = self.state.lock().await;
            state.assistant = Some(assistant);
            state.load_state = LoadState::Ready;
        }
        info!(scene = %self.scene_name, view = %self.view, "scene ready");
        Ok(())
    }

    async fn set_load_state(&self, load_state: LoadState) {
        self.state.lock().await.load_state = load_state;
    }
}
