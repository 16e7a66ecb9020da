use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

use shared::{
    domain::{ContainerId, Direction, EffectName, SceneName, ViewId},
    error::StageError,
    protocol::TransitionRequest,
};
use view_core::{TransitionOutcome, ViewEngine, ViewSpec};

use crate::{
    controller::{SceneController, SceneResources},
    error::StageOpError,
};

/// How a stack operation ended. Operations requested while another one
/// is running are dropped, not queued, mirroring the per-view guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    Dropped,
}

struct StageState {
    stack: Vec<Arc<SceneController>>,
    in_progress: bool,
}

/// Stage construction options.
#[derive(Debug, Clone)]
pub struct StageConfig {
    pub container: ContainerId,
    pub effect: EffectName,
    pub preserve_scroll: bool,
}

impl StageConfig {
    pub fn new(container: impl Into<ContainerId>, effect: EffectName) -> Self {
        Self {
            container: container.into(),
            effect,
            preserve_scroll: false,
        }
    }

    pub fn preserve_scroll(mut self) -> Self {
        self.preserve_scroll = true;
        self
    }
}

/// Owns the ordered scene stack of one navigation context.
///
/// Scene views live in the stage's container at z-index depth + 1, so
/// z-order is strictly increasing along the stack. A single `in_progress`
/// flag guards the whole stack: one push/pop at a time, extras dropped.
pub struct StageController {
    engine: Arc<ViewEngine>,
    resources: SceneResources,
    container: ContainerId,
    effect: EffectName,
    preserve_scroll: bool,
    inner: Mutex<StageState>,
}

impl StageController {
    pub async fn new(
        engine: Arc<ViewEngine>,
        resources: SceneResources,
        config: StageConfig,
    ) -> Arc<Self> {
        engine
            .register_container(config.container.clone(), None, None)
            .await;
        Arc::new(Self {
            engine,
            resources,
            container: config.container,
            effect: config.effect,
            preserve_scroll: config.preserve_scroll,
            inner: Mutex::new(StageState {
                stack: Vec::new(),
                in_progress: false,
            }),
        })
    }

    pub async fn depth(&self) -> usize {
        self.inner.lock().await.stack.len()
    }

    pub async fn active_scene(&self) -> Option<Arc<SceneController>> {
        self.inner.lock().await.stack.last().cloned()
    }

    pub async fn scene_at(&self, index: usize) -> Option<Arc<SceneController>> {
        self.inner.lock().await.stack.get(index).cloned()
    }

    pub async fn scene_names(&self) -> Vec<SceneName> {
        self.inner
            .lock()
            .await
            .stack
            .iter()
            .map(|scene| scene.scene_name().clone())
            .collect()
    }

    async fn finish_op(&self) {
        self.inner.lock().await.in_progress = false;
    }

    /// Materialize `scene_name` and bring it to the top of the stack.
    ///
    /// The first scene is shown unanimated; every later push runs a
    /// forward transition from the old top, and the new assistant's
    /// `activate(params)` fires only after that transition's completion
    /// signal.
    pub async fn push_scene(
        &self,
        scene_name: SceneName,
        params: Option<Value>,
    ) -> Result<StageOutcome, StageOpError> {
        let (previous_top, depth) = {
            let mut state = self.inner.lock().await;
            if state.in_progress {
                warn!(scene = %scene_name, "stage operation already in flight; push dropped");
                return Ok(StageOutcome::Dropped);
            }
            state.in_progress = true;
            (state.stack.last().cloned(), state.stack.len())
        };

        let result = self
            .push_scene_guarded(scene_name, params, previous_top, depth)
            .await;
        self.finish_op().await;
        result
    }

    async fn push_scene_guarded(
        &self,
        scene_name: SceneName,
        params: Option<Value>,
        previous_top: Option<Arc<SceneController>>,
        depth: usize,
    ) -> Result<StageOutcome, StageOpError> {
        let view_id = ViewId::minted(scene_name.as_str());
        let mut spec =
            ViewSpec::new(view_id.clone(), self.container.clone()).z_index((depth + 1) as u32);
        if self.preserve_scroll {
            spec = spec.keep_scroll();
        }
        self.engine.define_view(spec).await?;

        let controller = SceneController::new(scene_name.clone(), view_id.clone());

        if let Some(top) = &previous_top {
            if let Some(assistant) = top.assistant().await {
                assistant.deactivate().await;
            }
        }

        if let Err(err) = controller.init(&self.resources).await {
            self.engine.teardown_view(&view_id).await;
            return Err(err.into());
        }
        if let Some(template) = controller.template().await {
            self.engine.set_content(&view_id, template).await;
        }

        match previous_top {
            None => {
                self.engine.start_view(&view_id).await?;
                if let Some(assistant) = controller.assistant().await {
                    assistant.activate(params).await;
                }
            }
            Some(top) => {
                let request = TransitionRequest::to(
                    view_id.clone(),
                    Direction::Forward,
                    self.effect.clone(),
                );
                let outcome = self.engine.perform_transition(top.view(), request).await?;
                if outcome == TransitionOutcome::Dropped {
                    // The old top is wedged in an earlier transition; back
                    // the half-pushed scene out instead of wedging the
                    // stack with it.
                    warn!(scene = %scene_name, "push abandoned, outgoing view is mid-transition");
                    if let Some(assistant) = controller.assistant().await {
                        assistant.destroy().await;
                    }
                    self.engine.teardown_view(&view_id).await;
                    return Ok(StageOutcome::Dropped);
                }
                if let Some(assistant) = controller.assistant().await {
                    assistant.activate(params).await;
                }
            }
        }

        info!(scene = %scene_name, view = %view_id, depth = depth + 1, "scene pushed");
        self.inner.lock().await.stack.push(controller);
        Ok(StageOutcome::Completed)
    }

    /// Animate the top scene away and destroy it. The scene below gets
    /// `activate(data)` before the animation starts so it can prepare;
    /// the popped scene is destroyed strictly after the exit completion
    /// signal.
    pub async fn pop_scene(&self, data: Option<Value>) -> Result<StageOutcome, StageOpError> {
        let (top, below) = {
            let mut state = self.inner.lock().await;
            if state.in_progress {
                warn!("stage operation already in flight; pop dropped");
                return Ok(StageOutcome::Dropped);
            }
            let depth = state.stack.len();
            if depth < 2 {
                return Err(StageError::StackBottom { depth }.into());
            }
            state.in_progress = true;
            (
                state.stack[depth - 1].clone(),
                state.stack[depth - 2].clone(),
            )
        };

        let result = self.pop_scene_guarded(top, below, data).await;
        self.finish_op().await;
        result
    }

    async fn pop_scene_guarded(
        &self,
        top: Arc<SceneController>,
        below: Arc<SceneController>,
        data: Option<Value>,
    ) -> Result<StageOutcome, StageOpError> {
        if let Some(assistant) = below.assistant().await {
            assistant.activate(data).await;
        }

        let request = TransitionRequest::to(
            below.view().clone(),
            Direction::Backward,
            self.effect.clone(),
        );
        let outcome = self.engine.perform_transition(top.view(), request).await?;
        if outcome == TransitionOutcome::Dropped {
            warn!(scene = %top.scene_name(), "pop abandoned, top view is mid-transition");
            return Ok(StageOutcome::Dropped);
        }

        self.destroy_scene(&top).await;
        self.inner.lock().await.stack.pop();
        info!(scene = %top.scene_name(), "scene popped");
        Ok(StageOutcome::Completed)
    }

    /// Pop everything above `scene_name` with a single animated
    /// transition: the scenes between it and the top are destroyed
    /// without animating, then the top pops normally.
    pub async fn pop_scenes_to(
        &self,
        scene_name: &SceneName,
        data: Option<Value>,
    ) -> Result<StageOutcome, StageOpError> {
        {
            let mut state = self.inner.lock().await;
            if state.in_progress {
                warn!(scene = %scene_name, "stage operation already in flight; pop-to dropped");
                return Ok(StageOutcome::Dropped);
            }
            let Some(position) = state
                .stack
                .iter()
                .position(|scene| scene.scene_name() == scene_name)
            else {
                return Err(StageError::UnknownScene(scene_name.to_string()).into());
            };
            if position + 1 == state.stack.len() {
                // Already on top; nothing to pop.
                return Ok(StageOutcome::Completed);
            }
            state.in_progress = true;
        }

        // Silently remove the scenes between the target and the top.
        loop {
            let doomed = {
                let mut state = self.inner.lock().await;
                let len = state.stack.len();
                if state.stack[len - 2].scene_name() == scene_name {
                    None
                } else {
                    Some(state.stack.remove(len - 2))
                }
            };
            match doomed {
                Some(scene) => {
                    info!(scene = %scene.scene_name(), "scene discarded without animation");
                    self.destroy_scene(&scene).await;
                }
                None => break,
            }
        }

        let (top, below) = {
            let state = self.inner.lock().await;
            let depth = state.stack.len();
            (
                state.stack[depth - 1].clone(),
                state.stack[depth - 2].clone(),
            )
        };
        let result = self.pop_scene_guarded(top, below, data).await;
        self.finish_op().await;
        result
    }

    async fn destroy_scene(&self, scene: &Arc<SceneController>) {
        if let Some(assistant) = scene.assistant().await {
            assistant.deactivate().await;
            assistant.destroy().await;
        }
        self.engine.teardown_view(scene.view()).await;
    }
}
